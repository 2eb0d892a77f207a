//! Callback surface implemented by game logic.
//!
//! Duelroom doesn't know the rules of the card game. It only knows when
//! something happened in the shared room that the game has to react to:
//! the opponent moved, a new round began, both players want a rematch.
//! The [`GameEvents`] trait is how it tells the game.

use duelroom_protocol::{LastMove, Room};

/// Receives notifications derived from the shared room document.
///
/// All methods are called from inside
/// [`Matchmaker::handle_update`](crate::Matchmaker::handle_update), one
/// notification at a time, never concurrently. They must not block.
///
/// # Example
///
/// ```rust
/// use duelroom_protocol::{LastMove, Room};
/// use duelroom_session::GameEvents;
///
/// /// Counts what happened instead of rendering it.
/// #[derive(Default)]
/// struct Tally {
///     moves: usize,
///     rounds: usize,
///     wants_setup: bool,
/// }
///
/// impl GameEvents for Tally {
///     fn remote_place_card(&mut self, _mv: &LastMove) {
///         self.moves += 1;
///     }
///
///     fn on_rematch_start(&mut self, _room: &Room) {
///         self.rounds += 1;
///     }
///
///     fn trigger_rematch_setup(&mut self) {
///         self.wants_setup = true;
///     }
/// }
/// ```
pub trait GameEvents: Send + 'static {
    /// The opponent placed a card. Apply it to the local board.
    fn remote_place_card(&mut self, mv: &LastMove);

    /// A new round started. `room` carries the authoritative board, hands
    /// and turn for it; discard any local state from the previous round.
    fn on_rematch_start(&mut self, room: &Room);

    /// Host only: both players asked for a rematch. The game should deal
    /// a fresh round and pass it to
    /// [`Matchmaker::reset_match`](crate::Matchmaker::reset_match).
    fn trigger_rematch_setup(&mut self);

    /// Host only: a guest is in the room and play has started.
    /// Reported once per session. Default: no-op.
    fn on_opponent_connected(&mut self, _room: &Room) {}
}
