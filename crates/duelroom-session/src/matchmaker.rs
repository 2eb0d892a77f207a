//! The matchmaker: one client's controller for one shared room.
//!
//! There is no server deciding anything. Host and guest each run a
//! `Matchmaker` against the same room document and coordinate purely by
//! writing to it and reacting to the snapshots it pushes back:
//!
//! - Local actions (create, join, move, rematch, reset, end) become
//!   writes to the document.
//! - Every write, including our own, comes back as a full snapshot that
//!   [`Matchmaker::handle_update`] turns into game callbacks.
//!
//! # Concurrency note
//!
//! `Matchmaker` is driven by a single task. Snapshots are handled one at
//! a time through `&mut self`, so the handler never races itself. It does
//! NOT protect against both peers writing turn-gated fields at once;
//! clients are expected to write only when `turn` names them.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use duelroom_protocol::{
    LastMove, ProtocolError, Role, Room, RoomCode, RoomPatch, RoomStatus,
    RoundId, RoundSetup,
};
use duelroom_store::{Document, DocumentStore, StoreError};
use serde::Serialize;

use crate::{
    GameEvents, MatchError, Session, SessionConfig, SessionPhase, UpdateOutcome,
};

/// Owns one room's lifecycle from a single client's perspective.
///
/// ## Lifecycle
///
/// ```text
/// create_room() ──→ [Hosting] ──(guest joins)──→ [Playing]
/// join_room()   ──→ [Guesting] ──(snapshot)───→ [Playing]
///
/// [Playing] ──request_rematch()──→ [AwaitingRematch] ──(new round)──→ [Playing]
/// [Playing] ──end_match()──→ [Finished]
/// any       ──leave()──→ [Idle]
/// ```
pub struct Matchmaker<S: DocumentStore, G: GameEvents> {
    store: Arc<S>,
    game: G,
    config: SessionConfig,
    phase: SessionPhase,
    session: Option<Session>,
}

impl<S: DocumentStore, G: GameEvents> Matchmaker<S, G> {
    /// Creates an idle matchmaker.
    pub fn new(store: Arc<S>, game: G, config: SessionConfig) -> Self {
        Self {
            store,
            game,
            config,
            phase: SessionPhase::Idle,
            session: None,
        }
    }

    // =====================================================================
    // Room lifecycle
    // =====================================================================

    /// Creates a room as host and starts listening to it.
    ///
    /// The document is written unconditionally: a code collision silently
    /// replaces the other room. Any room this client was in is left first.
    ///
    /// # Errors
    /// - [`MatchError::StoreWrite`] if the store rejects the write
    /// - [`MatchError::StoreRead`] if subscribing fails
    pub async fn create_room(
        &mut self,
        setup: RoundSetup,
    ) -> Result<RoomCode, MatchError> {
        let code = RoomCode::generate(self.config.room_code_len);
        let round_id = RoundId::generate();
        let document = Room::new(round_id.clone(), setup, now_millis()).to_document()?;

        self.leave();

        self.store
            .create(&self.config.collection, code.as_str(), document)
            .await
            .map_err(MatchError::StoreWrite)?;

        self.session = Some(Session::new(code.clone(), Role::Host, Some(round_id)));
        self.phase = SessionPhase::Hosting;
        tracing::info!(room_code = %code, "room created");

        self.listen_to_room().await?;
        Ok(code)
    }

    /// Joins an existing room as guest and starts listening to it.
    ///
    /// Returns the room as it stands after the join, so the caller can
    /// render the board and hands the host dealt.
    ///
    /// # Errors
    /// - [`MatchError::RoomNotFound`] if there is no such room
    /// - [`MatchError::RoomClosed`] if its status is `finished`
    /// - [`MatchError::StoreRead`] / [`MatchError::StoreWrite`] on store
    ///   failures
    ///
    /// Nothing is written unless every check passed.
    pub async fn join_room(&mut self, code: &RoomCode) -> Result<Room, MatchError> {
        let document = self
            .store
            .get(&self.config.collection, code.as_str())
            .await
            .map_err(MatchError::StoreRead)?
            .ok_or_else(|| MatchError::RoomNotFound(code.clone()))?;
        let mut room = Room::from_document(document)?;

        if !room.status.is_joinable() {
            tracing::info!(room_code = %code, status = %room.status, "join refused");
            return Err(MatchError::RoomClosed {
                code: code.clone(),
                status: room.status,
            });
        }

        self.leave();

        self.store
            .update(&self.config.collection, code.as_str(), RoomPatch::join().to_document()?)
            .await
            .map_err(|e| match e {
                // Deleted between our read and our write.
                StoreError::NotFound(_) => MatchError::RoomNotFound(code.clone()),
                other => MatchError::StoreWrite(other),
            })?;

        room.guest_connected = true;
        room.status = RoomStatus::Playing;

        self.session = Some(Session::new(code.clone(), Role::Guest, room.round_id.clone()));
        self.phase = SessionPhase::Guesting;
        tracing::info!(room_code = %code, "joined room");

        self.listen_to_room().await?;
        Ok(room)
    }

    /// (Re)subscribes to the current room.
    ///
    /// Any previous subscription is released first, so a session never
    /// holds more than one. No-op without a room.
    ///
    /// # Errors
    /// [`MatchError::StoreRead`] if the store refuses the subscription.
    pub async fn listen_to_room(&mut self) -> Result<(), MatchError> {
        let Some(session) = self.session.as_mut() else {
            tracing::debug!("listen_to_room without a room, ignoring");
            return Ok(());
        };

        if session.is_listening() {
            tracing::debug!(room_code = %session.code, "replacing room subscription");
        }
        if let Some(previous) = session.subscription.take() {
            previous.unsubscribe();
        }

        let subscription = self
            .store
            .subscribe(&self.config.collection, session.code.as_str())
            .await
            .map_err(MatchError::StoreRead)?;
        session.subscription = Some(subscription);

        tracing::debug!(room_code = %session.code, role = %session.role, "listening to room");
        Ok(())
    }

    /// Drops the subscription and forgets the room.
    ///
    /// Writes already in flight still land in the store; their snapshots
    /// are simply never delivered here.
    pub fn leave(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Some(subscription) = session.subscription.take() {
                subscription.unsubscribe();
            }
            tracing::info!(room_code = %session.code, role = %session.role, "left room");
        }
        self.phase = SessionPhase::Idle;
    }

    // =====================================================================
    // Local actions
    // =====================================================================

    /// Publishes a move and hands the turn to the opponent.
    ///
    /// Only `turn` and `lastMove` are written. The opponent applies the
    /// move to its own board. No-op without a room.
    ///
    /// # Errors
    /// - [`MatchError::Protocol`] if `card` can't be serialized
    /// - [`MatchError::StoreWrite`] if the store rejects the write
    pub async fn send_move<C: Serialize>(
        &mut self,
        card_index: usize,
        board_index: usize,
        card: &C,
    ) -> Result<(), MatchError> {
        let Some(session) = self.session.as_ref() else {
            tracing::debug!("send_move without a room, ignoring");
            return Ok(());
        };

        let mv = LastMove {
            player: session.role,
            card_index,
            board_index,
            card: serde_json::to_value(card).map_err(ProtocolError::Encode)?,
        };
        let patch = RoomPatch::advance(mv).to_document()?;

        tracing::debug!(
            room_code = %session.code,
            role = %session.role,
            phase = %self.phase,
            active = self.phase.is_active(),
            card_index,
            board_index,
            "sending move"
        );
        write(&*self.store, &self.config.collection, &session.code, patch).await
    }

    /// Sets this client's rematch flag. No-op without a room.
    ///
    /// # Errors
    /// [`MatchError::StoreWrite`] if the store rejects the write.
    pub async fn request_rematch(&mut self) -> Result<(), MatchError> {
        let Some(session) = self.session.as_ref() else {
            tracing::debug!("request_rematch without a room, ignoring");
            return Ok(());
        };

        let patch = RoomPatch::rematch_request(session.role).to_document()?;
        write(&*self.store, &self.config.collection, &session.code, patch).await?;

        self.phase = SessionPhase::AwaitingRematch;
        tracing::info!(room_code = %session.code, role = %session.role, "rematch requested");
        Ok(())
    }

    /// Marks the room finished. Best effort: failures are logged and
    /// swallowed, since the peer may well have closed it already.
    pub async fn end_match(&mut self) {
        let Some(session) = self.session.as_ref() else {
            tracing::debug!("end_match without a room, ignoring");
            return;
        };

        let result = match RoomPatch::finish().to_document() {
            Ok(patch) => write(&*self.store, &self.config.collection, &session.code, patch).await,
            Err(e) => Err(e.into()),
        };
        match result {
            Ok(()) => tracing::info!(room_code = %session.code, "match ended"),
            Err(e) => tracing::warn!(
                room_code = %session.code,
                error = %e,
                "failed to mark room finished, ignoring"
            ),
        }
        self.phase = SessionPhase::Finished;
    }

    /// Starts a fresh round in place (host by convention; not enforced).
    ///
    /// The new round id is recorded locally BEFORE the write goes out, so
    /// the snapshot our own write produces is not mistaken for a round
    /// change made by the peer. If the write fails the previous round and
    /// its bookkeeping are restored. No-op without a room.
    ///
    /// # Errors
    /// [`MatchError::StoreWrite`] if the store rejects the write.
    pub async fn reset_match(&mut self, setup: RoundSetup) -> Result<(), MatchError> {
        let Some(session) = self.session.as_mut() else {
            tracing::debug!("reset_match without a room, ignoring");
            return Ok(());
        };

        let round_id = RoundId::generate();
        let patch = RoomPatch::new_round(round_id.clone(), setup).to_document()?;

        let previous_round = session.round_id.clone();
        let previous_signalled = session.rematch_signalled;
        let previous_moves = std::mem::take(&mut session.applied_moves);
        session.enter_round(Some(round_id.clone()));

        if let Err(e) = write(&*self.store, &self.config.collection, &session.code, patch).await {
            session.seen_rounds.remove(&round_id);
            session.round_id = previous_round;
            session.rematch_signalled = previous_signalled;
            session.applied_moves = previous_moves;
            return Err(e);
        }

        self.phase = SessionPhase::Playing;
        tracing::info!(room_code = %session.code, %round_id, "new round written");
        Ok(())
    }

    // =====================================================================
    // Notifications
    // =====================================================================

    /// Interprets one room snapshot and fires the matching game callbacks.
    ///
    /// Snapshots from a round this session already left are dropped
    /// first. The rest run through a fixed order of checks:
    ///
    /// 1. **Opponent connected** (host): guest present and playing.
    /// 2. **Round change**: status is playing and `roundId` differs from
    ///    ours. Adopts the new round, fires `on_rematch_start` and stops;
    ///    the snapshot's `lastMove` belongs to the new round's reset and
    ///    must not be replayed.
    /// 3. **Rematch ready** (host): both rematch flags set.
    /// 4. **Remote move**: it is our turn and `lastMove` is an opponent
    ///    move not yet applied this round.
    ///
    /// Redelivering a snapshot, in or out of order, fires nothing new.
    pub fn handle_update(&mut self, room: &Room) -> UpdateOutcome {
        let mut outcome = UpdateOutcome::default();
        let Some(session) = self.session.as_mut() else {
            return outcome;
        };

        if let Some(remote) = &room.round_id {
            if session.is_stale_round(remote) {
                tracing::debug!(
                    room_code = %session.code,
                    round_id = %remote,
                    "ignoring snapshot from an earlier round"
                );
                return outcome;
            }
        }

        match room.status {
            RoomStatus::Finished if self.phase != SessionPhase::Finished => {
                tracing::info!(room_code = %session.code, "room finished");
                self.phase = SessionPhase::Finished;
            }
            RoomStatus::Playing
                if matches!(self.phase, SessionPhase::Hosting | SessionPhase::Guesting) =>
            {
                self.phase = SessionPhase::Playing;
            }
            _ => {}
        }

        if session.role == Role::Host
            && room.guest_connected
            && room.status == RoomStatus::Playing
            && !session.opponent_announced
        {
            session.opponent_announced = true;
            tracing::info!(room_code = %session.code, "opponent connected");
            self.game.on_opponent_connected(room);
            outcome.opponent_connected = true;
        }

        if room.status == RoomStatus::Playing {
            if let Some(remote) = &room.round_id {
                if session.round_id.as_ref() != Some(remote) {
                    session.enter_round(Some(remote.clone()));
                    self.phase = SessionPhase::Playing;
                    tracing::info!(room_code = %session.code, round_id = %remote, "round started");
                    self.game.on_rematch_start(room);
                    outcome.round_started = true;
                    return outcome;
                }
            }
        }

        if session.role == Role::Host && room.rematch_agreed() && !session.rematch_signalled {
            session.rematch_signalled = true;
            tracing::info!(room_code = %session.code, "both players want a rematch");
            self.game.trigger_rematch_setup();
            outcome.rematch_ready = true;
        }

        if let Some(mv) = &room.last_move {
            if mv.player != session.role
                && room.turn == session.role
                && !session.applied_moves.contains(mv)
            {
                session.applied_moves.push(mv.clone());
                tracing::debug!(
                    room_code = %session.code,
                    card_index = mv.card_index,
                    board_index = mv.board_index,
                    "applying opponent move"
                );
                self.game.remote_place_card(mv);
                outcome.move_applied = true;
            }
        }

        outcome
    }

    /// Waits for the next snapshot and handles it.
    ///
    /// Returns `None` when there is no subscription or it has closed.
    pub async fn next_update(&mut self) -> Option<Result<UpdateOutcome, MatchError>> {
        let subscription = self.session.as_mut()?.subscription.as_mut()?;
        let document = subscription.next().await?;
        Some(self.apply_document(document))
    }

    /// Handles every snapshot that has already arrived, without waiting.
    ///
    /// Malformed snapshots are logged and skipped.
    pub fn process_pending(&mut self) -> Vec<UpdateOutcome> {
        let mut outcomes = Vec::new();
        loop {
            let next = self
                .session
                .as_mut()
                .and_then(|s| s.subscription.as_mut())
                .and_then(|sub| sub.try_next());
            let Some(document) = next else {
                break;
            };
            match self.apply_document(document) {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => tracing::warn!(error = %e, "skipping malformed room snapshot"),
            }
        }
        outcomes
    }

    fn apply_document(&mut self, document: Document) -> Result<UpdateOutcome, MatchError> {
        let room = Room::from_document(document)?;
        Ok(self.handle_update(&room))
    }

    // =====================================================================
    // Accessors
    // =====================================================================

    /// Current lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// The active session, if any.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn room_code(&self) -> Option<&RoomCode> {
        self.session.as_ref().map(Session::code)
    }

    pub fn role(&self) -> Option<Role> {
        self.session.as_ref().map(Session::role)
    }

    pub fn round_id(&self) -> Option<&RoundId> {
        self.session.as_ref().and_then(Session::round_id)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut G {
        &mut self.game
    }
}

/// Issues a partial update against the room, classifying failures as
/// write errors.
async fn write<S: DocumentStore>(
    store: &S,
    collection: &str,
    code: &RoomCode,
    patch: Document,
) -> Result<(), MatchError> {
    store
        .update(collection, code.as_str(), patch)
        .await
        .map_err(MatchError::StoreWrite)
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for the update handler.
    //!
    //! These feed hand-built snapshots straight into `handle_update`, so
    //! redelivery and reordering can be tested without a store. The
    //! end-to-end flows live in `tests/matchmaking.rs`.

    use super::*;
    use duelroom_store::MemoryStore;
    use serde_json::json;

    #[derive(Default)]
    struct Recorder {
        moves: Vec<LastMove>,
        rounds: Vec<Option<RoundId>>,
        setups: usize,
        arrivals: usize,
    }

    impl GameEvents for Recorder {
        fn remote_place_card(&mut self, mv: &LastMove) {
            self.moves.push(mv.clone());
        }
        fn on_rematch_start(&mut self, room: &Room) {
            self.rounds.push(room.round_id.clone());
        }
        fn trigger_rematch_setup(&mut self) {
            self.setups += 1;
        }
        fn on_opponent_connected(&mut self, _room: &Room) {
            self.arrivals += 1;
        }
    }

    fn matchmaker(role: Role, round: &str) -> Matchmaker<MemoryStore, Recorder> {
        let mut mm = Matchmaker::new(
            Arc::new(MemoryStore::new()),
            Recorder::default(),
            SessionConfig::default(),
        );
        mm.session = Some(Session::new(
            RoomCode::parse("TEST01").unwrap(),
            role,
            Some(RoundId::new(round)),
        ));
        mm.phase = match role {
            Role::Host => SessionPhase::Hosting,
            Role::Guest => SessionPhase::Guesting,
        };
        mm
    }

    fn room(round: &str) -> Room {
        let mut room = Room::new(
            RoundId::new(round),
            RoundSetup {
                turn: Role::Host,
                board_elements: json!([]),
                host_hand: json!([]),
                guest_hand: json!([]),
            },
            0,
        );
        room.status = RoomStatus::Playing;
        room.guest_connected = true;
        room
    }

    fn mv(player: Role, card_index: usize, board_index: usize) -> LastMove {
        LastMove {
            player,
            card_index,
            board_index,
            card: json!({ "id": card_index }),
        }
    }

    #[test]
    fn test_handle_update_without_session_is_quiet() {
        let mut mm = Matchmaker::new(
            Arc::new(MemoryStore::new()),
            Recorder::default(),
            SessionConfig::default(),
        );
        assert!(mm.handle_update(&room("r1")).is_quiet());
    }

    #[test]
    fn test_handle_update_opponent_connected_reported_once() {
        let mut mm = matchmaker(Role::Host, "r1");
        let snapshot = room("r1");

        assert!(mm.handle_update(&snapshot).opponent_connected);
        assert!(!mm.handle_update(&snapshot).opponent_connected);
        assert_eq!(mm.game().arrivals, 1);
        assert_eq!(mm.phase(), SessionPhase::Playing);
    }

    #[test]
    fn test_handle_update_waiting_room_does_not_report_opponent() {
        let mut mm = matchmaker(Role::Host, "r1");
        let mut snapshot = room("r1");
        snapshot.status = RoomStatus::Waiting;
        snapshot.guest_connected = false;

        assert!(mm.handle_update(&snapshot).is_quiet());
        assert_eq!(mm.phase(), SessionPhase::Hosting);
    }

    #[test]
    fn test_handle_update_guest_never_reports_opponent() {
        let mut mm = matchmaker(Role::Guest, "r1");
        mm.handle_update(&room("r1"));
        assert_eq!(mm.game().arrivals, 0);
    }

    #[test]
    fn test_handle_update_applies_opponent_move_once() {
        let mut mm = matchmaker(Role::Guest, "r1");
        let mut snapshot = room("r1");
        snapshot.turn = Role::Guest;
        snapshot.last_move = Some(mv(Role::Host, 2, 4));

        assert!(mm.handle_update(&snapshot).move_applied);
        assert!(!mm.handle_update(&snapshot).move_applied);
        assert_eq!(mm.game().moves.len(), 1);
        assert_eq!(mm.game().moves[0].board_index, 4);
    }

    #[test]
    fn test_handle_update_ignores_own_move() {
        let mut mm = matchmaker(Role::Host, "r1");
        let mut snapshot = room("r1");
        snapshot.turn = Role::Guest;
        snapshot.last_move = Some(mv(Role::Host, 0, 0));

        assert!(!mm.handle_update(&snapshot).move_applied);
    }

    #[test]
    fn test_handle_update_ignores_move_when_not_our_turn() {
        // A stale snapshot: the opponent's move is recorded but the turn
        // still names them. Nothing to apply.
        let mut mm = matchmaker(Role::Guest, "r1");
        let mut snapshot = room("r1");
        snapshot.turn = Role::Host;
        snapshot.last_move = Some(mv(Role::Host, 1, 1));

        assert!(!mm.handle_update(&snapshot).move_applied);
    }

    #[test]
    fn test_handle_update_redelivered_move_after_own_echo_is_ignored() {
        let mut mm = matchmaker(Role::Guest, "r1");

        let mut opponent = room("r1");
        opponent.turn = Role::Guest;
        opponent.last_move = Some(mv(Role::Host, 2, 4));
        assert!(mm.handle_update(&opponent).move_applied);

        // Our reply comes back...
        let mut echo = room("r1");
        echo.turn = Role::Host;
        echo.last_move = Some(mv(Role::Guest, 1, 5));
        assert!(mm.handle_update(&echo).is_quiet());

        // ...then the opponent's snapshot is delivered again.
        assert!(!mm.handle_update(&opponent).move_applied);
        assert_eq!(mm.game().moves.len(), 1);
    }

    #[test]
    fn test_handle_update_older_opponent_move_redelivered_is_ignored() {
        let mut mm = matchmaker(Role::Guest, "r1");

        let mut first = room("r1");
        first.turn = Role::Guest;
        first.last_move = Some(mv(Role::Host, 0, 0));
        let mut second = first.clone();
        second.last_move = Some(mv(Role::Host, 0, 8));

        mm.handle_update(&first);
        mm.handle_update(&second);
        assert!(!mm.handle_update(&first).move_applied);
        assert_eq!(mm.game().moves.len(), 2);
    }

    #[test]
    fn test_handle_update_round_change_supersedes_move() {
        let mut mm = matchmaker(Role::Guest, "r1");
        let mut snapshot = room("r2");
        snapshot.turn = Role::Guest;
        snapshot.last_move = Some(mv(Role::Host, 0, 0));

        let outcome = mm.handle_update(&snapshot);

        assert!(outcome.round_started);
        assert!(!outcome.move_applied);
        assert!(mm.game().moves.is_empty());
        assert_eq!(mm.round_id(), Some(&RoundId::new("r2")));
        assert_eq!(mm.game().rounds, vec![Some(RoundId::new("r2"))]);
    }

    #[test]
    fn test_handle_update_round_change_fires_once() {
        let mut mm = matchmaker(Role::Guest, "r1");
        let snapshot = room("r2");

        assert!(mm.handle_update(&snapshot).round_started);
        assert!(!mm.handle_update(&snapshot).round_started);
        assert_eq!(mm.game().rounds.len(), 1);
    }

    #[test]
    fn test_handle_update_old_round_after_new_round_is_ignored() {
        let mut mm = matchmaker(Role::Guest, "r1");

        assert!(mm.handle_update(&room("r2")).round_started);
        assert!(mm.handle_update(&room("r1")).is_quiet());
        assert!(!mm.handle_update(&room("r2")).round_started);

        assert_eq!(mm.round_id(), Some(&RoundId::new("r2")));
        assert_eq!(mm.game().rounds, vec![Some(RoundId::new("r2"))]);
    }

    #[test]
    fn test_handle_update_old_round_move_is_not_replayed() {
        let mut mm = matchmaker(Role::Guest, "r1");
        mm.handle_update(&room("r2"));

        let mut stale = room("r1");
        stale.turn = Role::Guest;
        stale.last_move = Some(mv(Role::Host, 3, 3));
        stale.host_rematch = true;
        stale.guest_rematch = true;

        assert!(mm.handle_update(&stale).is_quiet());
        assert!(mm.game().moves.is_empty());
    }

    #[test]
    fn test_handle_update_round_change_ignored_unless_playing() {
        let mut mm = matchmaker(Role::Guest, "r1");
        let mut snapshot = room("r2");
        snapshot.status = RoomStatus::Finished;

        assert!(!mm.handle_update(&snapshot).round_started);
        assert_eq!(mm.round_id(), Some(&RoundId::new("r1")));
        assert_eq!(mm.phase(), SessionPhase::Finished);
    }

    #[test]
    fn test_handle_update_missing_round_id_is_not_a_round_change() {
        let mut mm = matchmaker(Role::Guest, "r1");
        let mut snapshot = room("r1");
        snapshot.round_id = None;

        assert!(!mm.handle_update(&snapshot).round_started);
    }

    #[test]
    fn test_handle_update_rematch_ready_host_only_once_per_round() {
        let mut host = matchmaker(Role::Host, "r1");
        let mut guest = matchmaker(Role::Guest, "r1");
        let mut snapshot = room("r1");
        snapshot.host_rematch = true;
        snapshot.guest_rematch = true;

        assert!(host.handle_update(&snapshot).rematch_ready);
        assert!(!host.handle_update(&snapshot).rematch_ready);
        assert!(!guest.handle_update(&snapshot).rematch_ready);
        assert_eq!(host.game().setups, 1);
        assert_eq!(guest.game().setups, 0);
    }

    #[test]
    fn test_handle_update_single_rematch_flag_is_not_ready() {
        let mut host = matchmaker(Role::Host, "r1");
        let mut snapshot = room("r1");
        snapshot.guest_rematch = true;

        assert!(!host.handle_update(&snapshot).rematch_ready);
    }

    #[test]
    fn test_handle_update_rematch_ready_rearms_after_new_round() {
        let mut host = matchmaker(Role::Host, "r1");
        let mut agreed = room("r1");
        agreed.host_rematch = true;
        agreed.guest_rematch = true;
        host.handle_update(&agreed);

        // A round the host didn't start locally (e.g. another device).
        host.handle_update(&room("r2"));

        let mut again = room("r2");
        again.host_rematch = true;
        again.guest_rematch = true;
        assert!(host.handle_update(&again).rematch_ready);
        assert_eq!(host.game().setups, 2);
    }

    #[test]
    fn test_handle_update_finished_sets_phase() {
        let mut mm = matchmaker(Role::Host, "r1");
        let mut snapshot = room("r1");
        snapshot.status = RoomStatus::Finished;

        mm.handle_update(&snapshot);

        assert_eq!(mm.phase(), SessionPhase::Finished);
    }
}
