use std::sync::Arc;

use duelroom::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Game types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Element { Fire, Ice, Thunder, Earth }

const ELEMENTS: [Element; 4] = [Element::Fire, Element::Ice, Element::Thunder, Element::Earth];

/// A card with four ranks: top, right, bottom, left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    name: String,
    ranks: [u8; 4],
    element: Option<Element>,
}

#[derive(Debug, Clone, PartialEq)]
struct Placed { card: Card, owner: Role, bonus: i8 }

const TOP: usize = 0;
const RIGHT: usize = 1;
const BOTTOM: usize = 2;
const LEFT: usize = 3;

const BOARD_SIZE: usize = 9;
const HAND_SIZE: usize = 5;

const CATALOG: &[(&str, [u8; 4], Option<Element>)] = &[
    ("Cinder Imp", [3, 5, 2, 1], Some(Element::Fire)),
    ("Ember Fox", [6, 2, 2, 3], Some(Element::Fire)),
    ("Frost Moth", [1, 3, 3, 5], Some(Element::Ice)),
    ("Glacier Ram", [5, 3, 5, 2], Some(Element::Ice)),
    ("Storm Wisp", [2, 1, 6, 4], Some(Element::Thunder)),
    ("Volt Eel", [4, 4, 2, 5], Some(Element::Thunder)),
    ("Mud Golem", [5, 1, 3, 5], Some(Element::Earth)),
    ("Stone Tortoise", [2, 6, 4, 3], Some(Element::Earth)),
    ("Field Mouse", [1, 4, 1, 5], None),
    ("Gray Wolf", [5, 3, 3, 4], None),
    ("Night Owl", [6, 1, 4, 3], None),
    ("Iron Knight", [4, 5, 5, 2], None),
];

// ---------------------------------------------------------------------------
// Game state
// ---------------------------------------------------------------------------

/// One client's copy of the table. Each peer keeps its own and replays
/// the opponent's moves onto it.
#[derive(Debug)]
struct Duel {
    board: Vec<Option<Placed>>,
    elements: Vec<Option<Element>>,
    host_hand: Vec<Card>,
    guest_hand: Vec<Card>,
    turn: Role,
    rounds: usize,
    wants_setup: bool,
}

impl Duel {
    fn new() -> Self {
        Self {
            board: vec![None; BOARD_SIZE],
            elements: vec![None; BOARD_SIZE],
            host_hand: Vec::new(),
            guest_hand: Vec::new(),
            turn: Role::Host,
            rounds: 0,
            wants_setup: false,
        }
    }

    fn load_setup(&mut self, setup: &RoundSetup) -> Result<(), ProtocolError> {
        fn decode<T: serde::de::DeserializeOwned>(v: &serde_json::Value) -> Result<T, ProtocolError> {
            serde_json::from_value(v.clone()).map_err(ProtocolError::Decode)
        }
        self.reset(
            setup.turn,
            decode(&setup.board_elements)?,
            decode(&setup.host_hand)?,
            decode(&setup.guest_hand)?,
        );
        Ok(())
    }

    fn load_room(&mut self, room: &Room) -> Result<(), ProtocolError> {
        self.reset(room.turn, room.board()?, room.hand(Role::Host)?, room.hand(Role::Guest)?);
        Ok(())
    }

    fn reset(&mut self, turn: Role, mut elements: Vec<Option<Element>>, host_hand: Vec<Card>, guest_hand: Vec<Card>) {
        elements.resize(BOARD_SIZE, None);
        self.board = vec![None; BOARD_SIZE];
        self.elements = elements;
        self.host_hand = host_hand;
        self.guest_hand = guest_hand;
        self.turn = turn;
    }

    fn hand(&self, role: Role) -> &[Card] {
        match role {
            Role::Host => &self.host_hand,
            Role::Guest => &self.guest_hand,
        }
    }

    fn hand_mut(&mut self, role: Role) -> &mut Vec<Card> {
        match role {
            Role::Host => &mut self.host_hand,
            Role::Guest => &mut self.guest_hand,
        }
    }

    fn validate(&self, player: Role, card_index: usize, board_index: usize) -> Result<(), String> {
        if self.turn != player {
            return Err("not your turn".into());
        }
        if board_index >= BOARD_SIZE {
            return Err("square must be 0-8".into());
        }
        if self.board[board_index].is_some() {
            return Err("square is occupied".into());
        }
        if card_index >= self.hand(player).len() {
            return Err("no such card in hand".into());
        }
        Ok(())
    }

    /// Plays a card from `player`'s hand and flips every neighbor it beats.
    fn place(&mut self, player: Role, card_index: usize, board_index: usize) -> Result<Card, String> {
        self.validate(player, card_index, board_index)?;

        let card = self.hand_mut(player).remove(card_index);
        let placed = Placed {
            bonus: element_bonus(self.elements[board_index], card.element),
            card: card.clone(),
            owner: player,
        };
        for captured in self.captures(&placed, board_index) {
            if let Some(cell) = self.board[captured].as_mut() {
                cell.owner = player;
            }
        }
        self.board[board_index] = Some(placed);
        self.turn = player.opponent();
        Ok(card)
    }

    fn captures(&self, attacker: &Placed, at: usize) -> Vec<usize> {
        neighbors(at)
            .into_iter()
            .filter(|&(n, mine, theirs)| match &self.board[n] {
                Some(defender) => {
                    defender.owner != attacker.owner && rank(attacker, mine) > rank(defender, theirs)
                }
                None => false,
            })
            .map(|(n, _, _)| n)
            .collect()
    }

    /// Greedy pick: most captures, then best element fit.
    fn best_move(&self, player: Role) -> Option<(usize, usize)> {
        let mut best: Option<((usize, usize), i32)> = None;
        for (card_index, card) in self.hand(player).iter().enumerate() {
            for board_index in (0..BOARD_SIZE).filter(|&i| self.board[i].is_none()) {
                let attacker = Placed {
                    card: card.clone(),
                    owner: player,
                    bonus: element_bonus(self.elements[board_index], card.element),
                };
                let value = self.captures(&attacker, board_index).len() as i32 * 2 + attacker.bonus as i32;
                if best.is_none_or(|(_, v)| value > v) {
                    best = Some(((card_index, board_index), value));
                }
            }
        }
        best.map(|(mv, _)| mv)
    }

    fn is_full(&self) -> bool {
        self.board.iter().all(Option::is_some)
    }

    fn owned_by(&self, role: Role) -> usize {
        self.board.iter().flatten().filter(|p| p.owner == role).count()
    }
}

fn element_bonus(square: Option<Element>, card: Option<Element>) -> i8 {
    match (square, card) {
        (Some(s), Some(c)) if s == c => 1,
        (Some(_), _) => -1,
        (None, _) => 0,
    }
}

fn rank(p: &Placed, side: usize) -> i16 {
    p.card.ranks[side] as i16 + p.bonus as i16
}

/// (neighbor, our side facing it, its side facing us)
fn neighbors(i: usize) -> Vec<(usize, usize, usize)> {
    let mut out = Vec::with_capacity(4);
    if i >= 3 { out.push((i - 3, TOP, BOTTOM)); }
    if i % 3 != 2 { out.push((i + 1, RIGHT, LEFT)); }
    if i < 6 { out.push((i + 3, BOTTOM, TOP)); }
    if i % 3 != 0 { out.push((i - 1, LEFT, RIGHT)); }
    out
}

impl GameEvents for Duel {
    fn remote_place_card(&mut self, mv: &LastMove) {
        if let Ok(card) = mv.card::<Card>() {
            if self.hand(mv.player).get(mv.card_index) != Some(&card) {
                tracing::warn!(card = %card.name, "remote card doesn't match our copy of their hand");
            }
        }
        if let Err(e) = self.place(mv.player, mv.card_index, mv.board_index) {
            tracing::warn!(error = %e, player = %mv.player, "rejected remote move");
        }
    }

    fn on_rematch_start(&mut self, room: &Room) {
        self.rounds += 1;
        if let Err(e) = self.load_room(room) {
            tracing::warn!(error = %e, "could not load new round");
        }
    }

    fn trigger_rematch_setup(&mut self) {
        self.wants_setup = true;
    }

    fn on_opponent_connected(&mut self, _room: &Room) {
        tracing::info!("challenger arrived");
    }
}

/// Deals a fresh round: random elemental squares and two random hands.
fn deal(turn: Role) -> Result<RoundSetup, ProtocolError> {
    let mut rng = rand::rng();
    let elements: Vec<Option<Element>> = (0..BOARD_SIZE)
        .map(|_| {
            if rng.random_bool(0.3) {
                Some(ELEMENTS[rng.random_range(0..ELEMENTS.len())])
            } else {
                None
            }
        })
        .collect();
    let mut hand = || -> Vec<Card> {
        (0..HAND_SIZE)
            .map(|_| {
                let (name, ranks, element) = CATALOG[rng.random_range(0..CATALOG.len())];
                Card { name: name.into(), ranks, element }
            })
            .collect()
    };
    let host_hand = hand();
    let guest_hand = hand();
    RoundSetup::new(turn, &elements, &host_hand, &guest_hand)
}

// ---------------------------------------------------------------------------
// Match driver
// ---------------------------------------------------------------------------

type Client = Matchmaker<MemoryStore, Duel>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Score { host: usize, guest: usize, in_sync: bool }

/// Hosts a room, joins it from a second client and plays `rounds` rounds,
/// with a rematch between each.
async fn run_duel(store: Arc<MemoryStore>, collection: &str, rounds: usize) -> Result<Vec<Score>, DuelroomError> {
    let mut host = Duelroom::builder().collection(collection).build(Arc::clone(&store), Duel::new());
    let mut guest = Duelroom::builder().collection(collection).build(store, Duel::new());

    let setup = deal(Role::Host)?;
    host.game_mut().load_setup(&setup)?;
    let code = host.create_room(setup).await?;
    tracing::info!(room_code = %code, "waiting for a challenger");

    let room = guest.join_room(&code).await?;
    guest.game_mut().load_room(&room)?;
    host.process_pending();
    guest.process_pending();

    let mut scores = Vec::with_capacity(rounds);
    for round in 0..rounds {
        if round > 0 {
            let starter = if round % 2 == 0 { Role::Host } else { Role::Guest };
            start_rematch(&mut host, &mut guest, starter).await?;
        }
        let score = play_round(&mut host, &mut guest).await?;
        tracing::info!(round = round + 1, host = score.host, guest = score.guest, in_sync = score.in_sync, "round over");
        scores.push(score);
    }

    host.end_match().await;
    guest.process_pending();
    Ok(scores)
}

async fn play_round(host: &mut Client, guest: &mut Client) -> Result<Score, DuelroomError> {
    while !host.game().is_full() {
        let turn = host.game().turn;
        let (mover, watcher) = match turn {
            Role::Host => (&mut *host, &mut *guest),
            Role::Guest => (&mut *guest, &mut *host),
        };
        let Some((card_index, board_index)) = mover.game().best_move(turn) else {
            tracing::warn!(%turn, "no legal move left");
            break;
        };
        let card = match mover.game_mut().place(turn, card_index, board_index) {
            Ok(card) => card,
            Err(e) => {
                tracing::warn!(error = %e, %turn, "local move rejected");
                break;
            }
        };
        tracing::debug!(%turn, card = %card.name, board_index, "card played");
        mover.send_move(card_index, board_index, &card).await?;
        mover.process_pending();
        watcher.process_pending();
    }

    Ok(Score {
        host: host.game().owned_by(Role::Host),
        guest: host.game().owned_by(Role::Guest),
        in_sync: host.game().board == guest.game().board,
    })
}

async fn start_rematch(host: &mut Client, guest: &mut Client, starter: Role) -> Result<(), DuelroomError> {
    host.request_rematch().await?;
    guest.request_rematch().await?;
    host.process_pending();

    if !std::mem::take(&mut host.game_mut().wants_setup) {
        tracing::warn!("rematch not agreed, replaying current board");
        return Ok(());
    }

    let setup = deal(starter)?;
    host.game_mut().load_setup(&setup)?;
    host.reset_match(setup).await?;
    host.process_pending();
    guest.process_pending();
    tracing::info!(rematches = guest.game().rounds, %starter, "new round dealt");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), DuelroomError> {
    duelroom::init_tracing();

    let collection = std::env::var("DUELROOM_COLLECTION")
        .unwrap_or_else(|_| SessionConfig::default().collection);
    let store = Arc::new(MemoryStore::new());

    let scores = run_duel(store, &collection, 2).await?;
    let (host, guest) = scores.iter().fold((0, 0), |(h, g), s| (h + s.host, g + s.guest));
    tracing::info!(host, guest, "match finished");
    Ok(())
}
