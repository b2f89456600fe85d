//! The room aggregate and its players.
//!
//! A [`Room`] is the single shared record of one game. Every client reads
//! it, and every mutation rewrites it as a whole through the store's
//! conditional update, so the invariants below always hold for the record
//! as a unit:
//!
//! - `called_numbers` only grows;
//! - `ended` and `winner` are set together, and only the winner is flagged;
//! - the number of players never exceeds `max_players`;
//! - once `started`, nobody else joins.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{Board, Letter, PlayerId, ProtocolError, RoomId, MAX_LETTERS, NUMBER_POOL};

/// Smallest room a host may create.
pub const MIN_ROOM_PLAYERS: usize = 2;

/// Largest room a host may create.
pub const MAX_ROOM_PLAYERS: usize = 6;

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// One participant in a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// 0-based join index. Turn order is seat order.
    pub seat: usize,
    pub board: Board,
    /// Letters earned so far, always a prefix of B, I, N, G, O.
    #[serde(default)]
    pub achievements: Vec<Letter>,
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub is_winner: bool,
}

impl Player {
    /// A fresh, not-yet-ready player. The seat is assigned by
    /// [`Room::add_player`].
    pub fn new(id: PlayerId, name: impl Into<String>, board: Board) -> Self {
        Self {
            id,
            name: name.into(),
            seat: 0,
            board,
            achievements: Vec::new(),
            ready: false,
            is_winner: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// The authoritative state of one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    pub host_id: PlayerId,
    pub max_players: usize,
    /// Players in join order. Stored as an id-keyed object.
    #[serde(default, with = "players_by_id")]
    players: Vec<Player>,
    pub current_turn: PlayerId,
    #[serde(default)]
    pub started: bool,
    #[serde(default)]
    pub ended: bool,
    #[serde(default)]
    pub winner: Option<PlayerId>,
    #[serde(default)]
    pub called_numbers: Vec<u8>,
    /// Milliseconds since the Unix epoch.
    pub created_at: u64,
}

impl Room {
    /// Creates a room with `host` as its only player. The host takes the
    /// first turn.
    pub fn new(id: RoomId, mut host: Player, max_players: usize, created_at: u64) -> Self {
        host.seat = 0;
        Self {
            id,
            host_id: host.id.clone(),
            max_players,
            current_turn: host.id.clone(),
            players: vec![host],
            started: false,
            ended: false,
            winner: None,
            called_numbers: Vec::new(),
            created_at,
        }
    }

    /// Players in join order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }

    pub fn player_mut(&mut self, id: &PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| &p.id == id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players
    }

    pub fn is_host(&self, id: &PlayerId) -> bool {
        &self.host_id == id
    }

    /// Returns `true` if every player has flagged ready.
    pub fn all_ready(&self) -> bool {
        self.players.iter().all(|p| p.ready)
    }

    /// Appends `player` in the next seat.
    ///
    /// Capacity and start-state checks are the caller's job; this only
    /// keeps seats dense and in join order.
    pub fn add_player(&mut self, mut player: Player) {
        player.seat = self.players.len();
        self.players.push(player);
    }

    /// Player ids in turn order.
    pub fn turn_order(&self) -> impl Iterator<Item = &PlayerId> {
        self.players.iter().map(|p| &p.id)
    }

    /// The player seated after `id`, wrapping to the first seat.
    pub fn next_turn_after(&self, id: &PlayerId) -> Option<PlayerId> {
        let index = self.players.iter().position(|p| &p.id == id)?;
        let next = (index + 1) % self.players.len();
        Some(self.players[next].id.clone())
    }

    /// Numbers on `id`'s card that have been called, in call order.
    ///
    /// This is the player's marked set; it is derived from the room-wide
    /// call list and never stored on its own.
    pub fn marked(&self, id: &PlayerId) -> Vec<u8> {
        let Some(player) = self.player(id) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        self.called_numbers
            .iter()
            .copied()
            .filter(|n| player.board.contains(*n) && seen.insert(*n))
            .collect()
    }

    /// Final standings: the winner first, then by letters held, most
    /// first. Ties keep join order.
    pub fn standings(&self) -> Vec<&Player> {
        let mut ranked: Vec<&Player> = self.players.iter().collect();
        ranked.sort_by_key(|p| (!p.is_winner, Reverse(p.achievements.len())));
        ranked
    }

    /// Returns `true` if `number` has been called at least once.
    pub fn is_called(&self, number: u8) -> bool {
        self.called_numbers.contains(&number)
    }

    // -- Boundary ---------------------------------------------------------

    /// Decodes an untyped store snapshot and validates it.
    ///
    /// # Errors
    /// - [`ProtocolError::Decode`] if the shape is wrong
    /// - [`ProtocolError::InvalidSnapshot`] if an invariant is broken
    pub fn from_value(value: serde_json::Value) -> Result<Self, ProtocolError> {
        let room: Room = serde_json::from_value(value).map_err(ProtocolError::Decode)?;
        room.validate()?;
        Ok(room)
    }

    /// Encodes the room as a store snapshot.
    pub fn to_value(&self) -> Result<serde_json::Value, ProtocolError> {
        serde_json::to_value(self).map_err(ProtocolError::Encode)
    }

    /// Checks every room invariant.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        let invalid = |msg: String| Err(ProtocolError::InvalidSnapshot(msg));

        if !(MIN_ROOM_PLAYERS..=MAX_ROOM_PLAYERS).contains(&self.max_players) {
            return invalid(format!(
                "max players {} outside {MIN_ROOM_PLAYERS}..={MAX_ROOM_PLAYERS}",
                self.max_players
            ));
        }
        if self.players.len() > self.max_players {
            return invalid(format!(
                "{} players exceed capacity {}",
                self.players.len(),
                self.max_players
            ));
        }

        let mut ids = HashSet::new();
        for (index, player) in self.players.iter().enumerate() {
            if player.seat != index {
                return invalid(format!("player {} has seat {}, expected {index}", player.id, player.seat));
            }
            if !ids.insert(&player.id) {
                return invalid(format!("player {} appears twice", player.id));
            }
            if let Err(reason) = player.board.validate() {
                return invalid(format!("player {}: {reason}", player.id));
            }
            if player.achievements.len() > MAX_LETTERS
                || player
                    .achievements
                    .iter()
                    .enumerate()
                    .any(|(k, letter)| Letter::nth(k) != Some(*letter))
            {
                return invalid(format!("player {} holds out-of-order letters", player.id));
            }
        }

        if !self.players.is_empty() && self.player(&self.current_turn).is_none() {
            return invalid(format!("current turn {} is not a player", self.current_turn));
        }
        if self.ended && !self.started {
            return invalid("room ended without starting".to_owned());
        }
        match (&self.winner, self.ended) {
            (None, true) => return invalid("room ended without a winner".to_owned()),
            (Some(winner), false) => return invalid(format!("winner {winner} set but the room has not ended")),
            (Some(winner), true) => match self.player(winner) {
                Some(p) if p.is_winner => {}
                _ => return invalid(format!("winner {winner} is not a flagged player")),
            },
            (None, false) => {}
        }
        if let Some(p) = self
            .players
            .iter()
            .find(|p| p.is_winner && self.winner.as_ref() != Some(&p.id))
        {
            return invalid(format!("player {} is flagged as winner but did not win", p.id));
        }
        if let Some(n) = self.called_numbers.iter().find(|n| !NUMBER_POOL.contains(*n)) {
            return invalid(format!("called number {n} outside {NUMBER_POOL:?}"));
        }
        Ok(())
    }
}

/// Serializes the player list as an object keyed by player id (the
/// store's natural shape) and restores join order from `seat` on the way
/// back, since the store promises nothing about key order.
mod players_by_id {
    use super::*;
    use serde::de::Error as _;
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(players: &[Player], serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(players.len()))?;
        for player in players {
            map.serialize_entry(player.id.as_str(), player)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Player>, D::Error> {
        let by_id = BTreeMap::<String, Player>::deserialize(deserializer)?;
        let mut players = Vec::with_capacity(by_id.len());
        for (key, player) in by_id {
            if key != player.id.as_str() {
                return Err(D::Error::custom(format!(
                    "player stored under key {key} has id {}",
                    player.id
                )));
            }
            players.push(player);
        }
        players.sort_by_key(|p| p.seat);
        Ok(players)
    }
}
