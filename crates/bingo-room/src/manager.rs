//! Room manager: creates rooms, seats players and applies moves through
//! the shared store.
//!
//! Rooms live at `rooms/<code>`. Every operation that checks something
//! and then writes (capacity on join, the turn pointer on a call, ready
//! flags on start) runs as one [`transact`] on the room path, so two
//! clients racing for the last seat, or a call submitted twice, resolve
//! against the state actually being overwritten.

use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use bingo_protocol::{Player, PlayerId, Room, RoomId};
use bingo_store::{transact, StoreError, StorePath, SyncStore, Transaction};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;

use crate::config::check_capacity;
use crate::{engine, generate_board, CallOutcome, GameConfig, RoomError, RoomSubscription};

/// Store segment that holds every room.
const ROOMS: &str = "rooms";

/// Where a player sits: the room and their id in it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Seat {
    pub room_id: RoomId,
    pub player_id: PlayerId,
}

/// Entry point for every room operation.
///
/// Holds no room state of its own; all of it is in the store, so any
/// number of managers (one per client, typically) can share one store.
pub struct RoomManager<S: SyncStore> {
    store: S,
    config: GameConfig,
    /// Room codes, player ids and boards. Only locked for synchronous
    /// draws, never across an await.
    rng: Mutex<StdRng>,
}

impl<S: SyncStore> RoomManager<S> {
    /// Creates a manager with an OS-seeded RNG.
    pub fn new(store: S, config: GameConfig) -> Self {
        Self::with_rng(store, config, StdRng::from_os_rng())
    }

    /// Creates a manager drawing from `rng`. Seed it for reproducible
    /// room codes, ids and boards.
    pub fn with_rng(store: S, config: GameConfig, rng: StdRng) -> Self {
        Self {
            store,
            config,
            rng: Mutex::new(rng),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    // -- Lifecycle --------------------------------------------------------

    /// Creates a room with the caller as host and only player.
    ///
    /// The host is not ready and holds the first turn. A freshly drawn
    /// code that is already taken is discarded and another one drawn.
    ///
    /// # Errors
    /// - [`RoomError::InvalidCapacity`] before anything is written
    /// - [`RoomError::Store`] if the store is unreachable, or every
    ///   drawn code was taken
    pub async fn create_room(&self, host_name: &str, max_players: usize) -> Result<Seat, RoomError> {
        check_capacity(max_players)?;
        let host = self.new_player(host_name)?;
        let host_id = host.id.clone();

        for attempt in 1..=self.config.room_code_attempts {
            let room_id = self.draw(RoomId::generate);
            let room = Room::new(room_id.clone(), host.clone(), max_players, now_millis());
            room.validate()?;
            let value = room.to_value()?;
            let path = self.room_path(&room_id)?;

            let created = self
                .bounded(transact(
                    &self.store,
                    &path,
                    self.config.transact_attempts,
                    |current| {
                        Ok::<_, RoomError>(match current {
                            Some(_) => Transaction::Skip(false),
                            None => Transaction::Commit(Some(value.clone()), true),
                        })
                    },
                ))
                .await?;

            if created {
                tracing::info!(%room_id, player_id = %host_id, max_players, "room created");
                return Ok(Seat {
                    room_id,
                    player_id: host_id,
                });
            }
            tracing::debug!(%room_id, attempt, "room code taken, drawing another");
        }

        Err(StoreError::Contention {
            path: ROOMS.to_owned(),
            attempts: self.config.room_code_attempts,
        }
        .into())
    }

    /// Seats a new player in an existing room.
    ///
    /// # Errors
    /// [`RoomError::RoomNotFound`], [`RoomError::RoomFull`] or
    /// [`RoomError::GameAlreadyStarted`], checked against the room as it
    /// is when the seat is written.
    pub async fn join_room(&self, room_id: &RoomId, player_name: &str) -> Result<Seat, RoomError> {
        let room_id = RoomId::normalize(room_id.as_str());
        let player = self.new_player(player_name)?;
        let player_id = player.id.clone();

        let seat = self
            .update_room(&room_id, |room| {
                engine::join(room, player.clone())?;
                Ok(room.player_count() - 1)
            })
            .await?;

        tracing::info!(%room_id, %player_id, seat, "player joined");
        Ok(Seat { room_id, player_id })
    }

    /// Sets a player's ready flag.
    ///
    /// # Errors
    /// [`RoomError::RoomNotFound`], [`RoomError::PlayerNotFound`], or
    /// [`RoomError::GameAlreadyStarted`] (ready flags freeze at start).
    pub async fn set_ready(&self, room_id: &RoomId, player_id: &PlayerId, ready: bool) -> Result<(), RoomError> {
        let changed = self
            .update_room(room_id, |room| engine::set_ready(room, player_id, ready))
            .await?;
        if changed {
            tracing::info!(%room_id, %player_id, ready, "ready flag changed");
        }
        Ok(())
    }

    /// Flips a player's ready flag and returns the new value.
    ///
    /// # Errors
    /// Same as [`set_ready`](Self::set_ready).
    pub async fn toggle_ready(&self, room_id: &RoomId, player_id: &PlayerId) -> Result<bool, RoomError> {
        let ready = self
            .update_room(room_id, |room| {
                let current = room
                    .player(player_id)
                    .map(|p| p.ready)
                    .ok_or_else(|| RoomError::PlayerNotFound(player_id.clone(), room.id.clone()))?;
                engine::set_ready(room, player_id, !current)?;
                Ok(!current)
            })
            .await?;
        tracing::info!(%room_id, %player_id, ready, "ready flag changed");
        Ok(ready)
    }

    /// Starts the game. Host only; needs every player ready and at least
    /// [`GameConfig::min_players_to_start`] of them.
    ///
    /// # Errors
    /// [`RoomError::RoomNotFound`], [`RoomError::NotHost`],
    /// [`RoomError::GameAlreadyStarted`] or [`RoomError::PlayersNotReady`].
    pub async fn start_game(&self, room_id: &RoomId, player_id: &PlayerId) -> Result<(), RoomError> {
        let min_players = self.config.min_players_to_start;
        let players = self
            .update_room(room_id, |room| {
                engine::start(room, player_id, min_players)?;
                Ok(room.player_count())
            })
            .await?;
        tracing::info!(%room_id, %player_id, players, "game started");
        Ok(())
    }

    /// Calls `number` for `player_id`: appends it, passes the turn to the
    /// next seat, and awards any letters the caller just earned.
    ///
    /// Only the caller's card is checked for new lines.
    ///
    /// # Errors
    /// [`RoomError::NumberOutOfRange`] (before any store access),
    /// [`RoomError::RoomNotFound`], store and snapshot errors.
    pub async fn call_number(&self, room_id: &RoomId, player_id: &PlayerId, number: u8) -> Result<CallOutcome, RoomError> {
        engine::check_number(number)?;
        let outcome = self
            .update_room(room_id, |room| engine::call(room, player_id, number))
            .await?;

        match &outcome {
            CallOutcome::Called {
                next_turn,
                awarded,
                winner,
            } => {
                tracing::info!(%room_id, %player_id, number, %next_turn, "number called");
                if !awarded.is_empty() {
                    let letters: String = awarded.iter().map(ToString::to_string).collect();
                    tracing::info!(%room_id, %player_id, %letters, "letters awarded");
                }
                if *winner {
                    tracing::info!(%room_id, %player_id, "winner");
                }
            }
            CallOutcome::NotYourTurn => {
                tracing::debug!(%room_id, %player_id, number, "call ignored, not this player's turn");
            }
            CallOutcome::NotInPlay => {
                tracing::debug!(%room_id, %player_id, number, "call ignored, game not in play");
            }
        }
        Ok(outcome)
    }

    /// Removes the room and everything in it. The caller is trusted; see
    /// [`delete_room_as_host`](Self::delete_room_as_host) for the checked
    /// variant.
    ///
    /// # Errors
    /// [`RoomError::RoomNotFound`] if there is nothing to delete.
    pub async fn delete_room(&self, room_id: &RoomId) -> Result<(), RoomError> {
        let path = self.room_path(room_id)?;
        self.bounded(transact(
            &self.store,
            &path,
            self.config.transact_attempts,
            |current| match current {
                Some(_) => Ok(Transaction::Commit(None, ())),
                None => Err(RoomError::RoomNotFound(room_id.clone())),
            },
        ))
        .await?;
        tracing::info!(%room_id, "room deleted");
        Ok(())
    }

    /// Removes the room if `player_id` hosts it. The host check and the
    /// removal are one atomic update.
    ///
    /// # Errors
    /// [`RoomError::RoomNotFound`] or [`RoomError::NotHost`]; nothing is
    /// removed in either case.
    pub async fn delete_room_as_host(&self, room_id: &RoomId, player_id: &PlayerId) -> Result<(), RoomError> {
        let path = self.room_path(room_id)?;
        self.bounded(transact(
            &self.store,
            &path,
            self.config.transact_attempts,
            |current| -> Result<Transaction<()>, RoomError> {
                let value = current.ok_or_else(|| RoomError::RoomNotFound(room_id.clone()))?;
                let room = decode_room(room_id, value)?;
                if !room.is_host(player_id) {
                    return Err(RoomError::NotHost(player_id.clone(), room.id));
                }
                Ok(Transaction::Commit(None, ()))
            },
        ))
        .await?;
        tracing::info!(%room_id, %player_id, "room deleted by host");
        Ok(())
    }

    // -- Reads ------------------------------------------------------------

    /// Reads and validates one room. `Ok(None)` if it doesn't exist.
    ///
    /// # Errors
    /// [`RoomError::Protocol`] if the stored snapshot is malformed.
    pub async fn get_room(&self, room_id: &RoomId) -> Result<Option<Room>, RoomError> {
        let Ok(path) = self.room_path(room_id) else {
            return Ok(None);
        };
        let value = self
            .bounded(async { self.store.read(&path).await.map_err(RoomError::from) })
            .await?;
        value.map(|v| decode_room(room_id, v)).transpose()
    }

    /// Every valid room, in store order. Malformed snapshots are logged
    /// and skipped.
    pub async fn list_rooms(&self) -> Result<Vec<Room>, RoomError> {
        let path = StorePath::root().child(ROOMS)?;
        let value = self
            .bounded(async { self.store.read(&path).await.map_err(RoomError::from) })
            .await?;

        let Some(Value::Object(entries)) = value else {
            return Ok(Vec::new());
        };
        let mut rooms = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let key = RoomId::from(key);
            match decode_room(&key, value) {
                Ok(room) if room.id == key => rooms.push(room),
                Ok(room) => {
                    tracing::warn!(%key, room_id = %room.id, "room stored under the wrong key, skipping");
                }
                // Already logged by decode_room.
                Err(_) => {}
            }
        }
        Ok(rooms)
    }

    // -- Matchmaking ------------------------------------------------------

    /// Joins the first open room: not started, not empty, not full.
    ///
    /// Returns `Ok(None)` when nothing is open; the caller then creates a
    /// room of [`GameConfig::quick_play_capacity`]. First fit in store
    /// order, no fairness.
    ///
    /// # Errors
    /// If the chosen room fills up or starts between the scan and the
    /// join, the join's [`RoomError::RoomFull`] /
    /// [`RoomError::GameAlreadyStarted`] is returned as is.
    pub async fn find_quick_play_room(&self, player_name: &str) -> Result<Option<Seat>, RoomError> {
        let rooms = self.list_rooms().await?;
        let open = rooms
            .into_iter()
            .find(|room| !room.started && room.player_count() > 0 && !room.is_full());

        let Some(room) = open else {
            tracing::debug!("no open room for quick play");
            return Ok(None);
        };
        tracing::debug!(room_id = %room.id, players = room.player_count(), "quick play picked a room");
        self.join_room(&room.id, player_name).await.map(Some)
    }

    // -- Subscriptions ----------------------------------------------------

    /// Starts watching a room. The current state arrives first if the
    /// room exists.
    pub async fn subscribe_room(&self, room_id: &RoomId) -> Result<RoomSubscription, RoomError> {
        let path = self.room_path(room_id)?;
        let inner = self
            .bounded(async { self.store.subscribe(&path).await.map_err(RoomError::from) })
            .await?;
        tracing::debug!(%room_id, "room subscription opened");
        Ok(RoomSubscription::new(RoomId::normalize(room_id.as_str()), inner))
    }

    // -- Internals --------------------------------------------------------

    /// Runs `apply` against the stored room as one atomic update.
    ///
    /// Writes back only if `apply` changed something. `apply` may run
    /// more than once under contention.
    async fn update_room<T, F>(&self, room_id: &RoomId, mut apply: F) -> Result<T, RoomError>
    where
        F: FnMut(&mut Room) -> Result<T, RoomError>,
    {
        let path = self.room_path(room_id)?;
        self.bounded(transact(
            &self.store,
            &path,
            self.config.transact_attempts,
            |current| -> Result<Transaction<T>, RoomError> {
                let value = current.ok_or_else(|| RoomError::RoomNotFound(room_id.clone()))?;
                let mut room = decode_room(room_id, value)?;
                let before = room.clone();
                let output = apply(&mut room)?;
                if room == before {
                    Ok(Transaction::Skip(output))
                } else {
                    room.validate()?;
                    Ok(Transaction::Commit(Some(room.to_value()?), output))
                }
            },
        ))
        .await
    }

    /// Bounds `op` by [`GameConfig::store_timeout`].
    async fn bounded<T>(&self, op: impl Future<Output = Result<T, RoomError>>) -> Result<T, RoomError> {
        let limit = self.config.store_timeout;
        match tokio::time::timeout(limit, op).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Unavailable(format!("store did not answer within {limit:?}")).into()),
        }
    }

    /// Codes are matched case-insensitively, the way players type them.
    fn room_path(&self, room_id: &RoomId) -> Result<StorePath, RoomError> {
        let code = RoomId::normalize(room_id.as_str());
        StorePath::root()
            .child(ROOMS)
            .and_then(|rooms| rooms.child(code.as_str()))
            .map_err(|_| RoomError::RoomNotFound(room_id.clone()))
    }

    fn new_player(&self, name: &str) -> Result<Player, RoomError> {
        let id = self.draw(PlayerId::generate);
        let board = self.draw(|rng| generate_board(rng, self.config.number_pool.clone()))?;
        Ok(Player::new(id, name, board))
    }

    fn draw<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }
}

fn decode_room(room_id: &RoomId, value: Value) -> Result<Room, RoomError> {
    Room::from_value(value).map_err(|err| {
        tracing::warn!(%room_id, error = %err, "rejected malformed room snapshot");
        RoomError::from(err)
    })
}

/// Milliseconds since the Unix epoch.
fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
