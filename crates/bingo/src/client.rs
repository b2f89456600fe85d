//! `BingoClient` builder and the player-facing operations.
//!
//! A client is one player's view of the game. It ties together the
//! layers: store → room rules → local identity and feeds.

use bingo_protocol::{PlayerId, Room, RoomId};
use bingo_room::{CallOutcome, GameConfig, RoomError, RoomManager, Seat};
use bingo_session::{ClientSession, IdentityStore, LocalIdentity, SessionFeed};
use bingo_store::SyncStore;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::{BingoError, ClientConfig};

/// Builder for a [`BingoClient`].
///
/// # Example
///
/// ```rust
/// use bingo::prelude::*;
///
/// # async fn demo() -> Result<(), BingoError> {
/// let client = BingoClientBuilder::new()
///     .quick_play_attempts(5)
///     .build(MemoryStore::new(), MemoryIdentityStore::new())?;
/// let me = client.create_room("Alice", 4).await?;
/// println!("share this code: {}", me.room_id);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct BingoClientBuilder {
    config: ClientConfig,
    seed: Option<u64>,
}

impl BingoClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the game rules and store limits.
    pub fn game_config(mut self, game: GameConfig) -> Self {
        self.config.game = game;
        self
    }

    /// Sets how many scans quick play makes before giving up.
    pub fn quick_play_attempts(mut self, attempts: u32) -> Self {
        self.config.quick_play_attempts = attempts;
        self
    }

    /// Seeds room codes, player ids and boards, for reproducible runs.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration and builds the client.
    ///
    /// # Errors
    /// [`BingoError::Room`] if a configuration value is out of range.
    pub fn build<S: SyncStore, I: IdentityStore>(self, store: S, identity: I) -> Result<BingoClient<S, I>, BingoError> {
        self.config.validate()?;
        let game = self.config.game.clone();
        let rooms = match self.seed {
            Some(seed) => RoomManager::with_rng(store, game, StdRng::seed_from_u64(seed)),
            None => RoomManager::new(store, game),
        };
        Ok(BingoClient {
            rooms,
            identity,
            session: ClientSession::new(),
            config: self.config,
        })
    }
}

/// One player's handle on the game.
///
/// Operations that act "as me" (`set_ready`, `start_game`, `call_number`,
/// ...) use the identity saved by the last `create_room`, `join_room` or
/// `quick_play`, and fail with [`BingoError::NoIdentity`] before that.
pub struct BingoClient<S: SyncStore, I: IdentityStore> {
    rooms: RoomManager<S>,
    identity: I,
    session: ClientSession,
    config: ClientConfig,
}

impl<S: SyncStore, I: IdentityStore> BingoClient<S, I> {
    /// Creates a new builder.
    pub fn builder() -> BingoClientBuilder {
        BingoClientBuilder::new()
    }

    /// The room layer this client drives, for operations on rooms other
    /// than the player's own.
    pub fn rooms(&self) -> &RoomManager<S> {
        &self.rooms
    }

    pub fn session(&self) -> &ClientSession {
        &self.session
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The saved identity, if any.
    pub async fn identity(&self) -> Result<Option<LocalIdentity>, BingoError> {
        Ok(self.identity.load().await?)
    }

    /// This player's id, if seated.
    pub async fn player_id(&self) -> Result<Option<PlayerId>, BingoError> {
        Ok(self.identity.load().await?.map(|me| me.player_id))
    }

    // -- Seating ----------------------------------------------------------

    /// Creates a room hosted by this player and remembers the seat.
    pub async fn create_room(&self, player_name: &str, max_players: usize) -> Result<LocalIdentity, BingoError> {
        let seat = self.rooms.create_room(player_name, max_players).await?;
        self.remember(seat, player_name).await
    }

    /// Joins a room by code and remembers the seat.
    pub async fn join_room(&self, room_id: &RoomId, player_name: &str) -> Result<LocalIdentity, BingoError> {
        let seat = self.rooms.join_room(room_id, player_name).await?;
        self.remember(seat, player_name).await
    }

    /// Joins the first open room, or hosts a new one of
    /// `quick_play_capacity` seats if none is open.
    ///
    /// If the chosen room fills, starts or disappears before the join
    /// lands, the scan is repeated up to `quick_play_attempts` times in
    /// total; after that the last such error is returned.
    pub async fn quick_play(&self, player_name: &str) -> Result<LocalIdentity, BingoError> {
        let attempts = self.config.quick_play_attempts;
        let mut attempt = 1;
        loop {
            match self.rooms.find_quick_play_room(player_name).await {
                Ok(Some(seat)) => return self.remember(seat, player_name).await,
                Ok(None) => {
                    let capacity = self.config.game.quick_play_capacity;
                    let seat = self.rooms.create_room(player_name, capacity).await?;
                    return self.remember(seat, player_name).await;
                }
                Err(err) if lost_matchmaking_race(&err) && attempt < attempts => {
                    tracing::debug!(error = %err, attempt, "quick play lost a race, rescanning");
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Re-attaches to the saved room after a restart.
    ///
    /// Returns the room if it still exists and still seats this player.
    /// Otherwise the stale identity is cleared and `None` returned.
    pub async fn resume(&self) -> Result<Option<Room>, BingoError> {
        let Some(me) = self.identity.load().await? else {
            return Ok(None);
        };
        match self.rooms.get_room(&me.room_id).await? {
            Some(room) if room.player(&me.player_id).is_some() => {
                tracing::info!(room_id = %me.room_id, player_id = %me.player_id, "resumed seat");
                Ok(Some(room))
            }
            _ => {
                tracing::info!(room_id = %me.room_id, player_id = %me.player_id, "saved seat is gone, forgetting it");
                self.identity.clear().await?;
                Ok(None)
            }
        }
    }

    // -- Acting as me -----------------------------------------------------

    pub async fn set_ready(&self, ready: bool) -> Result<(), BingoError> {
        let me = self.me().await?;
        Ok(self.rooms.set_ready(&me.room_id, &me.player_id, ready).await?)
    }

    /// Flips this player's ready flag and returns the new value.
    pub async fn toggle_ready(&self) -> Result<bool, BingoError> {
        let me = self.me().await?;
        Ok(self.rooms.toggle_ready(&me.room_id, &me.player_id).await?)
    }

    /// Starts the game. Host only.
    pub async fn start_game(&self) -> Result<(), BingoError> {
        let me = self.me().await?;
        Ok(self.rooms.start_game(&me.room_id, &me.player_id).await?)
    }

    /// Calls a number on this player's turn. Out of turn it does nothing
    /// and reports [`CallOutcome::NotYourTurn`].
    pub async fn call_number(&self, number: u8) -> Result<CallOutcome, BingoError> {
        let me = self.me().await?;
        Ok(self.rooms.call_number(&me.room_id, &me.player_id, number).await?)
    }

    /// Deletes this player's room and forgets the seat. Host only.
    ///
    /// # Errors
    /// [`RoomError::NotHost`] for anyone but the host,
    /// [`RoomError::RoomNotFound`] if the room is already gone.
    pub async fn delete_room(&self) -> Result<(), BingoError> {
        let me = self.me().await?;
        self.rooms.delete_room_as_host(&me.room_id, &me.player_id).await?;
        // The feed stays open until the room is really gone.
        self.session.unsubscribe(&me.room_id);
        self.identity.clear().await?;
        Ok(())
    }

    // -- Feeds ------------------------------------------------------------

    /// Watches a room. Any earlier feed this client had for the same room
    /// is closed.
    pub async fn subscribe_room(&self, room_id: &RoomId) -> Result<SessionFeed, BingoError> {
        let subscription = self.rooms.subscribe_room(room_id).await?;
        Ok(self.session.register(subscription))
    }

    /// Closes this client's feed for `room_id`. Returns `false` if there
    /// was none.
    pub fn unsubscribe_room(&self, room_id: &RoomId) -> bool {
        self.session.unsubscribe(&RoomId::normalize(room_id.as_str()))
    }

    // -- Internals --------------------------------------------------------

    async fn me(&self) -> Result<LocalIdentity, BingoError> {
        self.identity.load().await?.ok_or(BingoError::NoIdentity)
    }

    async fn remember(&self, seat: Seat, player_name: &str) -> Result<LocalIdentity, BingoError> {
        let identity = LocalIdentity {
            player_id: seat.player_id,
            player_name: player_name.to_owned(),
            room_id: seat.room_id,
        };
        self.identity.save(&identity).await?;
        Ok(identity)
    }
}

/// Errors quick play answers by scanning again.
fn lost_matchmaking_race(err: &RoomError) -> bool {
    matches!(
        err,
        RoomError::RoomFull(_) | RoomError::GameAlreadyStarted(_) | RoomError::RoomNotFound(_)
    )
}
