//! Client configuration.

use bingo_room::{GameConfig, RoomError};

/// Settings for a [`BingoClient`](crate::BingoClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Rules and store limits shared with the room layer.
    pub game: GameConfig,

    /// Scans quick play makes when the room it picked fills up or starts
    /// before the join lands.
    pub quick_play_attempts: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            game: GameConfig::default(),
            quick_play_attempts: 3,
        }
    }
}

impl ClientConfig {
    /// Checks every value, including the nested [`GameConfig`].
    pub fn validate(&self) -> Result<(), RoomError> {
        self.game.validate()?;
        if self.quick_play_attempts == 0 {
            return Err(RoomError::InvalidConfig("quick_play_attempts must be at least 1".to_owned()));
        }
        Ok(())
    }
}
