//! Game configuration.

use std::ops::RangeInclusive;
use std::time::Duration;

use bingo_protocol::{CELL_COUNT, MAX_ROOM_PLAYERS, MIN_ROOM_PLAYERS, NUMBER_POOL};

use crate::RoomError;

/// Tunables for the room layer.
///
/// Override individual fields with struct-update syntax:
///
/// ```rust
/// use std::time::Duration;
/// use bingo_room::GameConfig;
///
/// let config = GameConfig {
///     store_timeout: Duration::from_secs(1),
///     ..GameConfig::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    /// Fewest players the host may start with.
    pub min_players_to_start: usize,

    /// Capacity of rooms created by quick play when no open room exists.
    pub quick_play_capacity: usize,

    /// Numbers boards are drawn from. Must sit inside 1..=25, the range
    /// every stored board is validated against.
    pub number_pool: RangeInclusive<u8>,

    /// Upper bound on every store round trip. Expiry surfaces as
    /// `StoreError::Unavailable`.
    pub store_timeout: Duration,

    /// Lost compare-and-set races tolerated per operation.
    pub transact_attempts: u32,

    /// Fresh room codes tried before giving up on `create_room`.
    pub room_code_attempts: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_players_to_start: 2,
            quick_play_capacity: 4,
            number_pool: NUMBER_POOL,
            store_timeout: Duration::from_secs(5),
            transact_attempts: 16,
            room_code_attempts: 8,
        }
    }
}

impl GameConfig {
    /// Checks that the values can produce a playable game.
    ///
    /// # Errors
    /// - [`RoomError::InvalidCapacity`] for a quick-play capacity outside
    ///   the supported room sizes
    /// - [`RoomError::RangeExhausted`] if the pool can't fill a card
    /// - [`RoomError::InvalidConfig`] for anything else
    pub fn validate(&self) -> Result<(), RoomError> {
        check_capacity(self.quick_play_capacity)?;

        if !(MIN_ROOM_PLAYERS..=MAX_ROOM_PLAYERS).contains(&self.min_players_to_start) {
            return Err(RoomError::InvalidConfig(format!(
                "min_players_to_start {} outside {MIN_ROOM_PLAYERS}..={MAX_ROOM_PLAYERS}",
                self.min_players_to_start
            )));
        }
        if !NUMBER_POOL.contains(self.number_pool.start()) || !NUMBER_POOL.contains(self.number_pool.end()) {
            return Err(RoomError::InvalidConfig(format!(
                "number pool {:?} not inside {NUMBER_POOL:?}",
                self.number_pool
            )));
        }
        let available = self.number_pool.clone().count();
        if available < CELL_COUNT {
            return Err(RoomError::RangeExhausted {
                needed: CELL_COUNT,
                available,
            });
        }
        if self.store_timeout.is_zero() {
            return Err(RoomError::InvalidConfig("store_timeout must be non-zero".to_owned()));
        }
        if self.transact_attempts == 0 || self.room_code_attempts == 0 {
            return Err(RoomError::InvalidConfig("attempt limits must be at least 1".to_owned()));
        }
        Ok(())
    }
}

/// Rejects room sizes outside `MIN_ROOM_PLAYERS..=MAX_ROOM_PLAYERS`.
pub(crate) fn check_capacity(requested: usize) -> Result<(), RoomError> {
    if (MIN_ROOM_PLAYERS..=MAX_ROOM_PLAYERS).contains(&requested) {
        Ok(())
    } else {
        Err(RoomError::InvalidCapacity {
            requested,
            min: MIN_ROOM_PLAYERS,
            max: MAX_ROOM_PLAYERS,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_config_default() {
        let config = GameConfig::default();
        assert_eq!(config.min_players_to_start, 2);
        assert_eq!(config.quick_play_capacity, 4);
        assert_eq!(config.number_pool, 1..=25);
        assert_eq!(config.store_timeout, Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_small_pool_is_range_exhausted() {
        let config = GameConfig {
            number_pool: 1..=10,
            ..GameConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RoomError::RangeExhausted { needed: 25, available: 10 })
        ));
    }

    #[test]
    fn test_validate_pool_outside_fixed_range_rejected() {
        let config = GameConfig {
            number_pool: 1..=30,
            ..GameConfig::default()
        };
        assert!(matches!(config.validate(), Err(RoomError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_quick_play_capacity_out_of_range() {
        let config = GameConfig {
            quick_play_capacity: 7,
            ..GameConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RoomError::InvalidCapacity { requested: 7, .. })
        ));
    }

    #[test]
    fn test_check_capacity_bounds() {
        assert!(check_capacity(1).is_err());
        assert!(check_capacity(2).is_ok());
        assert!(check_capacity(6).is_ok());
        assert!(check_capacity(7).is_err());
    }
}
