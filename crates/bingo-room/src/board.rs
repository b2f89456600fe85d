//! Board generation.

use std::ops::RangeInclusive;

use bingo_protocol::{Board, BOARD_SIZE, CELL_COUNT};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::RoomError;

/// Deals a fresh card: [`CELL_COUNT`] distinct numbers drawn uniformly
/// without replacement from `pool`, laid out row by row.
///
/// The RNG is passed in so callers (and tests) control the randomness:
///
/// ```rust
/// use rand::{rngs::StdRng, SeedableRng};
/// use bingo_room::generate_board;
///
/// let mut rng = StdRng::seed_from_u64(7);
/// let board = generate_board(&mut rng, 1..=25).unwrap();
/// assert!(board.validate().is_ok());
/// ```
///
/// # Errors
/// [`RoomError::RangeExhausted`] if `pool` holds fewer than
/// [`CELL_COUNT`] numbers.
pub fn generate_board<R: Rng + ?Sized>(rng: &mut R, pool: RangeInclusive<u8>) -> Result<Board, RoomError> {
    let mut numbers: Vec<u8> = pool.collect();
    if numbers.len() < CELL_COUNT {
        return Err(RoomError::RangeExhausted {
            needed: CELL_COUNT,
            available: numbers.len(),
        });
    }

    // A partial Fisher-Yates over the first CELL_COUNT slots is a uniform
    // sample without replacement.
    let (sample, _) = numbers.partial_shuffle(rng, CELL_COUNT);

    let mut rows = [[0u8; BOARD_SIZE]; BOARD_SIZE];
    for (cell, number) in rows.iter_mut().flatten().zip(sample.iter()) {
        *cell = *number;
    }
    Ok(Board::from_rows(rows))
}
