//! The bingo card and the achievement symbols.

use std::collections::HashSet;
use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Cards are square: `BOARD_SIZE` rows of `BOARD_SIZE` cells.
pub const BOARD_SIZE: usize = 5;

/// Number of cells on a card.
pub const CELL_COUNT: usize = BOARD_SIZE * BOARD_SIZE;

/// Every number that can appear on a card or be called.
pub const NUMBER_POOL: RangeInclusive<u8> = 1..=25;

/// A player can hold at most one of each letter.
pub const MAX_LETTERS: usize = Letter::ALL.len();

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// A 5×5 card of distinct numbers.
///
/// Stored row-major; in JSON it is a plain nested array
/// (`[[3,17,...],[...],...]`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board([[u8; BOARD_SIZE]; BOARD_SIZE]);

impl Board {
    /// Wraps raw rows without checking them. See [`Board::validate`].
    pub fn from_rows(rows: [[u8; BOARD_SIZE]; BOARD_SIZE]) -> Self {
        Self(rows)
    }

    /// Returns the raw rows.
    pub fn rows(&self) -> &[[u8; BOARD_SIZE]; BOARD_SIZE] {
        &self.0
    }

    /// Returns row `index` (0-based, top to bottom).
    pub fn row(&self, index: usize) -> [u8; BOARD_SIZE] {
        self.0[index]
    }

    /// Returns column `index` (0-based, left to right).
    pub fn column(&self, index: usize) -> [u8; BOARD_SIZE] {
        std::array::from_fn(|row| self.0[row][index])
    }

    /// Top-left to bottom-right.
    pub fn diagonal(&self) -> [u8; BOARD_SIZE] {
        std::array::from_fn(|i| self.0[i][i])
    }

    /// Top-right to bottom-left.
    pub fn anti_diagonal(&self) -> [u8; BOARD_SIZE] {
        std::array::from_fn(|i| self.0[i][BOARD_SIZE - 1 - i])
    }

    /// Iterates all cells row by row.
    pub fn numbers(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().flatten().copied()
    }

    /// Returns `true` if `number` is printed on this card.
    pub fn contains(&self, number: u8) -> bool {
        self.numbers().any(|n| n == number)
    }

    /// Checks that the card holds [`CELL_COUNT`] distinct numbers from
    /// [`NUMBER_POOL`].
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = HashSet::with_capacity(CELL_COUNT);
        for number in self.numbers() {
            if !NUMBER_POOL.contains(&number) {
                return Err(format!("board number {number} outside {NUMBER_POOL:?}"));
            }
            if !seen.insert(number) {
                return Err(format!("board number {number} appears twice"));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Letter
// ---------------------------------------------------------------------------

/// One achievement symbol. Completed lines earn letters in the fixed order
/// B, I, N, G, O; holding all five wins the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Letter {
    B,
    I,
    N,
    G,
    O,
}

impl Letter {
    /// All letters in award order.
    pub const ALL: [Letter; 5] = [Letter::B, Letter::I, Letter::N, Letter::G, Letter::O];

    /// The letter awarded for the `index`-th completed line (0-based), or
    /// `None` once all five are handed out.
    pub fn nth(index: usize) -> Option<Letter> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Self::B => "B",
            Self::I => "I",
            Self::N => "N",
            Self::G => "G",
            Self::O => "O",
        };
        f.write_str(c)
    }
}
