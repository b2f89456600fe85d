//! Line detection and letter awards.
//!
//! Letters are handed out by *count*, not by which line was completed:
//! the first complete line a player has earns B, the second I, and so on.
//! Rows are checked first, then columns, then the two diagonals together
//! as a single line (completing both still counts once).
//!
//! Recomputing is idempotent. A player who already holds `k` letters only
//! gains more once at least `k + 1` lines are complete, and never loses
//! any.

use std::collections::HashSet;

use bingo_protocol::{Board, Letter, Player, BOARD_SIZE, MAX_LETTERS};

/// One line on a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Row(usize),
    Column(usize),
    /// Either diagonal.
    Diagonal,
}

/// Lines of `board` fully covered by `called`, in award order.
pub fn completed_lines(board: &Board, called: &[u8]) -> Vec<Line> {
    let called: HashSet<u8> = called.iter().copied().collect();
    let covered = |cells: [u8; BOARD_SIZE]| cells.iter().all(|n| called.contains(n));

    let rows = (0..BOARD_SIZE).filter(|&i| covered(board.row(i))).map(Line::Row);
    let columns = (0..BOARD_SIZE)
        .filter(|&i| covered(board.column(i)))
        .map(Line::Column);
    let diagonal = (covered(board.diagonal()) || covered(board.anti_diagonal())).then_some(Line::Diagonal);

    rows.chain(columns).chain(diagonal).collect()
}

/// Brings `player`'s letters up to date with `called` and returns the
/// ones added by this call (possibly several, possibly none).
pub fn award(player: &mut Player, called: &[u8]) -> Vec<Letter> {
    let before = player.achievements.len();
    for (k, _) in completed_lines(&player.board, called).iter().enumerate() {
        if k >= MAX_LETTERS {
            break;
        }
        if player.achievements.len() == k {
            if let Some(letter) = Letter::nth(k) {
                player.achievements.push(letter);
            }
        }
    }
    player.achievements[before..].to_vec()
}

/// Returns `true` once a player holds every letter.
pub fn has_all_letters(player: &Player) -> bool {
    player.achievements.len() >= MAX_LETTERS
}
