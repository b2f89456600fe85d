//! Pure room rules.
//!
//! Each function here takes the current [`Room`] and either mutates it or
//! explains why it can't. None of them touch the store: the
//! [`RoomManager`](crate::RoomManager) runs them inside a `transact`
//! closure, so a rule always sees the state it is about to overwrite.

use bingo_protocol::{Letter, Player, PlayerId, Room, NUMBER_POOL};

use crate::detector;
use crate::RoomError;

/// What a [`call`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    /// The number was appended and the turn passed on.
    Called {
        /// Who plays next.
        next_turn: PlayerId,
        /// Letters the caller earned with this call.
        awarded: Vec<Letter>,
        /// `true` if this call won the game.
        winner: bool,
    },
    /// It wasn't the caller's turn. Nothing changed.
    NotYourTurn,
    /// The room isn't running (not started yet, or already over).
    /// Nothing changed.
    NotInPlay,
}

impl CallOutcome {
    /// Returns `true` if the call changed the room.
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Called { .. })
    }
}

/// Rejects numbers no card can hold.
pub fn check_number(number: u8) -> Result<(), RoomError> {
    if NUMBER_POOL.contains(&number) {
        Ok(())
    } else {
        Err(RoomError::NumberOutOfRange(number))
    }
}

/// Seats `player` in the next free seat.
///
/// # Errors
/// [`RoomError::RoomFull`], then [`RoomError::GameAlreadyStarted`].
pub fn join(room: &mut Room, player: Player) -> Result<(), RoomError> {
    if room.is_full() {
        return Err(RoomError::RoomFull(room.id.clone()));
    }
    if room.started {
        return Err(RoomError::GameAlreadyStarted(room.id.clone()));
    }
    room.add_player(player);
    Ok(())
}

/// Sets a player's ready flag. Returns `false` if it already had that
/// value.
///
/// # Errors
/// [`RoomError::GameAlreadyStarted`] or [`RoomError::PlayerNotFound`].
pub fn set_ready(room: &mut Room, player_id: &PlayerId, ready: bool) -> Result<bool, RoomError> {
    if room.started {
        return Err(RoomError::GameAlreadyStarted(room.id.clone()));
    }
    let room_id = room.id.clone();
    let player = room
        .player_mut(player_id)
        .ok_or_else(|| RoomError::PlayerNotFound(player_id.clone(), room_id))?;
    if player.ready == ready {
        return Ok(false);
    }
    player.ready = ready;
    Ok(true)
}

/// Starts the game on the host's behalf.
///
/// # Errors
/// - [`RoomError::NotHost`] if `player_id` isn't the host
/// - [`RoomError::GameAlreadyStarted`]
/// - [`RoomError::PlayersNotReady`] with fewer than `min_players`
///   players or anyone not ready
pub fn start(room: &mut Room, player_id: &PlayerId, min_players: usize) -> Result<(), RoomError> {
    if !room.is_host(player_id) {
        return Err(RoomError::NotHost(player_id.clone(), room.id.clone()));
    }
    if room.started {
        return Err(RoomError::GameAlreadyStarted(room.id.clone()));
    }
    let players = room.player_count();
    if players < min_players || !room.all_ready() {
        return Err(RoomError::PlayersNotReady {
            room_id: room.id.clone(),
            players,
            ready: room.players().iter().filter(|p| p.ready).count(),
            required: min_players,
        });
    }
    room.started = true;
    Ok(())
}

/// Plays `number` for `player_id`.
///
/// Appends the number (repeats are allowed), passes the turn to the next
/// seat, and re-checks the caller's card. Other players' cards are left
/// alone until their own turn.
///
/// A call out of turn, or outside a running game, is not an error: it
/// returns [`CallOutcome::NotYourTurn`] / [`CallOutcome::NotInPlay`]
/// and leaves the room as it was.
///
/// # Errors
/// [`RoomError::NumberOutOfRange`] for numbers outside the pool.
pub fn call(room: &mut Room, player_id: &PlayerId, number: u8) -> Result<CallOutcome, RoomError> {
    check_number(number)?;
    if !room.started || room.ended {
        return Ok(CallOutcome::NotInPlay);
    }
    if &room.current_turn != player_id {
        return Ok(CallOutcome::NotYourTurn);
    }
    let next_turn = room
        .next_turn_after(player_id)
        .ok_or_else(|| RoomError::PlayerNotFound(player_id.clone(), room.id.clone()))?;

    room.called_numbers.push(number);
    room.current_turn = next_turn.clone();

    let called = room.called_numbers.clone();
    let room_id = room.id.clone();
    let player = room
        .player_mut(player_id)
        .ok_or_else(|| RoomError::PlayerNotFound(player_id.clone(), room_id))?;
    let awarded = detector::award(player, &called);
    let winner = detector::has_all_letters(player);
    if winner {
        player.is_winner = true;
        room.ended = true;
        room.winner = Some(player_id.clone());
    }

    Ok(CallOutcome::Called {
        next_turn,
        awarded,
        winner,
    })
}
