use bingo::prelude::*;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

type Client = BingoClient<MemoryStore, MemoryIdentityStore>;

const NAMES: [&str; 6] = ["Alice", "Bob", "Carol", "Dave", "Erin", "Frank"];

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Read from the environment:
///
/// - `BINGO_PLAYERS`: 2..=6 players, default 3
/// - `BINGO_SEED`: fixes room codes, boards and every pick
struct Settings {
    players: usize,
    seed: u64,
}

impl Settings {
    fn from_env() -> Self {
        let players = match std::env::var("BINGO_PLAYERS") {
            Ok(raw) => match raw.parse::<usize>() {
                Ok(n) if (2..=NAMES.len()).contains(&n) => n,
                _ => {
                    tracing::warn!(value = %raw, "BINGO_PLAYERS must be 2..=6, using 3");
                    3
                }
            },
            Err(_) => 3,
        };
        let seed = std::env::var("BINGO_SEED")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_else(rand::random);
        Self { players, seed }
    }
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// A random number still missing from `player`'s card. Once the whole card
/// has been called, any number on it: only the caller's card is checked
/// after a call, so the repeat is what lands the win.
fn pick_number<R: Rng + ?Sized>(room: &Room, player: &Player, rng: &mut R) -> Option<u8> {
    let card: Vec<u8> = player.board.numbers().collect();
    let open: Vec<u8> = card.iter().copied().filter(|n| !room.is_called(*n)).collect();
    if open.is_empty() {
        card.choose(rng).copied()
    } else {
        open.choose(rng).copied()
    }
}

/// Plays one full game on a shared in-memory store and returns the
/// winner's name.
async fn simulate(settings: &Settings) -> Result<String, BingoError> {
    let store = MemoryStore::new();
    let clients: Vec<Client> = (0..settings.players)
        .map(|i| {
            Client::builder()
                .seed(settings.seed.wrapping_add(i as u64))
                .build(store.clone(), MemoryIdentityStore::new())
        })
        .collect::<Result<_, _>>()?;

    // The host opens a room sized for everyone; the rest come in through
    // quick play, the way players without a code would.
    let host = clients[0].create_room(NAMES[0], settings.players).await?;
    for (i, client) in clients.iter().enumerate().skip(1) {
        let me = client.quick_play(NAMES[i]).await?;
        debug_assert_eq!(me.room_id, host.room_id);
    }

    let mut feed = clients[0].subscribe_room(&host.room_id).await?;
    let watcher = tokio::spawn(async move {
        let mut seen = 0usize;
        while let Some(update) = feed.recv().await {
            match update {
                RoomUpdate::Changed(room) => {
                    seen += 1;
                    tracing::debug!(calls = room.called_numbers.len(), turn = %room.current_turn, "room update");
                }
                RoomUpdate::Removed => break,
                RoomUpdate::Rejected(err) => tracing::warn!(error = %err, "bad room update"),
            }
        }
        seen
    });

    for client in &clients {
        client.toggle_ready().await?;
    }
    clients[0].start_game().await?;

    let mut ids = Vec::with_capacity(clients.len());
    for client in &clients {
        ids.push(client.player_id().await?.ok_or(BingoError::NoIdentity)?);
    }

    let mut rng = StdRng::seed_from_u64(settings.seed);
    let winner = loop {
        let room = clients[0]
            .rooms()
            .get_room(&host.room_id)
            .await?
            .ok_or_else(|| RoomError::RoomNotFound(host.room_id.clone()))?;
        let Some(turn) = ids.iter().position(|id| id == &room.current_turn) else {
            return Err(RoomError::PlayerNotFound(room.current_turn, room.id).into());
        };

        let Some(number) = pick_number(&room, &room.players()[turn], &mut rng) else {
            break None;
        };

        if let CallOutcome::Called { awarded, winner: true, .. } = clients[turn].call_number(number).await? {
            tracing::info!(player = NAMES[turn], last = ?awarded, "BINGO");
            break Some(NAMES[turn].to_owned());
        }
    };

    let final_room = clients[0].rooms().get_room(&host.room_id).await?;
    if let Some(room) = final_room {
        for (place, player) in room.standings().into_iter().enumerate() {
            let letters: String = player.achievements.iter().map(ToString::to_string).collect();
            tracing::info!(place = place + 1, player = %player.name, letters = %letters, "final standings");
        }
        tracing::info!(calls = room.called_numbers.len(), "game over");
    }

    clients[0].delete_room().await?;
    let updates = watcher.await.unwrap_or_default();
    tracing::info!(updates, "watcher saw room updates");

    Ok(winner.unwrap_or_else(|| "nobody".to_owned()))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let settings = Settings::from_env();
    tracing::info!(players = settings.players, seed = settings.seed, "starting bingo simulation");

    let winner = simulate(&settings).await?;
    eprintln!("winner: {winner}");
    Ok(())
}
