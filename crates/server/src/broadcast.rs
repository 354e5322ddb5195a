//! Per-game fan-out of state updates to WebSocket viewers.

use std::collections::HashMap;
use std::sync::Mutex;

use chess_core::{GameResult, GameStatus};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::db::games::Game;

const CHANNEL_CAPACITY: usize = 32;

/// Game state pushed after every persisted ply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameUpdate {
    pub game_id: i64,
    pub fen: String,
    pub moves: Vec<String>,
    pub status: GameStatus,
    pub result: GameResult,
    pub last_engine_move: Option<String>,
}

impl From<&Game> for GameUpdate {
    fn from(game: &Game) -> Self {
        Self {
            game_id: game.id,
            fen: game.fen.clone(),
            moves: game.moves.clone(),
            status: game.status,
            result: game.result,
            last_engine_move: game.last_engine_move.clone(),
        }
    }
}

#[derive(Default)]
pub struct BroadcastHub {
    channels: Mutex<HashMap<i64, broadcast::Sender<GameUpdate>>>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, game_id: i64) -> broadcast::Receiver<GameUpdate> {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        channels
            .entry(game_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Forget the channel for `game_id` if nobody is subscribed to it.
    pub fn release(&self, game_id: i64) {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        if channels
            .get(&game_id)
            .is_some_and(|sender| sender.receiver_count() == 0)
        {
            channels.remove(&game_id);
        }
    }

    /// Send `update` to current subscribers of its game. Returns how many
    /// received it; zero subscribers is not an error.
    pub fn publish(&self, update: GameUpdate) -> usize {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        let game_id = update.game_id;
        let Some(sender) = channels.get(&game_id) else {
            return 0;
        };
        match sender.send(update) {
            Ok(receivers) => receivers,
            Err(_) => {
                // every viewer has gone away
                channels.remove(&game_id);
                0
            }
        }
    }
}
