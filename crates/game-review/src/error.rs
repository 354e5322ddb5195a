//! Review error types

use engine_session::EngineError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("Game not found: {0}")]
    GameNotFound(i64),

    #[error("Game {0} is not finished")]
    NotFinished(i64),

    #[error("Game {0} is already being analyzed")]
    AlreadyAnalyzing(i64),

    #[error("Recorded move {mv} at ply {ply} cannot be replayed")]
    ReplayCorruption { ply: usize, mv: String },

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Storage error: {0}")]
    Store(String),
}
