//! Engine session error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid difficulty level {0}: expected 1-10")]
    InvalidDifficulty(u8),

    /// Spawn or handshake failure. The underlying cause is logged, not carried.
    #[error("Engine initialization failed")]
    InitFailed,

    #[error("Engine did not answer '{command}' in time")]
    Timeout { command: String },

    #[error("Engine search timed out")]
    SearchTimeout,

    #[error("Engine process exited")]
    ProcessExited,

    #[error("No engine session for game {0}")]
    SessionNotFound(i64),

    #[error("Malformed engine response: {0}")]
    MalformedResponse(String),

    #[error("Engine I/O error: {0}")]
    Io(#[from] std::io::Error),
}
