//! External UCI engine sessions.
//!
//! One engine process per live game, a serialized line-oriented transceiver
//! per process, an incremental parser for search output, and transient
//! single-use sessions for deep positional analysis.

pub mod config;
pub mod difficulty;
pub mod error;
pub mod evaluation;
pub mod parser;
pub mod session;
pub mod supervisor;
pub mod transceiver;

#[cfg(test)]
mod testing;

pub use config::EngineConfig;
pub use difficulty::{configuration_for, EngineProfile, SearchBudget};
pub use error::EngineError;
pub use evaluation::{Evaluation, SearchResult};
pub use session::{EngineSession, SessionLifetime};
pub use supervisor::{GameId, Supervisor};
