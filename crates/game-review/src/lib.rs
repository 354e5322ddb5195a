//! Post-game review: replay a finished game, score each position with the
//! engine and flag the human's mistakes and blunders.

pub mod analyzer;
pub mod classify;
pub mod entry;
pub mod error;
pub mod orchestrator;
pub mod scale;
pub mod store;

pub use analyzer::PositionAnalyzer;
pub use classify::{classify, PostMove, Verdict};
pub use entry::{AnalysisEntry, StoredAnalysis};
pub use error::ReviewError;
pub use orchestrator::GameReviewer;
pub use scale::{advantage, MATE_BONUS};
pub use store::{GameStore, ReviewGame};
