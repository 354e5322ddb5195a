use async_trait::async_trait;
use chess_core::{GameStatus, Side};

use crate::entry::{AnalysisEntry, StoredAnalysis};
use crate::error::ReviewError;

/// The parts of a stored game a review needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewGame {
    pub id: i64,
    pub human_color: Side,
    /// UCI moves from the initial position
    pub moves: Vec<String>,
    pub status: GameStatus,
}

/// Persistence used by the reviewer.
#[async_trait]
pub trait GameStore: Send + Sync {
    async fn load_game(&self, game_id: i64) -> Result<Option<ReviewGame>, ReviewError>;

    async fn load_analysis(&self, game_id: i64) -> Result<Option<StoredAnalysis>, ReviewError>;

    /// Atomically move the game from finished to analyzing. `Ok(false)` means
    /// the game was not finished when the update ran.
    async fn begin_analysis(&self, game_id: i64) -> Result<bool, ReviewError>;

    async fn set_status(&self, game_id: i64, status: GameStatus) -> Result<(), ReviewError>;

    /// Replace the game's analysis with `entries` and set its status back to
    /// finished, atomically.
    async fn save_analysis(
        &self,
        game_id: i64,
        entries: &[AnalysisEntry],
        complete: bool,
    ) -> Result<(), ReviewError>;
}
