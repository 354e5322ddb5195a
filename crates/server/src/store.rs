//! Postgres-backed store for game reviews.

use async_trait::async_trait;
use chess_core::GameStatus;
use game_review::{AnalysisEntry, GameStore, ReviewError, ReviewGame, StoredAnalysis};
use sqlx::PgPool;

use crate::db;
use crate::error::AppError;

pub struct PgGameStore {
    pool: PgPool,
}

impl PgGameStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn store_error(e: AppError) -> ReviewError {
    ReviewError::Store(e.to_string())
}

#[async_trait]
impl GameStore for PgGameStore {
    async fn load_game(&self, game_id: i64) -> Result<Option<ReviewGame>, ReviewError> {
        let game = db::games::get_game(&self.pool, game_id)
            .await
            .map_err(store_error)?;

        Ok(game.map(|g| ReviewGame {
            id: g.id,
            human_color: g.human_color,
            moves: g.moves,
            status: g.status,
        }))
    }

    async fn load_analysis(&self, game_id: i64) -> Result<Option<StoredAnalysis>, ReviewError> {
        db::analysis::get_analysis(&self.pool, game_id)
            .await
            .map_err(store_error)
    }

    async fn begin_analysis(&self, game_id: i64) -> Result<bool, ReviewError> {
        db::games::begin_analysis(&self.pool, game_id)
            .await
            .map_err(store_error)
    }

    async fn set_status(&self, game_id: i64, status: GameStatus) -> Result<(), ReviewError> {
        db::games::set_status(&self.pool, game_id, status)
            .await
            .map_err(store_error)
    }

    async fn save_analysis(
        &self,
        game_id: i64,
        entries: &[AnalysisEntry],
        complete: bool,
    ) -> Result<(), ReviewError> {
        db::analysis::save_analysis(&self.pool, game_id, entries, complete)
            .await
            .map_err(store_error)
    }
}
