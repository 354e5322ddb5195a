use chess_core::GameStatus;
use game_review::{AnalysisEntry, StoredAnalysis};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::db::games;
use crate::error::AppError;

pub async fn get_analysis(pool: &PgPool, game_id: i64) -> Result<Option<StoredAnalysis>, AppError> {
    let row: Option<(Json<Vec<AnalysisEntry>>, bool)> =
        sqlx::query_as("SELECT entries, complete FROM game_analysis WHERE game_id = $1")
            .bind(game_id)
            .fetch_optional(pool)
            .await
            .map_err(AppError::Sqlx)?;

    Ok(row.map(|(entries, complete)| StoredAnalysis {
        entries: entries.0,
        complete,
    }))
}

/// Replace the game's analysis and return the game to `finished` in one
/// transaction.
pub async fn save_analysis(
    pool: &PgPool,
    game_id: i64,
    entries: &[AnalysisEntry],
    complete: bool,
) -> Result<(), AppError> {
    let mut tx = pool.begin().await.map_err(AppError::Sqlx)?;

    sqlx::query(
        r#"INSERT INTO game_analysis (game_id, entries, complete)
        VALUES ($1, $2, $3)
        ON CONFLICT (game_id) DO UPDATE SET
            entries = EXCLUDED.entries,
            complete = EXCLUDED.complete,
            created_at = NOW()"#,
    )
    .bind(game_id)
    .bind(Json(entries))
    .bind(complete)
    .execute(&mut *tx)
    .await
    .map_err(AppError::Sqlx)?;

    games::set_status(&mut *tx, game_id, GameStatus::Finished).await?;

    tx.commit().await.map_err(AppError::Sqlx)?;
    Ok(())
}
