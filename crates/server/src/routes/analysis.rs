use std::sync::Arc;

use axum::{extract::Path, Extension, Json};
use game_review::{GameReviewer, StoredAnalysis};
use serde_json::{json, Value as JsonValue};
use sqlx::PgPool;

use crate::db::analysis;
use crate::error::AppError;

/// POST /api/games/{game_id}/analysis
///
/// Runs the review, or returns the stored one if it is complete.
pub async fn run_analysis(
    Extension(reviewer): Extension<Arc<GameReviewer>>,
    Path(game_id): Path<i64>,
) -> Result<Json<JsonValue>, AppError> {
    let entries = reviewer.analyze(game_id).await?;
    Ok(Json(json!({
        "gameId": game_id,
        "complete": true,
        "entries": entries,
    })))
}

/// GET /api/games/{game_id}/analysis
pub async fn get_analysis(
    Extension(pool): Extension<PgPool>,
    Path(game_id): Path<i64>,
) -> Result<Json<JsonValue>, AppError> {
    let StoredAnalysis { entries, complete } = analysis::get_analysis(&pool, game_id)
        .await?
        .ok_or(AppError::NotFound("Analysis not found".into()))?;

    Ok(Json(json!({
        "gameId": game_id,
        "complete": complete,
        "entries": entries,
    })))
}
