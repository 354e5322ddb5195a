use std::sync::Arc;

use axum::{extract::Path, Extension, Json};
use chess_core::Side;
use serde::Deserialize;

use crate::db::games::Game;
use crate::error::AppError;
use crate::play::PlayService;

#[derive(Deserialize)]
pub struct CreateGameRequest {
    pub color: Side,
    pub difficulty: u8,
}

#[derive(Deserialize)]
pub struct MoveRequest {
    #[serde(rename = "move")]
    pub mv: String,
}

/// POST /api/games
pub async fn create_game(
    Extension(play): Extension<Arc<PlayService>>,
    Json(body): Json<CreateGameRequest>,
) -> Result<Json<Game>, AppError> {
    let game = play.create_game(body.color, body.difficulty).await?;
    Ok(Json(game))
}

/// GET /api/games/{game_id}
pub async fn get_game(
    Extension(play): Extension<Arc<PlayService>>,
    Path(game_id): Path<i64>,
) -> Result<Json<Game>, AppError> {
    Ok(Json(play.get_game(game_id).await?))
}

/// POST /api/games/{game_id}/moves
pub async fn play_move(
    Extension(play): Extension<Arc<PlayService>>,
    Path(game_id): Path<i64>,
    Json(body): Json<MoveRequest>,
) -> Result<Json<Game>, AppError> {
    let mv = body.mv.trim();
    if mv.is_empty() {
        return Err(AppError::BadRequest("Move is required".into()));
    }
    Ok(Json(play.play_move(game_id, mv).await?))
}

/// POST /api/games/{game_id}/engine-move
pub async fn engine_move(
    Extension(play): Extension<Arc<PlayService>>,
    Path(game_id): Path<i64>,
) -> Result<Json<Game>, AppError> {
    Ok(Json(play.engine_move(game_id).await?))
}

/// POST /api/games/{game_id}/resign
pub async fn resign(
    Extension(play): Extension<Arc<PlayService>>,
    Path(game_id): Path<i64>,
) -> Result<Json<Game>, AppError> {
    Ok(Json(play.resign(game_id).await?))
}
