use chess_core::{GameResult, GameStatus, Side};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool};

use crate::error::AppError;

const GAME_COLUMNS: &str =
    "id, human_color, difficulty, fen, moves, status, result, last_engine_move, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct GameRow {
    id: i64,
    human_color: String,
    difficulty: i16,
    fen: String,
    moves: Json<Vec<String>>,
    status: String,
    result: String,
    last_engine_move: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// A game against the engine.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: i64,
    pub human_color: Side,
    pub difficulty: u8,
    /// Current position
    pub fen: String,
    /// UCI moves from the initial position
    pub moves: Vec<String>,
    pub status: GameStatus,
    pub result: GameResult,
    pub last_engine_move: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<GameRow> for Game {
    type Error = AppError;

    fn try_from(row: GameRow) -> Result<Self, Self::Error> {
        Ok(Game {
            id: row.id,
            human_color: row.human_color.parse().map_err(AppError::Internal)?,
            difficulty: u8::try_from(row.difficulty)
                .map_err(|_| AppError::Internal(format!("Stored difficulty out of range: {}", row.difficulty)))?,
            fen: row.fen,
            moves: row.moves.0,
            status: row.status.parse().map_err(AppError::Internal)?,
            result: row.result.parse().map_err(AppError::Internal)?,
            last_engine_move: row.last_engine_move,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub async fn insert_game<'e, E: PgExecutor<'e>>(
    executor: E,
    human_color: Side,
    difficulty: u8,
    fen: &str,
) -> Result<Game, AppError> {
    let sql = format!(
        "INSERT INTO games (human_color, difficulty, fen) VALUES ($1, $2, $3) RETURNING {GAME_COLUMNS}"
    );
    let row: GameRow = sqlx::query_as(&sql)
        .bind(human_color.as_str())
        .bind(i16::from(difficulty))
        .bind(fen)
        .fetch_one(executor)
        .await
        .map_err(AppError::Sqlx)?;

    row.try_into()
}

pub async fn get_game(pool: &PgPool, game_id: i64) -> Result<Option<Game>, AppError> {
    let sql = format!("SELECT {GAME_COLUMNS} FROM games WHERE id = $1");
    let row: Option<GameRow> = sqlx::query_as(&sql)
        .bind(game_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Sqlx)?;

    row.map(Game::try_from).transpose()
}

pub async fn list_active_games(pool: &PgPool) -> Result<Vec<Game>, AppError> {
    let sql = format!("SELECT {GAME_COLUMNS} FROM games WHERE status = 'active' ORDER BY id");
    let rows: Vec<GameRow> = sqlx::query_as(&sql)
        .fetch_all(pool)
        .await
        .map_err(AppError::Sqlx)?;

    rows.into_iter().map(Game::try_from).collect()
}

/// Write position, move list, status, result and last engine move.
pub async fn save_game(pool: &PgPool, game: &Game) -> Result<(), AppError> {
    sqlx::query(
        r#"UPDATE games SET
            fen = $2,
            moves = $3,
            status = $4,
            result = $5,
            last_engine_move = $6,
            updated_at = NOW()
        WHERE id = $1"#,
    )
    .bind(game.id)
    .bind(&game.fen)
    .bind(Json(&game.moves))
    .bind(game.status.as_str())
    .bind(game.result.as_str())
    .bind(game.last_engine_move.as_deref())
    .execute(pool)
    .await
    .map_err(AppError::Sqlx)?;

    Ok(())
}

pub async fn set_status<'e, E: PgExecutor<'e>>(
    executor: E,
    game_id: i64,
    status: GameStatus,
) -> Result<(), AppError> {
    sqlx::query("UPDATE games SET status = $2, updated_at = NOW() WHERE id = $1")
        .bind(game_id)
        .bind(status.as_str())
        .execute(executor)
        .await
        .map_err(AppError::Sqlx)?;

    Ok(())
}

/// Games left `analyzing` by a previous process go back to `finished`.
/// Move a finished game to `analyzing`. Returns false when the game is not
/// finished, including when another analysis claimed it first.
pub async fn begin_analysis(pool: &PgPool, game_id: i64) -> Result<bool, AppError> {
    let result = sqlx::query(
        "UPDATE games SET status = 'analyzing', updated_at = NOW() WHERE id = $1 AND status = 'finished'",
    )
    .bind(game_id)
    .execute(pool)
    .await
    .map_err(AppError::Sqlx)?;

    Ok(result.rows_affected() == 1)
}

pub async fn reset_interrupted_analyses(pool: &PgPool) -> Result<u64, AppError> {
    let result = sqlx::query(
        "UPDATE games SET status = 'finished', updated_at = NOW() WHERE status = 'analyzing'",
    )
    .execute(pool)
    .await
    .map_err(AppError::Sqlx)?;

    Ok(result.rows_affected())
}
