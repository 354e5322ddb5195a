use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chess_core::RulesError;
use engine_session::EngineError;
use game_review::ReviewError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    EngineUnavailable(String),

    #[error("{0}")]
    EngineTimeout(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl From<RulesError> for AppError {
    fn from(e: RulesError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl From<EngineError> for AppError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::InvalidDifficulty(_) => AppError::BadRequest(e.to_string()),
            EngineError::SessionNotFound(_) => AppError::Conflict(e.to_string()),
            EngineError::InitFailed | EngineError::ProcessExited => {
                AppError::EngineUnavailable(e.to_string())
            }
            EngineError::Timeout { .. } | EngineError::SearchTimeout => {
                AppError::EngineTimeout("Engine did not respond in time".to_string())
            }
            EngineError::MalformedResponse(_) | EngineError::Io(_) => {
                tracing::error!("Engine error: {e}");
                AppError::Internal("Engine error".to_string())
            }
        }
    }
}

impl From<ReviewError> for AppError {
    fn from(e: ReviewError) -> Self {
        match e {
            ReviewError::GameNotFound(_) => AppError::NotFound("Game not found".to_string()),
            ReviewError::NotFinished(_) => AppError::BadRequest(e.to_string()),
            ReviewError::AlreadyAnalyzing(_) => AppError::Conflict(e.to_string()),
            ReviewError::ReplayCorruption { .. } => AppError::Internal(e.to_string()),
            ReviewError::Engine(engine) => engine.into(),
            ReviewError::Store(msg) => {
                tracing::error!("Storage error during analysis: {msg}");
                AppError::Internal("Database error".to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::EngineUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            AppError::EngineTimeout(msg) => (StatusCode::GATEWAY_TIMEOUT, msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            AppError::Sqlx(e) => {
                tracing::error!("Database error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
            AppError::Anyhow(e) => {
                tracing::error!("Unexpected error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        (status, Json(json!({ "detail": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(e: AppError) -> StatusCode {
        e.into_response().status()
    }

    #[test]
    fn test_engine_errors_map_to_status() {
        assert_eq!(status_of(EngineError::InvalidDifficulty(0).into()), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(EngineError::InitFailed.into()), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status_of(EngineError::SearchTimeout.into()), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(status_of(EngineError::SessionNotFound(3).into()), StatusCode::CONFLICT);
    }

    #[test]
    fn test_engine_diagnostics_are_not_echoed() {
        let err: AppError = EngineError::MalformedResponse("bestmove garbage".into()).into();
        assert!(!err.to_string().contains("garbage"));
    }

    #[test]
    fn test_review_errors_map_to_status() {
        assert_eq!(status_of(ReviewError::GameNotFound(1).into()), StatusCode::NOT_FOUND);
        assert_eq!(status_of(ReviewError::AlreadyAnalyzing(1).into()), StatusCode::CONFLICT);
        assert_eq!(
            status_of(ReviewError::Engine(EngineError::ProcessExited).into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(RulesError::IllegalMove("e2e5".into()).into()),
            StatusCode::BAD_REQUEST
        );
    }
}
