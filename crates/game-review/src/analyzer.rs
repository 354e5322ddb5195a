use async_trait::async_trait;
use engine_session::{EngineError, SearchResult, Supervisor};

/// Deep evaluation of an arbitrary position.
#[async_trait]
pub trait PositionAnalyzer: Send + Sync {
    async fn analyze(&self, fen: &str) -> Result<SearchResult, EngineError>;
}

/// Each call runs on a fresh transient engine, never on a live game's session.
#[async_trait]
impl PositionAnalyzer for Supervisor {
    async fn analyze(&self, fen: &str) -> Result<SearchResult, EngineError> {
        self.analyze_position(fen).await
    }
}
