//! Registry of live engine sessions, at most one per game.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::difficulty::{configuration_for, SearchBudget};
use crate::error::EngineError;
use crate::evaluation::SearchResult;
use crate::session::{EngineSession, SessionLifetime};

pub type GameId = i64;

/// Sessions keyed by game. Only the [`Supervisor`] touches it.
#[derive(Default)]
struct SessionRegistry {
    sessions: HashMap<GameId, Arc<EngineSession>>,
}

impl SessionRegistry {
    fn get(&self, game_id: GameId) -> Option<Arc<EngineSession>> {
        self.sessions.get(&game_id).cloned()
    }

    fn insert(&mut self, game_id: GameId, session: Arc<EngineSession>) -> Option<Arc<EngineSession>> {
        self.sessions.insert(game_id, session)
    }

    fn remove(&mut self, game_id: GameId) -> Option<Arc<EngineSession>> {
        self.sessions.remove(&game_id)
    }

    fn drain(&mut self) -> Vec<(GameId, Arc<EngineSession>)> {
        self.sessions.drain().collect()
    }
}

pub struct Supervisor {
    config: EngineConfig,
    registry: RwLock<SessionRegistry>,
}

impl Supervisor {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            registry: RwLock::new(SessionRegistry::default()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Start the engine for `game_id` at difficulty `level`, replacing any
    /// session the game already has.
    ///
    /// The new session is registered only after its handshake succeeded.
    pub async fn start(&self, game_id: GameId, level: u8) -> Result<(), EngineError> {
        let profile = configuration_for(level)?;

        let previous = self.registry.write().await.remove(game_id);
        if let Some(previous) = previous {
            warn!(game_id, "Engine session already running for game, replacing it");
            previous.kill().await;
        }

        let search_timeout =
            profile.budget.movetime.unwrap_or_default() + self.config.search_slack;
        let session = EngineSession::open(
            &self.config,
            SessionLifetime::Persistent(game_id),
            &profile.option_commands(),
            profile.budget,
            search_timeout,
        )
        .await?;

        let displaced = self
            .registry
            .write()
            .await
            .insert(game_id, Arc::new(session));
        if let Some(displaced) = displaced {
            warn!(game_id, "Concurrent start for game, killing the older session");
            displaced.kill().await;
        }

        info!(game_id, level, "Engine session started");
        Ok(())
    }

    /// Kill and unregister the session for `game_id`. No-op when there is none.
    pub async fn terminate(&self, game_id: GameId) {
        let removed = self.registry.write().await.remove(game_id);
        if let Some(session) = removed {
            session.kill().await;
            info!(game_id, "Engine session terminated");
        }
    }

    /// Run one search. Persistent sessions use their difficulty budget;
    /// transient ones get a fresh unthrottled process at the fixed analysis
    /// depth that is killed afterwards.
    pub async fn search(
        &self,
        lifetime: SessionLifetime,
        fen: &str,
    ) -> Result<SearchResult, EngineError> {
        match lifetime {
            SessionLifetime::Persistent(game_id) => {
                let session = self
                    .registry
                    .read()
                    .await
                    .get(game_id)
                    .ok_or(EngineError::SessionNotFound(game_id))?;
                match session.search(fen).await {
                    Err(EngineError::ProcessExited) if session.has_exited().await => {
                        let replacement = self.revive(game_id, &session).await?;
                        replacement.search(fen).await
                    }
                    result => result,
                }
            }
            SessionLifetime::Transient => {
                let session = EngineSession::open(
                    &self.config,
                    SessionLifetime::Transient,
                    &[],
                    SearchBudget::depth_only(self.config.analysis_depth),
                    self.config.analysis_timeout,
                )
                .await?;
                let result = session.search(fen).await;
                session.kill().await;
                result
            }
        }
    }

    /// Replace the dead session `dead` of `game_id` with a fresh process.
    /// Fails with [`EngineError::ProcessExited`] if the game was terminated or
    /// restarted in the meantime.
    async fn revive(
        &self,
        game_id: GameId,
        dead: &Arc<EngineSession>,
    ) -> Result<Arc<EngineSession>, EngineError> {
        let still_registered = |registry: &SessionRegistry| {
            registry
                .get(game_id)
                .is_some_and(|current| Arc::ptr_eq(&current, dead))
        };
        if !still_registered(&*self.registry.read().await) {
            return Err(EngineError::ProcessExited);
        }

        let fresh = Arc::new(dead.respawn(&self.config).await?);
        let mut registry = self.registry.write().await;
        if !still_registered(&*registry) {
            drop(registry);
            fresh.kill().await;
            return Err(EngineError::ProcessExited);
        }
        registry.insert(game_id, fresh.clone());
        warn!(game_id, "Engine process died, session replaced");
        Ok(fresh)
    }

    /// Engine reply for the live game `game_id` at position `fen`.
    pub async fn best_move(&self, game_id: GameId, fen: &str) -> Result<SearchResult, EngineError> {
        self.search(SessionLifetime::Persistent(game_id), fen).await
    }

    /// Deep analysis of an arbitrary position, independent of any game.
    pub async fn analyze_position(&self, fen: &str) -> Result<SearchResult, EngineError> {
        self.search(SessionLifetime::Transient, fen).await
    }

    pub async fn has_session(&self, game_id: GameId) -> bool {
        self.registry.read().await.get(game_id).is_some()
    }

    pub async fn live_sessions(&self) -> usize {
        self.registry.read().await.sessions.len()
    }

    /// Kill every live session.
    pub async fn shutdown_all(&self) {
        let sessions = self.registry.write().await.drain();
        for (game_id, session) in sessions {
            session.kill().await;
            info!(game_id, "Engine session shut down");
        }
    }

    #[cfg(test)]
    async fn session(&self, game_id: GameId) -> Option<Arc<EngineSession>> {
        self.registry.read().await.get(game_id)
    }
}
