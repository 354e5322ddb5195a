//! One engine process: spawn, UCI handshake, searches, kill.

use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::difficulty::SearchBudget;
use crate::error::EngineError;
use crate::evaluation::SearchResult;
use crate::parser::SearchScanner;
use crate::supervisor::GameId;
use crate::transceiver::Transceiver;

/// Whether a session serves a live game or a single analysis request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionLifetime {
    /// Registered under a game and reused for every engine move.
    Persistent(GameId),
    /// Spawned for one search and killed right after.
    Transient,
}

pub struct EngineSession {
    lifetime: SessionLifetime,
    /// Held for a whole request, so requests on one process never interleave.
    transceiver: Mutex<Transceiver<ChildStdin>>,
    /// Separate from the transceiver so a kill can interrupt a running search.
    child: Mutex<Child>,
    /// Kept so a dead process can be respawned with the same configuration.
    options: Vec<String>,
    budget: SearchBudget,
    search_timeout: Duration,
    stop_grace: Duration,
    sync_timeout: Duration,
    /// Set when a search was abandoned and a late `bestmove` may still arrive.
    desynced: AtomicBool,
}

fn spawn_engine(config: &EngineConfig) -> std::io::Result<Child> {
    Command::new(&config.path)
        .args(&config.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
}

async fn handshake(
    transceiver: &mut Transceiver<ChildStdin>,
    options: &[String],
    timeout: Duration,
) -> Result<(), EngineError> {
    transceiver.send("uci", "uciok", timeout).await?;
    for option in options {
        transceiver.write(option).await?;
    }
    transceiver.send("isready", "readyok", timeout).await?;
    transceiver.write("ucinewgame").await?;
    transceiver.send("isready", "readyok", timeout).await?;
    Ok(())
}

impl EngineSession {
    /// Spawn an engine and run the handshake, writing `options` between
    /// `uciok` and the first `readyok`.
    ///
    /// Every failure is logged with its cause and reported as
    /// [`EngineError::InitFailed`]; the process is killed before returning.
    pub async fn open(
        config: &EngineConfig,
        lifetime: SessionLifetime,
        options: &[String],
        budget: SearchBudget,
        search_timeout: Duration,
    ) -> Result<Self, EngineError> {
        let mut child = spawn_engine(config).map_err(|e| {
            error!(path = %config.path, error = %e, "Failed to spawn engine");
            EngineError::InitFailed
        })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            error!(?lifetime, "Engine pipes unavailable");
            let _ = child.kill().await;
            return Err(EngineError::InitFailed);
        };
        let mut transceiver = Transceiver::attach(stdin, stdout, child.stderr.take());

        if let Err(e) = handshake(&mut transceiver, options, config.handshake_timeout).await {
            error!(?lifetime, error = %e, "Engine handshake failed");
            if let Err(kill_err) = child.kill().await {
                warn!(?lifetime, error = %kill_err, "Failed to kill engine after handshake failure");
            }
            return Err(EngineError::InitFailed);
        }

        debug!(?lifetime, pid = ?child.id(), "Engine ready");

        Ok(Self {
            lifetime,
            transceiver: Mutex::new(transceiver),
            child: Mutex::new(child),
            options: options.to_vec(),
            budget,
            search_timeout,
            stop_grace: config.stop_grace,
            sync_timeout: config.handshake_timeout,
            desynced: AtomicBool::new(false),
        })
    }

    pub fn lifetime(&self) -> SessionLifetime {
        self.lifetime
    }

    pub fn budget(&self) -> SearchBudget {
        self.budget
    }

    /// Search `fen` with this session's budget.
    ///
    /// When the deadline passes, `stop` is sent and the engine gets the
    /// grace window to produce its `bestmove`; only then does the search fail
    /// with [`EngineError::SearchTimeout`]. The process stays alive either way.
    pub async fn search(&self, fen: &str) -> Result<SearchResult, EngineError> {
        let mut transceiver = self.transceiver.lock().await;

        if self.desynced.load(Ordering::Acquire) {
            self.resync(&mut transceiver).await?;
        }

        transceiver.write(&format!("position fen {fen}")).await?;

        let mut scanner = SearchScanner::new();
        let go = self.budget.go_command();
        let resolved = transceiver
            .exchange(&go, self.search_timeout, |line| scanner.feed(line))
            .await?;

        if !resolved {
            warn!(lifetime = ?self.lifetime, fen, "Search deadline passed, sending stop");
            transceiver.write("stop").await?;
            let grace = Instant::now() + self.stop_grace;
            let late = transceiver
                .collect_until(grace, |line| scanner.feed(line))
                .await?;
            if !late {
                self.desynced.store(true, Ordering::Release);
                return Err(EngineError::SearchTimeout);
            }
            info!(lifetime = ?self.lifetime, "Engine answered within stop grace");
        }

        scanner.finish()
    }

    /// Wait out a search abandoned by an earlier timeout.
    ///
    /// Engines answer `isready` even mid-search, so the abandoned `bestmove`
    /// has to be read first. An engine that never
    /// produces it is killed and the search fails with
    /// [`EngineError::ProcessExited`].
    async fn resync(&self, transceiver: &mut Transceiver<ChildStdin>) -> Result<(), EngineError> {
        transceiver.write("stop").await?;
        let deadline = Instant::now() + self.sync_timeout;
        let finished = transceiver
            .collect_until(deadline, |line| line.starts_with("bestmove"))
            .await?;
        if !finished {
            warn!(lifetime = ?self.lifetime, "Abandoned search never finished, killing engine");
            self.kill().await;
            return Err(EngineError::ProcessExited);
        }

        transceiver
            .send("isready", "readyok", self.sync_timeout)
            .await?;
        self.desynced.store(false, Ordering::Release);
        debug!(lifetime = ?self.lifetime, "Engine back in sync");
        Ok(())
    }

    /// Spawn a fresh process with this session's options and budget.
    pub async fn respawn(&self, config: &EngineConfig) -> Result<Self, EngineError> {
        Self::open(
            config,
            self.lifetime,
            &self.options,
            self.budget,
            self.search_timeout,
        )
        .await
    }

    /// Kill the process. Safe to call more than once and while a search is
    /// running; the search then fails with [`EngineError::ProcessExited`].
    pub async fn kill(&self) {
        let mut child = self.child.lock().await;
        if let Err(e) = child.kill().await {
            debug!(lifetime = ?self.lifetime, error = %e, "Engine kill failed");
        }
    }

    pub async fn has_exited(&self) -> bool {
        let mut child = self.child.lock().await;
        !matches!(child.try_wait(), Ok(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::Evaluation;
    use crate::testing::{engine_config, ANSWERS_ON_STOP, LATE_BESTMOVE, NEVER_MOVES, RESPONSIVE};

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[tokio::test]
    async fn test_open_search_kill() {
        let config = engine_config(RESPONSIVE);
        let session = EngineSession::open(
            &config,
            SessionLifetime::Transient,
            &[],
            SearchBudget::depth_only(3),
            Duration::from_secs(2),
        )
        .await
        .unwrap();

        let result = session.search(START).await.unwrap();
        assert_eq!(result.best_move, "e2e4");
        assert_eq!(result.ponder_move.as_deref(), Some("e7e5"));
        assert_eq!(result.evaluation, Evaluation::Centipawns(31));
        assert_eq!(result.principal_variation, "e2e4 e7e5");

        assert!(!session.has_exited().await);
        session.kill().await;
        session.kill().await;
        assert!(session.has_exited().await);
    }

    #[tokio::test]
    async fn test_answer_within_grace_is_honored() {
        let config = engine_config(ANSWERS_ON_STOP);
        let session = EngineSession::open(
            &config,
            SessionLifetime::Persistent(7),
            &[],
            SearchBudget::depth_only(30),
            Duration::from_millis(100),
        )
        .await
        .unwrap();

        let result = session.search(START).await.unwrap();
        assert_eq!(result.best_move, "d2d4");
        assert_eq!(result.evaluation, Evaluation::Centipawns(5));
        session.kill().await;
    }

    #[tokio::test]
    async fn test_late_bestmove_is_not_taken_for_next_search() {
        let config = engine_config(LATE_BESTMOVE);
        let session = EngineSession::open(
            &config,
            SessionLifetime::Persistent(1),
            &[],
            SearchBudget::depth_only(20),
            Duration::from_millis(100),
        )
        .await
        .unwrap();

        let err = session.search("8/8/8/4k3/8/8/8/4K3 w - - 0 1").await.unwrap_err();
        assert!(matches!(err, EngineError::SearchTimeout));

        let result = session.search(START).await.unwrap();
        assert_eq!(result.best_move, "e2e4");
        assert_eq!(result.evaluation, Evaluation::Centipawns(18));
        assert!(!session.has_exited().await);
        session.kill().await;
    }

    #[tokio::test]
    async fn test_engine_stuck_in_abandoned_search_is_killed() {
        let config = engine_config(NEVER_MOVES);
        let session = EngineSession::open(
            &config,
            SessionLifetime::Persistent(2),
            &[],
            SearchBudget::depth_only(20),
            Duration::from_millis(100),
        )
        .await
        .unwrap();

        assert!(matches!(session.search(START).await, Err(EngineError::SearchTimeout)));
        assert!(matches!(session.search(START).await, Err(EngineError::ProcessExited)));
        assert!(session.has_exited().await);
    }

    #[tokio::test]
    async fn test_missing_binary_is_init_failure() {
        let mut config = engine_config(RESPONSIVE);
        config.path = "/nonexistent/engine-binary".to_string();
        let err = EngineSession::open(
            &config,
            SessionLifetime::Transient,
            &[],
            SearchBudget::depth_only(1),
            Duration::from_secs(1),
        )
        .await
        .err()
        .unwrap();
        assert!(matches!(err, EngineError::InitFailed));
    }
}
