//! Engine configuration from environment variables

use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Path to the UCI engine binary
    pub path: String,

    /// Extra arguments passed to the engine binary
    pub args: Vec<String>,

    /// Deadline for each awaited handshake step (`uciok`, `readyok`)
    pub handshake_timeout: Duration,

    /// Added to a difficulty level's move-time ceiling to form the live search deadline
    pub search_slack: Duration,

    /// How long to wait for `bestmove` after sending `stop`
    pub stop_grace: Duration,

    /// Fixed depth for one-off positional analysis
    pub analysis_depth: u32,

    /// Deadline for one-off positional analysis searches
    pub analysis_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path: "stockfish".to_string(),
            args: Vec::new(),
            handshake_timeout: Duration::from_millis(10_000),
            search_slack: Duration::from_millis(5_000),
            stop_grace: Duration::from_millis(500),
            analysis_depth: 20,
            analysis_timeout: Duration::from_millis(60_000),
        }
    }
}

fn env_millis(key: &str, default: Duration) -> Duration {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            path: env::var("ENGINE_PATH").unwrap_or(defaults.path),
            args: env::var("ENGINE_ARGS")
                .map(|v| v.split_whitespace().map(String::from).collect())
                .unwrap_or_default(),
            handshake_timeout: env_millis("ENGINE_HANDSHAKE_TIMEOUT_MS", defaults.handshake_timeout),
            search_slack: env_millis("ENGINE_SEARCH_SLACK_MS", defaults.search_slack),
            stop_grace: env_millis("ENGINE_STOP_GRACE_MS", defaults.stop_grace),
            analysis_depth: env::var("ANALYSIS_DEPTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.analysis_depth),
            analysis_timeout: env_millis("ANALYSIS_TIMEOUT_MS", defaults.analysis_timeout),
        }
    }
}
