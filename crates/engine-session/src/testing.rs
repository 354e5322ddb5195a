//! Scripted stand-in engines for tests, run through `sh -c`.

use std::time::Duration;

use crate::config::EngineConfig;

/// Answers the handshake and every `go` with two info lines and a bestmove.
pub(crate) const RESPONSIVE: &str = r#"while IFS= read -r line; do
  case "$line" in
    uci) echo "id name FakeFish"; echo "uciok" ;;
    isready) echo "readyok" ;;
    go*) echo "info depth 1 score cp 20 pv e2e4"; echo "info depth 2 score cp 31 pv e2e4 e7e5"; echo "bestmove e2e4 ponder e7e5" ;;
    quit) exit 0 ;;
  esac
done"#;

/// Never answers anything.
pub(crate) const SILENT: &str = r#"while IFS= read -r line; do :; done"#;

/// Only produces a bestmove once told to `stop`.
pub(crate) const ANSWERS_ON_STOP: &str = r#"while IFS= read -r line; do
  case "$line" in
    uci) echo "uciok" ;;
    isready) echo "readyok" ;;
    go*) echo "info depth 1 score cp 5 pv d2d4" ;;
    stop) echo "bestmove d2d4" ;;
  esac
done"#;

/// Ignores `stop` during its first search and prints that search's bestmove
/// 600ms late; later searches answer at once.
pub(crate) const LATE_BESTMOVE: &str = r#"searches=0
while IFS= read -r line; do
  case "$line" in
    uci) echo "uciok" ;;
    isready) echo "readyok" ;;
    go*)
      searches=$((searches + 1))
      if [ "$searches" -eq 1 ]; then
        (sleep 0.6; echo "bestmove a2a3") &
      else
        echo "info depth 5 score cp 18 pv e2e4 c7c5"; echo "bestmove e2e4"
      fi ;;
  esac
done"#;

/// Completes the handshake but ignores searches and `stop`.
pub(crate) const NEVER_MOVES: &str = r#"while IFS= read -r line; do
  case "$line" in
    uci) echo "uciok" ;;
    isready) echo "readyok" ;;
  esac
done"#;

pub(crate) fn engine_config(script: &str) -> EngineConfig {
    EngineConfig {
        path: "sh".to_string(),
        args: vec!["-c".to_string(), script.to_string()],
        handshake_timeout: Duration::from_millis(500),
        search_slack: Duration::from_millis(100),
        stop_grace: Duration::from_millis(300),
        analysis_depth: 20,
        analysis_timeout: Duration::from_secs(2),
    }
}
