//! Incremental parsing of UCI search output.
//!
//! Engines print many `info` progress lines per search; only the most recent
//! scored one matters. [`SearchScanner`] is fed one line at a time and keeps
//! that single record plus the final `bestmove`, so nothing is re-scanned as
//! output accumulates.

use crate::error::EngineError;
use crate::evaluation::{Evaluation, SearchResult};

/// A scored `info` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressLine {
    pub depth: u32,
    pub evaluation: Evaluation,
    /// Space separated UCI moves, empty if the line had no `pv`
    pub pv: String,
}

/// The terminating `bestmove <move> [ponder <move>]` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestMove {
    pub mv: String,
    pub ponder: Option<String>,
}

/// Parse an `info ... depth D ... score (cp|mate) V ... pv ...` line.
///
/// Lines without depth or score (`currmove` updates, `info string`) and
/// bound-only scores (`lowerbound`/`upperbound`) are not progress records.
pub fn parse_progress(line: &str) -> Option<ProgressLine> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.first() != Some(&"info") {
        return None;
    }

    let mut depth: Option<u32> = None;
    let mut cp: Option<i32> = None;
    let mut mate: Option<i32> = None;
    let mut pv = String::new();

    let mut i = 1;
    while i < parts.len() {
        match parts[i] {
            "string" => return None,
            "depth" => {
                depth = parts.get(i + 1).and_then(|s| s.parse().ok());
                i += 1;
            }
            "score" => {
                match parts.get(i + 1).copied() {
                    Some("cp") => cp = parts.get(i + 2).and_then(|s| s.parse().ok()),
                    Some("mate") => mate = parts.get(i + 2).and_then(|s| s.parse().ok()),
                    _ => {}
                }
                i += 2;
            }
            "lowerbound" | "upperbound" => return None,
            "pv" => {
                pv = parts[i + 1..].join(" ");
                break;
            }
            _ => {}
        }
        i += 1;
    }

    Some(ProgressLine {
        depth: depth?,
        evaluation: Evaluation::from_uci_score(cp, mate)?,
        pv,
    })
}

/// Parse a `bestmove` line, with or without a ponder suggestion.
pub fn parse_best_move(line: &str) -> Option<BestMove> {
    let mut parts = line.split_whitespace();
    if parts.next() != Some("bestmove") {
        return None;
    }
    let mv = parts.next()?.to_string();
    let ponder = match parts.next() {
        Some("ponder") => parts.next().map(String::from),
        _ => None,
    };
    Some(BestMove { mv, ponder })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    AwaitingOutput,
    Progress,
    Resolved,
}

/// Line-at-a-time state machine for one in-flight search.
#[derive(Debug)]
pub struct SearchScanner {
    state: ScanState,
    latest: Option<ProgressLine>,
    best: Option<BestMove>,
}

impl Default for SearchScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchScanner {
    pub fn new() -> Self {
        Self {
            state: ScanState::AwaitingOutput,
            latest: None,
            best: None,
        }
    }

    /// Consume one output line. Returns `true` once `bestmove` has been seen;
    /// later lines are ignored.
    pub fn feed(&mut self, line: &str) -> bool {
        if self.state == ScanState::Resolved {
            return true;
        }
        if let Some(best) = parse_best_move(line) {
            self.best = Some(best);
            self.state = ScanState::Resolved;
            return true;
        }
        if let Some(progress) = parse_progress(line) {
            self.latest = Some(progress);
            self.state = ScanState::Progress;
        }
        false
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn latest(&self) -> Option<&ProgressLine> {
        self.latest.as_ref()
    }

    /// Build the result of a resolved search.
    ///
    /// A search that ends without any scored progress line (forced or
    /// immediate result) is reported as a level position with an empty line.
    pub fn finish(self) -> Result<SearchResult, EngineError> {
        let best = self
            .best
            .ok_or_else(|| EngineError::MalformedResponse("search ended without bestmove".into()))?;

        if best.mv == "(none)" || best.mv == "0000" {
            return Err(EngineError::MalformedResponse(
                "engine reported no legal move".into(),
            ));
        }

        let (evaluation, principal_variation) = match self.latest {
            Some(progress) => (progress.evaluation, progress.pv),
            None => (Evaluation::Centipawns(0), String::new()),
        };

        Ok(SearchResult {
            best_move: best.mv,
            ponder_move: best.ponder,
            evaluation,
            principal_variation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_progress_centipawn() {
        let line = "info depth 20 seldepth 25 multipv 1 score cp 35 nodes 100000 nps 900000 pv e2e4 e7e5 g1f3";
        let progress = parse_progress(line).unwrap();
        assert_eq!(progress.depth, 20);
        assert_eq!(progress.evaluation, Evaluation::Centipawns(35));
        assert_eq!(progress.pv, "e2e4 e7e5 g1f3");
    }

    #[test]
    fn test_parse_progress_mate_negative() {
        let progress = parse_progress("info depth 12 score mate -3 nodes 10000 pv g8f6 d1h5").unwrap();
        assert_eq!(progress.evaluation, Evaluation::Mate(-3));
        assert_eq!(progress.pv, "g8f6 d1h5");
    }

    #[test]
    fn test_parse_progress_rejects_non_records() {
        assert!(parse_progress("info depth 10 currmove e2e4 currmovenumber 1").is_none());
        assert!(parse_progress("info string NNUE evaluation using nn.nnue").is_none());
        assert!(parse_progress("info depth 14 score cp 40 lowerbound nodes 1 pv e2e4").is_none());
        assert!(parse_progress("info score cp 35 pv e2e4").is_none());
        assert!(parse_progress("bestmove e2e4").is_none());
    }

    #[test]
    fn test_parse_progress_without_pv() {
        let progress = parse_progress("info depth 5 score cp 0 nodes 1000").unwrap();
        assert!(progress.pv.is_empty());
    }

    #[test]
    fn test_parse_best_move_with_and_without_ponder() {
        assert_eq!(
            parse_best_move("bestmove e2e4 ponder e7e5"),
            Some(BestMove { mv: "e2e4".into(), ponder: Some("e7e5".into()) })
        );
        assert_eq!(
            parse_best_move("bestmove a7a8q"),
            Some(BestMove { mv: "a7a8q".into(), ponder: None })
        );
        assert_eq!(parse_best_move("bestmove"), None);
        assert_eq!(parse_best_move("info depth 1"), None);
    }

    #[test]
    fn test_scanner_keeps_only_latest_progress() {
        let mut scanner = SearchScanner::new();
        assert_eq!(scanner.state(), ScanState::AwaitingOutput);
        assert!(!scanner.feed("info depth 1 score cp 10 pv d2d4"));
        assert!(!scanner.feed("info depth 2 score cp 25 pv e2e4 e7e5"));
        assert!(!scanner.feed("info depth 3 currmove e2e4 currmovenumber 1"));
        assert_eq!(scanner.state(), ScanState::Progress);
        assert_eq!(scanner.latest().unwrap().depth, 2);
        assert!(scanner.feed("bestmove e2e4 ponder e7e5"));
        assert!(scanner.feed("info depth 9 score cp 999 pv a2a3"));

        let result = scanner.finish().unwrap();
        assert_eq!(result.best_move, "e2e4");
        assert_eq!(result.ponder_move.as_deref(), Some("e7e5"));
        assert_eq!(result.evaluation, Evaluation::Centipawns(25));
        assert_eq!(result.principal_variation, "e2e4 e7e5");
    }

    #[test]
    fn test_scanner_resolves_on_bestmove_alone() {
        let mut scanner = SearchScanner::new();
        assert!(scanner.feed("bestmove h5f7"));
        let result = scanner.finish().unwrap();
        assert_eq!(result.best_move, "h5f7");
        assert_eq!(result.evaluation, Evaluation::Centipawns(0));
        assert!(result.principal_variation.is_empty());
    }

    #[test]
    fn test_scanner_unresolved_or_no_move() {
        let mut scanner = SearchScanner::new();
        scanner.feed("info depth 1 score cp 5 pv e2e4");
        assert!(matches!(scanner.finish(), Err(EngineError::MalformedResponse(_))));

        let mut scanner = SearchScanner::new();
        scanner.feed("bestmove (none)");
        assert!(matches!(scanner.finish(), Err(EngineError::MalformedResponse(_))));
    }
}
