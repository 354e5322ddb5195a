//! Engine evaluation and search result types

use serde::{Deserialize, Serialize};

/// A position evaluation, always relative to the side to move in the
/// evaluated position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum Evaluation {
    /// Centipawns, positive = side to move is better
    #[serde(rename = "cp")]
    Centipawns(i32),
    /// Forced mate in N moves (not plies); positive = side to move mates,
    /// negative or zero = side to move is mated
    #[serde(rename = "mate")]
    Mate(i32),
}

impl Evaluation {
    /// Build from the `score cp`/`score mate` pair of an info line.
    pub fn from_uci_score(cp: Option<i32>, mate: Option<i32>) -> Option<Self> {
        match (mate, cp) {
            (Some(m), _) => Some(Evaluation::Mate(m)),
            (None, Some(c)) => Some(Evaluation::Centipawns(c)),
            (None, None) => None,
        }
    }

    /// The same evaluation seen from the other side.
    pub fn flip(self) -> Self {
        match self {
            Evaluation::Centipawns(cp) => Evaluation::Centipawns(-cp),
            Evaluation::Mate(m) => Evaluation::Mate(-m),
        }
    }

    pub fn is_mate(&self) -> bool {
        matches!(self, Evaluation::Mate(_))
    }
}

/// Outcome of one engine search. Produced once per `go`, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub best_move: String,
    pub ponder_move: Option<String>,
    pub evaluation: Evaluation,
    /// Space separated UCI moves
    pub principal_variation: String,
}
