use chess_core::Side;
use engine_session::Evaluation;
use serde::{Deserialize, Serialize};

/// Review of one ply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisEntry {
    /// Full-move number of the position the move was played from
    pub move_number: u32,
    /// The side that played the move
    pub side_to_move: Side,
    #[serde(rename = "move")]
    pub mv: String,
    /// Position after the move
    pub fen: String,
    /// Engine evaluation before the move, from the mover's viewpoint
    pub eval_before: Evaluation,
    /// Engine recommendation for the position before the move; empty when the
    /// position was already decided
    pub best_move: String,
    pub is_mistake: bool,
    pub is_blunder: bool,
    pub comment: String,
}

/// Entries as persisted. `complete` is false when replay aborted part way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAnalysis {
    pub entries: Vec<AnalysisEntry>,
    pub complete: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_json_shape() {
        let entry = AnalysisEntry {
            move_number: 1,
            side_to_move: Side::White,
            mv: "e2e4".to_string(),
            fen: "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1".to_string(),
            eval_before: Evaluation::Centipawns(30),
            best_move: "e2e4".to_string(),
            is_mistake: false,
            is_blunder: false,
            comment: String::new(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["moveNumber"], 1);
        assert_eq!(json["sideToMove"], "white");
        assert_eq!(json["move"], "e2e4");
        assert_eq!(json["evalBefore"]["kind"], "cp");
        assert_eq!(json["isBlunder"], false);
    }
}
