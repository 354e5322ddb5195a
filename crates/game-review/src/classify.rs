//! Move-quality classification: pure functions only
//! (no engine, board or storage access)

use engine_session::Evaluation;

use crate::scale::{advantage, MATE_BONUS};

/// Advantage lost, in centipawn-equivalent units
const BLUNDER_THRESHOLD: i32 = 300;
const MISTAKE_THRESHOLD: i32 = 150;

/// State of the game right after a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostMove {
    /// The mover delivered mate
    Checkmate,
    Draw,
    /// Engine evaluation, from the opponent's viewpoint (they are to move)
    Evaluated(Evaluation),
}

impl PostMove {
    /// Evaluation from the viewpoint of the side now to move. Decided
    /// positions are synthesized: mated, or level.
    pub fn evaluation(self) -> Evaluation {
        match self {
            PostMove::Checkmate => Evaluation::Mate(0),
            PostMove::Draw => Evaluation::Centipawns(0),
            PostMove::Evaluated(eval) => eval,
        }
    }

    /// Advantage to the side that just moved.
    pub fn mover_advantage(self) -> i32 {
        match self {
            PostMove::Checkmate => MATE_BONUS,
            PostMove::Draw => 0,
            PostMove::Evaluated(eval) => -advantage(eval),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Verdict {
    pub is_mistake: bool,
    pub is_blunder: bool,
    pub missed_mate: bool,
}

impl Verdict {
    pub fn comment(&self, best_move: &str) -> String {
        if self.is_blunder {
            format!("Blunder. Best was {best_move}.")
        } else if self.missed_mate {
            format!("Missed a forced mate. Best was {best_move}.")
        } else if self.is_mistake {
            format!("Mistake. Best was {best_move}.")
        } else {
            String::new()
        }
    }
}

/// Classify a move given the evaluation before it (mover's viewpoint) and
/// what followed it.
///
/// Giving up a winning forced mate for a position without any mate is a
/// mistake however large the numeric drop. Mating moves are never flagged.
pub fn classify(before: Evaluation, after: PostMove) -> Verdict {
    if after == PostMove::Checkmate {
        return Verdict::default();
    }

    let had_mate = matches!(before, Evaluation::Mate(n) if n > 0);
    let lost_all_mates = matches!(after, PostMove::Evaluated(Evaluation::Centipawns(_)));
    if had_mate && lost_all_mates {
        return Verdict {
            is_mistake: true,
            is_blunder: false,
            missed_mate: true,
        };
    }

    let drop = advantage(before) - after.mover_advantage();
    let is_blunder = drop > BLUNDER_THRESHOLD;
    Verdict {
        is_mistake: !is_blunder && drop > MISTAKE_THRESHOLD,
        is_blunder,
        missed_mate: false,
    }
}
