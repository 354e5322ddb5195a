//! Common advantage scale for centipawn and mate evaluations.

use engine_session::Evaluation;

/// Value of delivering mate now. A mate in N scores `MATE_BONUS - N`.
pub const MATE_BONUS: i32 = 10_000;

/// Centipawn scores are capped below every mate score.
const MAX_CENTIPAWNS: i32 = 9_000;
const MAX_MATE_DISTANCE: u32 = 999;

/// Advantage to the side to move of the evaluated position.
pub fn advantage(eval: Evaluation) -> i32 {
    match eval {
        Evaluation::Centipawns(cp) => cp.clamp(-MAX_CENTIPAWNS, MAX_CENTIPAWNS),
        Evaluation::Mate(n) => {
            let distance = n.unsigned_abs().min(MAX_MATE_DISTANCE) as i32;
            if n > 0 {
                MATE_BONUS - distance
            } else {
                // mate 0: already mated
                -(MATE_BONUS - distance)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centipawns_pass_through() {
        assert_eq!(advantage(Evaluation::Centipawns(120)), 120);
        assert_eq!(advantage(Evaluation::Centipawns(-420)), -420);
        assert_eq!(advantage(Evaluation::Centipawns(50_000)), 9_000);
    }

    #[test]
    fn test_faster_mate_scores_higher() {
        for n in 1..200 {
            assert!(advantage(Evaluation::Mate(n)) > advantage(Evaluation::Mate(n + 1)));
            assert!(advantage(Evaluation::Mate(-n)) < advantage(Evaluation::Mate(-(n + 1))));
            assert!(
                advantage(Evaluation::Mate(-n)).abs() > advantage(Evaluation::Mate(-(n + 1))).abs()
            );
        }
    }

    #[test]
    fn test_mate_outranks_any_centipawn_score() {
        let strongest_cp = advantage(Evaluation::Centipawns(i32::MAX));
        let weakest_cp = advantage(Evaluation::Centipawns(i32::MIN));
        for n in [1, 10, 100, 999, 5_000] {
            assert!(advantage(Evaluation::Mate(n)) > strongest_cp);
            assert!(advantage(Evaluation::Mate(-n)) < weakest_cp);
        }
        assert_eq!(advantage(Evaluation::Mate(0)), -MATE_BONUS);
    }
}
