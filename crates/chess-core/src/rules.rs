//! Rules-engine adapter: apply a UCI move to a FEN position.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, EnPassantMode, Position};
use thiserror::Error;

use crate::game_data::Side;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Plies without a capture or pawn move after which the game is drawn.
const FIFTY_MOVE_PLIES: u32 = 100;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RulesError {
    #[error("Invalid FEN: {0}")]
    InvalidFen(String),

    #[error("Invalid move syntax: {0}")]
    InvalidMoveSyntax(String),

    #[error("Illegal move: {0}")]
    IllegalMove(String),
}

/// Why a position ends the game, if it does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameOverKind {
    None,
    Checkmate,
    Draw,
}

/// Result of applying one legal move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Position after the move.
    pub fen: String,
    /// The move in SAN, with check/mate suffix.
    pub san: String,
    /// Side to move in the resulting position.
    pub turn: Side,
    pub game_over: GameOverKind,
}

fn parse_position(fen: &str) -> Result<Chess, RulesError> {
    let parsed = Fen::from_str(fen).map_err(|e| RulesError::InvalidFen(format!("{fen}: {e}")))?;
    parsed
        .into_position::<Chess>(CastlingMode::Standard)
        .map_err(|e| RulesError::InvalidFen(format!("{fen}: {e}")))
}

fn game_over_kind(pos: &Chess) -> GameOverKind {
    if pos.is_checkmate() {
        GameOverKind::Checkmate
    } else if pos.is_stalemate()
        || pos.is_insufficient_material()
        || pos.halfmoves() >= FIFTY_MOVE_PLIES
    {
        GameOverKind::Draw
    } else {
        GameOverKind::None
    }
}

/// Apply `uci` to the position `fen`.
///
/// Illegal or malformed moves are rejected without side effects; the caller's
/// position string is never modified.
pub fn apply_move(fen: &str, uci: &str) -> Result<MoveOutcome, RulesError> {
    let mut pos = parse_position(fen)?;

    let uci_move =
        UciMove::from_str(uci).map_err(|_| RulesError::InvalidMoveSyntax(uci.to_string()))?;
    let mv = uci_move
        .to_move(&pos)
        .map_err(|_| RulesError::IllegalMove(uci.to_string()))?;

    let san = SanPlus::from_move_and_play_unchecked(&mut pos, mv);

    Ok(MoveOutcome {
        fen: Fen::from_position(&pos, EnPassantMode::Legal).to_string(),
        san: san.to_string(),
        turn: pos.turn().into(),
        game_over: game_over_kind(&pos),
    })
}

/// Side to move in `fen`.
pub fn side_to_move(fen: &str) -> Result<Side, RulesError> {
    Ok(parse_position(fen)?.turn().into())
}

/// Full-move counter of `fen` (starts at 1, incremented after black moves).
pub fn fullmove_number(fen: &str) -> Result<u32, RulesError> {
    Ok(parse_position(fen)?.fullmoves().get())
}

/// Game-over state of `fen` itself.
pub fn game_over(fen: &str) -> Result<GameOverKind, RulesError> {
    Ok(game_over_kind(&parse_position(fen)?))
}

/// Replay `moves` from the initial position and return the final FEN.
pub fn replay(moves: &[String]) -> Result<String, RulesError> {
    moves
        .iter()
        .try_fold(START_FEN.to_string(), |fen, mv| -> Result<String, RulesError> {
            Ok(apply_move(&fen, mv)?.fen)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moves(list: &[&str]) -> Vec<String> {
        list.iter().map(|m| m.to_string()).collect()
    }

    #[test]
    fn test_apply_opening_move() {
        let outcome = apply_move(START_FEN, "e2e4").unwrap();
        assert_eq!(outcome.san, "e4");
        assert_eq!(outcome.turn, Side::Black);
        assert_eq!(outcome.game_over, GameOverKind::None);
        assert!(outcome.fen.starts_with("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b"));
    }

    #[test]
    fn test_illegal_move_rejected() {
        assert_eq!(
            apply_move(START_FEN, "e2e5"),
            Err(RulesError::IllegalMove("e2e5".to_string()))
        );
        assert!(matches!(
            apply_move(START_FEN, "zz99"),
            Err(RulesError::InvalidMoveSyntax(_))
        ));
        assert!(matches!(
            apply_move("not a fen", "e2e4"),
            Err(RulesError::InvalidFen(_))
        ));
    }

    #[test]
    fn test_fools_mate_is_checkmate() {
        let fen = replay(&moves(&["f2f3", "e7e5", "g2g4"])).unwrap();
        let outcome = apply_move(&fen, "d8h4").unwrap();
        assert_eq!(outcome.game_over, GameOverKind::Checkmate);
        assert_eq!(outcome.san, "Qh4#");
        assert_eq!(outcome.turn, Side::White);
    }

    #[test]
    fn test_stalemate_is_draw() {
        // Black king on a8, white queen to b6 stalemates.
        let fen = "k7/8/8/2Q5/8/8/8/7K w - - 0 1";
        let outcome = apply_move(fen, "c5b6").unwrap();
        assert_eq!(outcome.game_over, GameOverKind::Draw);
    }

    #[test]
    fn test_fifty_move_rule_is_draw() {
        let fen = "k7/8/8/8/8/8/1R6/7K w - - 99 80";
        let outcome = apply_move(fen, "b2c2").unwrap();
        assert_eq!(outcome.game_over, GameOverKind::Draw);
    }

    #[test]
    fn test_replay_matches_incremental_application() {
        let line = moves(&["e2e4", "e7e5", "g1f3", "b8c6", "f1b5", "a7a6"]);
        let mut fen = START_FEN.to_string();
        for mv in &line {
            fen = apply_move(&fen, mv).unwrap().fen;
        }
        assert_eq!(replay(&line).unwrap(), fen);
        assert_eq!(replay(&[]).unwrap(), START_FEN);
    }

    #[test]
    fn test_position_queries() {
        assert_eq!(side_to_move(START_FEN).unwrap(), Side::White);
        assert_eq!(fullmove_number(START_FEN).unwrap(), 1);
        let after = replay(&moves(&["e2e4", "e7e5"])).unwrap();
        assert_eq!(fullmove_number(&after).unwrap(), 2);
        assert_eq!(game_over(START_FEN).unwrap(), GameOverKind::None);
    }
}
