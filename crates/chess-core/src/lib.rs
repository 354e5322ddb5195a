//! Chess rules adapter and shared game record types.
//!
//! Move legality, game-over detection and FEN bookkeeping are delegated to
//! `shakmaty`; this crate only exposes the narrow surface the engine and
//! review crates consume.

pub mod game_data;
pub mod rules;

pub use game_data::{GameResult, GameStatus, Side};
pub use rules::{
    apply_move, fullmove_number, game_over, replay, side_to_move, GameOverKind, MoveOutcome,
    RulesError, START_FEN,
};
