//! Replays a finished game and builds its review.

use std::sync::Arc;

use chess_core::{apply_move, fullmove_number, GameOverKind, GameStatus, Side, START_FEN};
use engine_session::Evaluation;
use tracing::{error, info, warn};

use crate::analyzer::PositionAnalyzer;
use crate::classify::{classify, PostMove, Verdict};
use crate::entry::AnalysisEntry;
use crate::error::ReviewError;
use crate::store::{GameStore, ReviewGame};

pub struct GameReviewer {
    store: Arc<dyn GameStore>,
    analyzer: Arc<dyn PositionAnalyzer>,
}

impl GameReviewer {
    pub fn new(store: Arc<dyn GameStore>, analyzer: Arc<dyn PositionAnalyzer>) -> Self {
        Self { store, analyzer }
    }

    /// Review a finished game, or return its existing complete review.
    ///
    /// The game is `analyzing` while this runs and `finished` again afterwards,
    /// whether or not the review succeeded. A replay failure stores the
    /// entries produced so far as an incomplete review.
    pub async fn analyze(&self, game_id: i64) -> Result<Vec<AnalysisEntry>, ReviewError> {
        let game = self
            .store
            .load_game(game_id)
            .await?
            .ok_or(ReviewError::GameNotFound(game_id))?;

        if let Some(existing) = self.store.load_analysis(game_id).await? {
            if existing.complete {
                info!(game_id, "Returning existing analysis");
                return Ok(existing.entries);
            }
        }

        match game.status {
            GameStatus::Finished => {}
            GameStatus::Analyzing => return Err(ReviewError::AlreadyAnalyzing(game_id)),
            GameStatus::Active => return Err(ReviewError::NotFinished(game_id)),
        }

        if !self.store.begin_analysis(game_id).await? {
            return Err(ReviewError::AlreadyAnalyzing(game_id));
        }
        info!(game_id, plies = game.moves.len(), "Starting game analysis");

        let mut entries = Vec::with_capacity(game.moves.len());
        match self.review_moves(&game, &mut entries).await {
            Ok(()) => {
                self.store.save_analysis(game_id, &entries, true).await?;
                info!(
                    game_id,
                    mistakes = entries.iter().filter(|e| e.is_mistake).count(),
                    blunders = entries.iter().filter(|e| e.is_blunder).count(),
                    "Game analysis complete"
                );
                Ok(entries)
            }
            Err(e @ ReviewError::ReplayCorruption { .. }) => {
                if let Err(save_err) = self.store.save_analysis(game_id, &entries, false).await {
                    error!(game_id, error = %save_err, "Failed to store partial analysis");
                }
                Err(e)
            }
            Err(e) => {
                warn!(game_id, error = %e, "Game analysis failed");
                if let Err(restore_err) = self.store.set_status(game_id, GameStatus::Finished).await {
                    error!(game_id, error = %restore_err, "Failed to restore game status");
                }
                Err(e)
            }
        }
    }

    /// Walk the move list, appending one entry per ply.
    async fn review_moves(
        &self,
        game: &ReviewGame,
        entries: &mut Vec<AnalysisEntry>,
    ) -> Result<(), ReviewError> {
        let mut fen = START_FEN.to_string();

        let baseline = self.analyzer.analyze(&fen).await?;
        let mut eval_before = baseline.evaluation;
        let mut best_move = baseline.best_move;

        for (ply, mv) in game.moves.iter().enumerate() {
            let corrupt = |e: chess_core::RulesError| {
                error!(game_id = game.id, ply, mv = %mv, error = %e, "Recorded move cannot be replayed");
                ReviewError::ReplayCorruption {
                    ply,
                    mv: mv.clone(),
                }
            };

            let move_number = fullmove_number(&fen).map_err(corrupt)?;
            let outcome = apply_move(&fen, mv).map_err(corrupt)?;
            let mover = outcome.turn.opponent();

            let (after, next_best) = match outcome.game_over {
                GameOverKind::Checkmate => (PostMove::Checkmate, String::new()),
                GameOverKind::Draw => (PostMove::Draw, String::new()),
                GameOverKind::None => {
                    let result = self.analyzer.analyze(&outcome.fen).await?;
                    (PostMove::Evaluated(result.evaluation), result.best_move)
                }
            };

            let verdict = if mover == game.human_color {
                classify(eval_before, after)
            } else {
                Verdict::default()
            };

            entries.push(entry(move_number, mover, mv, &outcome.fen, eval_before, &best_move, verdict));

            eval_before = after.evaluation();
            best_move = next_best;
            fen = outcome.fen;
        }

        Ok(())
    }
}

fn entry(
    move_number: u32,
    mover: Side,
    mv: &str,
    fen: &str,
    eval_before: Evaluation,
    best_move: &str,
    verdict: Verdict,
) -> AnalysisEntry {
    AnalysisEntry {
        move_number,
        side_to_move: mover,
        mv: mv.to_string(),
        fen: fen.to_string(),
        eval_before,
        best_move: best_move.to_string(),
        is_mistake: verdict.is_mistake,
        is_blunder: verdict.is_blunder,
        comment: verdict.comment(best_move),
    }
}
