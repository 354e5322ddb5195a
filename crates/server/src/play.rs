//! Live play: human moves, engine replies, game lifecycle.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chess_core::{apply_move, side_to_move, GameOverKind, GameResult, GameStatus, MoveOutcome, Side, START_FEN};
use engine_session::{configuration_for, Supervisor};
use sqlx::PgPool;
use tracing::{debug, error, info, warn};

use crate::broadcast::{BroadcastHub, GameUpdate};
use crate::db::games::{self, Game};
use crate::error::AppError;

/// One async lock per game so a game's read-modify-write cycles never overlap.
#[derive(Default)]
struct GameLocks {
    locks: Mutex<HashMap<i64, Arc<tokio::sync::Mutex<()>>>>,
}

impl GameLocks {
    fn for_game(&self, game_id: i64) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(game_id).or_default().clone()
    }

    fn release(&self, game_id: i64) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.remove(&game_id);
    }
}

/// Apply an accepted move to the in-memory game, ending it if the move did.
fn record_move(game: &mut Game, mv: &str, outcome: MoveOutcome, by_engine: bool) {
    game.moves.push(mv.to_string());
    game.fen = outcome.fen;
    if by_engine {
        game.last_engine_move = Some(mv.to_string());
    }

    match outcome.game_over {
        GameOverKind::Checkmate => {
            game.status = GameStatus::Finished;
            game.result = GameResult::win_for(outcome.turn.opponent());
        }
        GameOverKind::Draw => {
            game.status = GameStatus::Finished;
            game.result = GameResult::Draw;
        }
        GameOverKind::None => {}
    }
}

fn ensure_active(game: &Game) -> Result<(), AppError> {
    if game.status != GameStatus::Active {
        return Err(AppError::Conflict("Game is not active".into()));
    }
    Ok(())
}

pub struct PlayService {
    pool: PgPool,
    supervisor: Arc<Supervisor>,
    hub: Arc<BroadcastHub>,
    locks: GameLocks,
}

impl PlayService {
    pub fn new(pool: PgPool, supervisor: Arc<Supervisor>, hub: Arc<BroadcastHub>) -> Self {
        Self {
            pool,
            supervisor,
            hub,
            locks: GameLocks::default(),
        }
    }

    pub async fn get_game(&self, game_id: i64) -> Result<Game, AppError> {
        games::get_game(&self.pool, game_id)
            .await?
            .ok_or(AppError::NotFound("Game not found".into()))
    }

    /// Create a game and start its engine. Nothing is stored if the engine
    /// cannot be started. When the human plays black the engine moves first.
    pub async fn create_game(&self, human_color: Side, difficulty: u8) -> Result<Game, AppError> {
        configuration_for(difficulty)?;

        let mut tx = self.pool.begin().await.map_err(AppError::Sqlx)?;
        let mut game = games::insert_game(&mut *tx, human_color, difficulty, START_FEN).await?;

        self.supervisor.start(game.id, difficulty).await?;

        if let Err(e) = tx.commit().await {
            self.supervisor.terminate(game.id).await;
            return Err(AppError::Sqlx(e));
        }

        info!(game_id = game.id, %human_color, difficulty, "Game created");
        self.hub.publish(GameUpdate::from(&game));

        if human_color == Side::Black {
            let lock = self.locks.for_game(game.id);
            let _guard = lock.lock().await;
            if let Err(e) = self.engine_turn(&mut game).await {
                warn!(game_id = game.id, error = %e, "Opening engine move failed");
            }
        }

        Ok(game)
    }

    /// Play the human's move and, if the game goes on, the engine's reply.
    ///
    /// An illegal move leaves the game untouched. If the engine fails after
    /// the human move was stored, the game waits on the engine's turn.
    pub async fn play_move(&self, game_id: i64, uci: &str) -> Result<Game, AppError> {
        let lock = self.locks.for_game(game_id);
        let _guard = lock.lock().await;

        let mut game = self.get_game(game_id).await?;
        ensure_active(&game)?;
        if side_to_move(&game.fen)? != game.human_color {
            return Err(AppError::Conflict("It is the engine's turn".into()));
        }

        let outcome = apply_move(&game.fen, uci)?;
        debug!(game_id, mv = uci, san = %outcome.san, "Human move");
        self.commit_move(&mut game, uci, outcome, false).await?;

        if game.status == GameStatus::Active {
            self.engine_turn(&mut game).await?;
        }

        Ok(game)
    }

    /// Retry the engine's move for a game waiting on it.
    pub async fn engine_move(&self, game_id: i64) -> Result<Game, AppError> {
        let lock = self.locks.for_game(game_id);
        let _guard = lock.lock().await;

        let mut game = self.get_game(game_id).await?;
        ensure_active(&game)?;
        if side_to_move(&game.fen)? == game.human_color {
            return Err(AppError::Conflict("It is your turn".into()));
        }

        self.engine_turn(&mut game).await?;
        Ok(game)
    }

    pub async fn resign(&self, game_id: i64) -> Result<Game, AppError> {
        let lock = self.locks.for_game(game_id);
        let _guard = lock.lock().await;

        let mut game = self.get_game(game_id).await?;
        ensure_active(&game)?;

        game.status = GameStatus::Finished;
        game.result = GameResult::win_for(game.human_color.opponent());
        games::save_game(&self.pool, &game).await?;
        self.hub.publish(GameUpdate::from(&game));

        info!(game_id, "Human resigned");
        self.end_game(game_id).await;
        Ok(game)
    }

    /// Restart engines for games that were active when the server stopped.
    pub async fn resume_active_games(&self) -> Result<usize, AppError> {
        let active = games::list_active_games(&self.pool).await?;
        let mut resumed = 0;

        for mut game in active {
            if let Err(e) = self.supervisor.start(game.id, game.difficulty).await {
                warn!(game_id = game.id, error = %e, "Could not resume engine session");
                continue;
            }
            resumed += 1;

            let engine_to_move = side_to_move(&game.fen).map(|side| side != game.human_color);
            if matches!(engine_to_move, Ok(true)) {
                let lock = self.locks.for_game(game.id);
                let _guard = lock.lock().await;
                if let Err(e) = self.engine_turn(&mut game).await {
                    warn!(game_id = game.id, error = %e, "Pending engine move failed");
                }
            }
        }

        Ok(resumed)
    }

    async fn engine_turn(&self, game: &mut Game) -> Result<(), AppError> {
        let search = self.supervisor.best_move(game.id, &game.fen).await?;

        let outcome = apply_move(&game.fen, &search.best_move).map_err(|e| {
            error!(
                game_id = game.id,
                best_move = %search.best_move,
                fen = %game.fen,
                error = %e,
                "Engine proposed an illegal move"
            );
            AppError::Internal("Engine proposed an illegal move".into())
        })?;

        debug!(
            game_id = game.id,
            mv = %search.best_move,
            evaluation = ?search.evaluation,
            "Engine move"
        );
        self.commit_move(game, &search.best_move, outcome, true).await
    }

    /// Persist and broadcast one ply; tear the engine down if it ended the game.
    async fn commit_move(
        &self,
        game: &mut Game,
        mv: &str,
        outcome: MoveOutcome,
        by_engine: bool,
    ) -> Result<(), AppError> {
        record_move(game, mv, outcome, by_engine);
        games::save_game(&self.pool, game).await?;
        self.hub.publish(GameUpdate::from(&*game));

        if game.status == GameStatus::Finished {
            info!(game_id = game.id, result = %game.result, "Game over");
            self.end_game(game.id).await;
        }
        Ok(())
    }

    async fn end_game(&self, game_id: i64) {
        self.supervisor.terminate(game_id).await;
        self.locks.release(game_id);
    }
}
