//! WebSocket feed of game state updates.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path,
    },
    response::Response,
    Extension,
};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tracing::debug;

use crate::broadcast::{BroadcastHub, GameUpdate};
use crate::error::AppError;
use crate::play::PlayService;

/// GET /api/games/{game_id}/ws
///
/// Sends the current state on connect, then every update until either side
/// closes.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(game_id): Path<i64>,
    Extension(play): Extension<Arc<PlayService>>,
    Extension(hub): Extension<Arc<BroadcastHub>>,
) -> Result<Response, AppError> {
    // subscribe before reading so no update falls between the two
    let updates = hub.subscribe(game_id);
    let game = match play.get_game(game_id).await {
        Ok(game) => game,
        Err(e) => {
            drop(updates);
            hub.release(game_id);
            return Err(e);
        }
    };
    let initial = GameUpdate::from(&game);

    Ok(ws.on_upgrade(move |socket| async move {
        handle_socket(socket, updates, initial).await;
        hub.release(game_id);
    }))
}

async fn handle_socket(
    socket: WebSocket,
    mut updates: broadcast::Receiver<GameUpdate>,
    initial: GameUpdate,
) {
    let game_id = initial.game_id;
    let (mut sender, mut receiver) = socket.split();

    if send_update(&mut sender, &initial).await.is_err() {
        return;
    }
    debug!(game_id, "Viewer connected");

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(update) => {
                    if send_update(&mut sender, &update).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(game_id, skipped, "Viewer fell behind");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    debug!(game_id, "Viewer disconnected");
}

async fn send_update(
    sender: &mut SplitSink<WebSocket, Message>,
    update: &GameUpdate,
) -> anyhow::Result<()> {
    let json = serde_json::to_string(update)?;
    sender.send(Message::Text(json.into())).await?;
    Ok(())
}
