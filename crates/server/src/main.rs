use std::sync::Arc;

use kibitz_server::broadcast::BroadcastHub;
use kibitz_server::config;
use kibitz_server::db;
use kibitz_server::play::PlayService;
use kibitz_server::routes;
use kibitz_server::store::PgGameStore;

use anyhow::Context;
use axum::{routing::{get, post}, Extension, Router};
use engine_session::Supervisor;
use game_review::GameReviewer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env()?;

    tracing::info!("Connecting to database...");
    let pool = db::pool::create_pool(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Running migrations...");
    db::pool::run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;

    match db::games::reset_interrupted_analyses(&pool).await {
        Ok(0) => {}
        Ok(n) => tracing::warn!("Reset {n} games left mid-analysis"),
        Err(e) => tracing::warn!("Failed to reset interrupted analyses: {e}"),
    }

    tracing::info!(engine = %config.engine.path, "Engine configured");
    let supervisor = Arc::new(Supervisor::new(config.engine.clone()));
    let hub = Arc::new(BroadcastHub::new());
    let play = Arc::new(PlayService::new(pool.clone(), supervisor.clone(), hub.clone()));
    let reviewer = Arc::new(GameReviewer::new(
        Arc::new(PgGameStore::new(pool.clone())),
        supervisor.clone(),
    ));

    // Bring back engines for games interrupted by a restart
    tokio::spawn({
        let play = play.clone();
        async move {
            match play.resume_active_games().await {
                Ok(0) => {}
                Ok(n) => tracing::info!("Resumed {n} active games"),
                Err(e) => tracing::warn!("Failed to resume active games: {e}"),
            }
        }
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api/games", post(routes::games::create_game))
        .route("/api/games/{game_id}", get(routes::games::get_game))
        .route("/api/games/{game_id}/moves", post(routes::games::play_move))
        .route("/api/games/{game_id}/engine-move", post(routes::games::engine_move))
        .route("/api/games/{game_id}/resign", post(routes::games::resign))
        .route(
            "/api/games/{game_id}/analysis",
            get(routes::analysis::get_analysis).post(routes::analysis::run_analysis),
        )
        .route("/api/games/{game_id}/ws", get(routes::ws::ws_handler))
        // Shared state
        .layer(Extension(pool))
        .layer(Extension(supervisor.clone()))
        .layer(Extension(hub))
        .layer(Extension(play))
        .layer(Extension(reviewer))
        .layer(CompressionLayer::new())
        .layer(cors);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Shutting down engine sessions");
    supervisor.shutdown_all().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
