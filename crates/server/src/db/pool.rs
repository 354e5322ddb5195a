use sqlx::postgres::{PgPool, PgPoolOptions};

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Run the full Postgres schema migration inline.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;
    Ok(())
}

const SCHEMA_SQL: &str = r#"
-- Games played against the engine
CREATE TABLE IF NOT EXISTS games (
    id               BIGSERIAL PRIMARY KEY,
    human_color      TEXT NOT NULL,
    difficulty       SMALLINT NOT NULL,
    fen              TEXT NOT NULL,
    moves            JSONB NOT NULL DEFAULT '[]'::jsonb,
    status           TEXT NOT NULL DEFAULT 'active',
    result           TEXT NOT NULL DEFAULT '*',
    last_engine_move TEXT,
    created_at       TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at       TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_games_status ON games (status);

-- Post-game review, one row per game
CREATE TABLE IF NOT EXISTS game_analysis (
    id         BIGSERIAL PRIMARY KEY,
    game_id    BIGINT NOT NULL UNIQUE REFERENCES games(id) ON DELETE CASCADE,
    entries    JSONB NOT NULL,
    complete   BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
"#;
