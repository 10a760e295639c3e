use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

pub async fn setup_database() -> anyhow::Result<SqlitePool> {
    let db_url = env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://videos.db".to_string());

    info!("📂 Database: {}", db_url);

    let options = SqliteConnectOptions::from_str(&db_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect_with(options)
        .await?;

    info!("✅ Database connected successfully");

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Single-connection in-memory database, so every query sees the same schema.
pub async fn connect_in_memory() -> anyhow::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
    info!("🔄 Running auto-migrations...");

    let stmts = [
        (
            "videos",
            "CREATE TABLE IF NOT EXISTS videos (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT,
                video_url TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        ),
        (
            "idx_videos_user_id",
            "CREATE INDEX IF NOT EXISTS idx_videos_user_id ON videos(user_id)",
        ),
    ];

    for (name, stmt) in stmts {
        sqlx::query(stmt).execute(pool).await?;
        info!("   - '{}' checked/created", name);
    }

    Ok(())
}
