use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::Video;

/// Store holding video records. Both calls are fail-fast; nothing retries.
#[async_trait]
pub trait VideoRepository: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<Video>>;
    async fn update(&self, video: &Video) -> Result<()>;
}

pub struct SqliteVideoRepository {
    pool: SqlitePool,
}

impl SqliteVideoRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, video: &Video) -> Result<()> {
        sqlx::query(
            "INSERT INTO videos (id, user_id, title, description, video_url, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&video.id)
        .bind(&video.user_id)
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.video_url)
        .bind(video.created_at)
        .bind(video.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl VideoRepository for SqliteVideoRepository {
    async fn get(&self, id: &str) -> Result<Option<Video>> {
        let video = sqlx::query_as::<_, Video>(
            "SELECT id, user_id, title, description, video_url, created_at, updated_at \
             FROM videos WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(video)
    }

    async fn update(&self, video: &Video) -> Result<()> {
        let res = sqlx::query(
            "UPDATE videos SET title = ?, description = ?, video_url = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.video_url)
        .bind(Utc::now())
        .bind(&video.id)
        .execute(&self.pool)
        .await?;

        if res.rows_affected() == 0 {
            anyhow::bail!("video {} no longer exists", video.id);
        }
        Ok(())
    }
}
