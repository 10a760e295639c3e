use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Video record owned by a user. The upload pipeline only ever sets `video_url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Video {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    pub fn new(id: String, user_id: String, title: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id,
            title,
            description: None,
            video_url: None,
            created_at: now,
            updated_at: now,
        }
    }
}
