use crate::AppState;
use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when uploads cannot currently succeed
    pub status: String,
    pub database: String,
    /// Whether ffprobe/ffmpeg run from the configured paths
    pub media_tools: String,
    pub max_upload_size: usize,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Ingest service health", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_ok = sqlx::query("SELECT 1").execute(&state.db).await.is_ok();
    let tools_ok = state.upload_service.media_tools_available().await;

    Json(HealthResponse {
        status: if db_ok && tools_ok { "ok" } else { "degraded" }.to_string(),
        database: if db_ok { "connected" } else { "disconnected" }.to_string(),
        media_tools: if tools_ok { "available" } else { "unavailable" }.to_string(),
        max_upload_size: state.config.max_upload_size,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
