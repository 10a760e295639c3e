use crate::AppState;
use crate::api::error::AppError;
use crate::models::Video;
use crate::services::upload_service::UploadRequest;
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::StatusCode,
};
use futures::TryStreamExt;
use tokio_util::io::StreamReader;

/// Multipart field carrying the video bytes.
pub const VIDEO_FIELD: &str = "video";

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Request body exceeds the maximum allowed limit".to_string())
    } else {
        AppError::InvalidInput(e.body_text())
    }
}

fn field_error(e: MultipartError) -> std::io::Error {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        std::io::Error::other("length limit exceeded")
    } else {
        std::io::Error::other(e)
    }
}

#[utoipa::path(
    post,
    path = "/api/videos/{video_id}/upload",
    params(
        ("video_id" = String, Path, description = "Target video ID")
    ),
    request_body(content = Multipart, description = "MP4 video in the `video` field"),
    responses(
        (status = 200, description = "Video uploaded and record updated", body = Video),
        (status = 400, description = "Invalid ID or unsupported media type"),
        (status = 401, description = "Missing credential or not the video owner"),
        (status = 404, description = "Video not found"),
        (status = 413, description = "Video too large")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "videos"
)]
pub async fn upload_video(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(video_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<Video>, AppError> {
    let result: Result<Video, AppError> = async {
        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            if field.name() != Some(VIDEO_FIELD) {
                continue;
            }

            let content_type = field.content_type().map(|s| s.to_string());
            let body = StreamReader::new(field.map_err(field_error));

            return state
                .upload_service
                .ingest(UploadRequest {
                    video_id: video_id.clone(),
                    requester_id: claims.sub.clone(),
                    content_type,
                    body,
                })
                .await;
        }

        Err(AppError::InvalidInput(format!(
            "Missing '{}' form field",
            VIDEO_FIELD
        )))
    }
    .await;

    match result {
        Ok(video) => Ok(Json(video)),
        Err(e) => {
            // Drain what the client is still sending so it sees the error instead of a reset
            tracing::warn!("Upload of video {} failed: {}", video_id, e);
            while let Ok(Some(mut field)) = multipart.next_field().await {
                while let Ok(Some(_)) = field.chunk().await {}
            }
            Err(e)
        }
    }
}
