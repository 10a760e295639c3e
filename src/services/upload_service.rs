use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::api::error::AppError;
use crate::config::UploadConfig;
use crate::models::Video;
use crate::services::aspect::classify;
use crate::services::keys::StorageKey;
use crate::services::media::MediaTools;
use crate::services::storage::ObjectStore;
use crate::services::videos::VideoRepository;

/// The only container accepted for upload.
pub const ACCEPTED_CONTENT_TYPE: &str = "video/mp4";

const STAGING_BUFFER_SIZE: usize = 64 * 1024;

/// A single inbound video upload.
pub struct UploadRequest<R> {
    pub video_id: String,
    pub requester_id: String,
    /// Media type declared on the multipart field
    pub content_type: Option<String>,
    pub body: R,
}

/// Runs validation, staging, probing, remuxing and storage for one upload.
///
/// Every staged file lives in a `tempfile` guard owned by [`ingest`](Self::ingest),
/// so all of them are gone once the call returns, whatever the outcome.
pub struct VideoUploadService {
    videos: Arc<dyn VideoRepository>,
    storage: Arc<dyn ObjectStore>,
    media: Arc<dyn MediaTools>,
    config: UploadConfig,
}

impl VideoUploadService {
    pub fn new(
        videos: Arc<dyn VideoRepository>,
        storage: Arc<dyn ObjectStore>,
        media: Arc<dyn MediaTools>,
        config: UploadConfig,
    ) -> Self {
        Self {
            videos,
            storage,
            media,
            config,
        }
    }

    /// Whether ffprobe and ffmpeg can be invoked.
    pub async fn media_tools_available(&self) -> bool {
        self.media.health_check().await
    }

    /// Accepts `video/mp4` (parameters allowed); nothing else. Bytes are not sniffed.
    pub fn validate_content_type(content_type: Option<&str>) -> Result<mime::Mime, AppError> {
        let declared = content_type
            .ok_or_else(|| AppError::InvalidInput("Missing content type".to_string()))?;

        let parsed: mime::Mime = declared.parse().map_err(|_| {
            AppError::InvalidInput("Unsupported media type. Only MP4 is allowed.".to_string())
        })?;

        if parsed.essence_str() != ACCEPTED_CONTENT_TYPE {
            return Err(AppError::InvalidInput(
                "Unsupported media type. Only MP4 is allowed.".to_string(),
            ));
        }

        Ok(parsed)
    }

    /// Loads the target video and checks that `requester_id` owns it.
    pub async fn authorize(&self, video_id: &str, requester_id: &str) -> Result<Video, AppError> {
        let video = self
            .videos
            .get(video_id)
            .await
            .map_err(|e| AppError::RecordStore(format!("get {}: {}", video_id, e)))?
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

        if video.user_id != requester_id {
            warn!(
                "User {} attempted to upload to video {} owned by {}",
                requester_id,
                video_id,
                video.user_id
            );
            return Err(AppError::Unauthorized(
                "You do not own this video".to_string(),
            ));
        }

        Ok(video)
    }

    pub async fn ingest<R>(&self, request: UploadRequest<R>) -> Result<Video, AppError>
    where
        R: AsyncRead + Send,
    {
        let UploadRequest {
            video_id,
            requester_id,
            content_type,
            body,
        } = request;

        // 1. Cheap checks first: nothing touches disk until these pass
        let media_type = Self::validate_content_type(content_type.as_deref())?;
        Uuid::parse_str(&video_id).map_err(|_| AppError::InvalidInput("Invalid ID".to_string()))?;
        let mut video = self.authorize(&video_id, &requester_id).await?;

        info!("📥 Uploading video {} by user {}", video_id, requester_id);

        // 2. Stage the complete body; the tools need a seekable file
        let staged = self.stage(body).await?;

        // 3. Inspect and classify
        let geometry = self.media.probe(staged.path()).await?;
        if geometry.width == 0 || geometry.height == 0 {
            return Err(AppError::UpstreamTool(format!(
                "invalid video dimensions {}x{}",
                geometry.width, geometry.height
            )));
        }
        let orientation = classify(geometry.width, geometry.height);
        debug!(
            "Video {} is {}x{} ({})",
            video_id, geometry.width, geometry.height, orientation
        );

        // 4. Fast-start copy; from here on only the remuxed file is used
        let remuxed = self.media.remux(staged.path()).await?;

        // 5. Upload from the start of the remuxed file
        let key = StorageKey::generate(orientation).to_string();
        let mut upload = tokio::fs::File::open(&remuxed).await?;
        upload.rewind().await?;

        self.storage
            .put_object(&key, media_type.essence_str(), upload)
            .await
            .map_err(|e| AppError::Storage(format!("put {}: {}", key, e)))?;

        let video_url = self.storage.object_url(&key);
        info!("☁️  Stored video {} at {}", video_id, key);

        // 6. Point the record at the new object
        video.video_url = Some(video_url);
        if let Err(e) = self.videos.update(&video).await {
            error!(
                "🧟 Orphaned object '{}': upload succeeded but updating video {} failed: {}",
                key, video_id, e
            );
            return Err(AppError::RecordStore(format!("update {}: {}", video_id, e)));
        }

        // The update is committed; a failed read-back must not fail the upload
        let updated = match self.videos.get(&video_id).await {
            Ok(Some(stored)) => stored,
            Ok(None) => video,
            Err(e) => {
                warn!("Could not reload video {} after update: {}", video_id, e);
                video
            }
        };

        info!("✅ Video {} available at {:?}", video_id, updated.video_url);
        Ok(updated)
        // `remuxed` and `staged` are removed here
    }

    /// Copies the body into a fresh staging file, enforcing the size ceiling as bytes arrive.
    async fn stage<R>(&self, body: R) -> Result<NamedTempFile, AppError>
    where
        R: AsyncRead + Send,
    {
        tokio::pin!(body);

        let staged = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(".mp4")
            .tempfile_in(&self.config.staging_dir)?;
        let mut file = tokio::fs::File::from_std(staged.reopen()?);

        let limit = self.config.max_upload_size as u64;
        let mut buffer = vec![0u8; STAGING_BUFFER_SIZE];
        let mut total_size: u64 = 0;

        loop {
            let n = body.read(&mut buffer).await.map_err(body_read_error)?;
            if n == 0 {
                break;
            }

            total_size += n as u64;
            if total_size > limit {
                return Err(AppError::PayloadTooLarge(format!(
                    "Video exceeds the {} byte limit",
                    limit
                )));
            }

            file.write_all(&buffer[..n]).await?;
        }

        file.flush().await?;
        file.sync_all().await?;

        debug!(
            "Staged {} bytes at {}",
            total_size,
            staged.path().display()
        );
        Ok(staged)
    }
}

fn body_read_error(e: std::io::Error) -> AppError {
    let err_msg = e.to_string();
    if err_msg.contains("length limit exceeded") {
        AppError::PayloadTooLarge("Request body exceeds the maximum allowed limit".to_string())
    } else {
        AppError::InvalidInput(format!("Could not read upload: {}", err_msg))
    }
}
