#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tempfile::{TempDir, TempPath};
use tokio::io::AsyncReadExt;
use video_ingest::config::UploadConfig;
use video_ingest::infrastructure::database;
use video_ingest::models::Video;
use video_ingest::services::media::{MediaError, MediaGeometry, MediaTools, parse_probe_output};
use video_ingest::services::storage::{ObjectStore, build_object_url};
use video_ingest::services::upload_service::VideoUploadService;
use video_ingest::services::videos::{SqliteVideoRepository, VideoRepository};

pub const OWNER_ID: &str = "user-owner";
pub const CDN_HOST: &str = "d111111abcdef8.cloudfront.net";
pub const REMUX_MARKER: &[u8] = b"FASTSTART:";

pub fn probe_json(width: u32, height: u32) -> String {
    format!(
        r#"{{"streams":[{{"index":0,"codec_type":"video","codec_name":"h264","width":{},"height":{}}},{{"index":1,"codec_type":"audio","codec_name":"aac"}}]}}"#,
        width, height
    )
}

/// Stands in for ffprobe/ffmpeg. Probing parses canned ffprobe output; remuxing
/// prefixes the input with [`REMUX_MARKER`].
pub struct FakeMediaTools {
    pub probe_output: String,
    pub probe_timeout: AtomicBool,
    pub slow_probe: AtomicBool,
    pub fail_remux: AtomicBool,
    pub tools_available: AtomicBool,
    pub probe_calls: AtomicUsize,
    pub remux_calls: AtomicUsize,
}

impl FakeMediaTools {
    pub fn new(probe_output: String) -> Self {
        Self {
            probe_output,
            probe_timeout: AtomicBool::new(false),
            slow_probe: AtomicBool::new(false),
            fail_remux: AtomicBool::new(false),
            tools_available: AtomicBool::new(true),
            probe_calls: AtomicUsize::new(0),
            remux_calls: AtomicUsize::new(0),
        }
    }

    pub fn geometry(width: u32, height: u32) -> Self {
        Self::new(probe_json(width, height))
    }
}

#[async_trait]
impl MediaTools for FakeMediaTools {
    async fn probe(&self, path: &Path) -> Result<MediaGeometry, MediaError> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        assert!(path.exists(), "probe called on a missing file");

        if self.probe_timeout.load(Ordering::SeqCst) {
            return Err(MediaError::Timeout {
                tool: "ffprobe".to_string(),
                secs: 1,
            });
        }
        if self.slow_probe.load(Ordering::SeqCst) {
            tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        }
        parse_probe_output(self.probe_output.as_bytes())
    }

    async fn remux(&self, path: &Path) -> Result<TempPath, MediaError> {
        self.remux_calls.fetch_add(1, Ordering::SeqCst);

        let dir = path.parent().unwrap();
        let output = tempfile::Builder::new()
            .prefix("faststart-")
            .suffix(".mp4")
            .tempfile_in(dir)
            .map_err(MediaError::Staging)?
            .into_temp_path();

        if self.fail_remux.load(Ordering::SeqCst) {
            return Err(MediaError::Spawn {
                tool: "ffmpeg".to_string(),
                source: std::io::Error::other("ffmpeg exploded"),
            });
        }

        let mut data = REMUX_MARKER.to_vec();
        data.extend(std::fs::read(path).map_err(MediaError::Staging)?);
        std::fs::write(&output, data).map_err(MediaError::Staging)?;
        Ok(output)
    }

    async fn health_check(&self) -> bool {
        self.tools_available.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub content_type: String,
    pub data: Vec<u8>,
}

pub struct MemoryObjectStore {
    pub objects: Mutex<HashMap<String, StoredObject>>,
    pub fail_puts: AtomicBool,
    pub put_calls: AtomicUsize,
    base_url: String,
}

impl MemoryObjectStore {
    pub fn new(base_url: &str) -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            fail_puts: AtomicBool::new(false),
            put_calls: AtomicUsize::new(0),
            base_url: base_url.to_string(),
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put_object(
        &self,
        key: &str,
        content_type: &str,
        mut file: tokio::fs::File,
    ) -> anyhow::Result<()> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_puts.load(Ordering::SeqCst) {
            anyhow::bail!("503 SlowDown");
        }

        let mut data = Vec::new();
        file.read_to_end(&mut data).await?;
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                content_type: content_type.to_string(),
                data,
            },
        );
        Ok(())
    }

    fn object_url(&self, key: &str) -> String {
        build_object_url(&self.base_url, key)
    }
}

/// Reads from SQLite but refuses every update.
pub struct FailingUpdates(pub Arc<SqliteVideoRepository>);

#[async_trait]
impl VideoRepository for FailingUpdates {
    async fn get(&self, id: &str) -> anyhow::Result<Option<Video>> {
        self.0.get(id).await
    }

    async fn update(&self, _video: &Video) -> anyhow::Result<()> {
        anyhow::bail!("database is locked")
    }
}

/// Serves the first read from SQLite and fails every read after it.
pub struct FailingReloads {
    pub inner: Arc<SqliteVideoRepository>,
    reads: AtomicUsize,
}

impl FailingReloads {
    pub fn new(inner: Arc<SqliteVideoRepository>) -> Self {
        Self {
            inner,
            reads: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl VideoRepository for FailingReloads {
    async fn get(&self, id: &str) -> anyhow::Result<Option<Video>> {
        if self.reads.fetch_add(1, Ordering::SeqCst) > 0 {
            anyhow::bail!("connection pool timed out");
        }
        self.inner.get(id).await
    }

    async fn update(&self, video: &Video) -> anyhow::Result<()> {
        self.inner.update(video).await
    }
}

pub struct Harness {
    pub staging: TempDir,
    pub repo: Arc<SqliteVideoRepository>,
    pub store: Arc<MemoryObjectStore>,
    pub media: Arc<FakeMediaTools>,
    pub config: UploadConfig,
    pub video: Video,
    pub pool: sqlx::SqlitePool,
}

impl Harness {
    pub async fn new(media: FakeMediaTools) -> Self {
        let staging = tempfile::tempdir().unwrap();
        let pool = database::connect_in_memory().await.unwrap();
        let repo = Arc::new(SqliteVideoRepository::new(pool.clone()));

        let video = Video::new(
            uuid::Uuid::new_v4().to_string(),
            OWNER_ID.to_string(),
            "Boot.dev beats".to_string(),
        );
        repo.insert(&video).await.unwrap();

        let config = UploadConfig {
            staging_dir: staging.path().to_path_buf(),
            public_base_url: CDN_HOST.to_string(),
            jwt_secret: "test_secret".to_string(),
            ..UploadConfig::default()
        };

        Self {
            staging,
            repo,
            store: Arc::new(MemoryObjectStore::new(CDN_HOST)),
            media: Arc::new(media),
            config,
            video,
            pool,
        }
    }

    pub fn service(&self) -> VideoUploadService {
        VideoUploadService::new(
            self.repo.clone(),
            self.store.clone(),
            self.media.clone(),
            self.config.clone(),
        )
    }

    pub fn service_with_failing_updates(&self) -> VideoUploadService {
        VideoUploadService::new(
            Arc::new(FailingUpdates(self.repo.clone())),
            self.store.clone(),
            self.media.clone(),
            self.config.clone(),
        )
    }

    pub fn service_with_failing_reloads(&self) -> VideoUploadService {
        VideoUploadService::new(
            Arc::new(FailingReloads::new(self.repo.clone())),
            self.store.clone(),
            self.media.clone(),
            self.config.clone(),
        )
    }

    /// Files left behind in the staging directory.
    pub fn staged_files(&self) -> Vec<String> {
        std::fs::read_dir(self.staging.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect()
    }

    pub async fn stored_video(&self) -> Video {
        self.repo.get(&self.video.id).await.unwrap().unwrap()
    }
}
