use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;
use tempfile::TempPath;
use tokio::process::Command;
use tracing::{debug, error};

use crate::config::UploadConfig;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("failed to invoke {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} did not finish within {secs}s")]
    Timeout { tool: String, secs: u64 },

    #[error("{tool} exited with {status}: {stderr}")]
    Failed {
        tool: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("unparseable probe output: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("no streams found in video")]
    NoStreams,

    #[error("no video stream found")]
    NoVideoStream,

    #[error("invalid video dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("could not allocate remux output: {0}")]
    Staging(std::io::Error),
}

/// Width and height of the first video stream of a staged file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaGeometry {
    pub width: u32,
    pub height: u32,
}

/// External media tooling used by the upload pipeline.
#[async_trait]
pub trait MediaTools: Send + Sync {
    /// Reads stream geometry from a complete local file. Never mutates the file.
    async fn probe(&self, path: &Path) -> Result<MediaGeometry, MediaError>;

    /// Writes a fast-start copy of `path` and returns its path. The returned
    /// file is deleted when the `TempPath` is dropped.
    async fn remux(&self, path: &Path) -> Result<TempPath, MediaError>;

    /// Whether both tools can be run at all.
    async fn health_check(&self) -> bool;
}

#[derive(Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
}

/// Extracts the first video stream's geometry from `ffprobe -print_format json -show_streams`.
pub fn parse_probe_output(stdout: &[u8]) -> Result<MediaGeometry, MediaError> {
    let probe: ProbeOutput = serde_json::from_slice(stdout)?;

    if probe.streams.is_empty() {
        return Err(MediaError::NoStreams);
    }

    // Streams without a codec_type are assumed to be video
    let stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref().is_none_or(|t| t == "video"))
        .ok_or(MediaError::NoVideoStream)?;

    if stream.width == 0 || stream.height == 0 {
        return Err(MediaError::InvalidDimensions {
            width: stream.width,
            height: stream.height,
        });
    }

    Ok(MediaGeometry {
        width: stream.width,
        height: stream.height,
    })
}

/// ffprobe/ffmpeg child processes bounded by a deadline.
pub struct FfmpegTools {
    ffprobe_path: String,
    ffmpeg_path: String,
    timeout: Duration,
}

impl FfmpegTools {
    pub fn new(ffprobe_path: String, ffmpeg_path: String, timeout: Duration) -> Self {
        Self {
            ffprobe_path,
            ffmpeg_path,
            timeout,
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(
            config.ffprobe_path.clone(),
            config.ffmpeg_path.clone(),
            config.tool_timeout(),
        )
    }

    async fn run(&self, program: &str, mut cmd: Command) -> Result<Output, MediaError> {
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|source| MediaError::Spawn {
            tool: program.to_string(),
            source,
        })?;

        // Dropping the wait future on timeout kills the child
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| MediaError::Timeout {
                tool: program.to_string(),
                secs: self.timeout.as_secs(),
            })?
            .map_err(|source| MediaError::Spawn {
                tool: program.to_string(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!("{} failed: {}", program, stderr);
            return Err(MediaError::Failed {
                tool: program.to_string(),
                status: output.status,
                stderr,
            });
        }

        Ok(output)
    }
}

#[async_trait]
impl MediaTools for FfmpegTools {
    async fn probe(&self, path: &Path) -> Result<MediaGeometry, MediaError> {
        let mut cmd = Command::new(&self.ffprobe_path);
        cmd.arg("-v")
            .arg("error")
            .arg("-print_format")
            .arg("json")
            .arg("-show_streams")
            .arg(path);

        let output = self.run(&self.ffprobe_path, cmd).await?;
        let geometry = parse_probe_output(&output.stdout)?;
        debug!(
            "Probed {}: {}x{}",
            path.display(),
            geometry.width,
            geometry.height
        );
        Ok(geometry)
    }

    async fn remux(&self, path: &Path) -> Result<TempPath, MediaError> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let output_path = tempfile::Builder::new()
            .prefix("faststart-")
            .suffix(".mp4")
            .tempfile_in(dir)
            .map_err(MediaError::Staging)?
            .into_temp_path();

        let mut cmd = Command::new(&self.ffmpeg_path);
        cmd.arg("-y") // output placeholder already exists
            .arg("-loglevel")
            .arg("error")
            .arg("-i")
            .arg(path)
            .arg("-c")
            .arg("copy")
            .arg("-movflags")
            .arg("faststart")
            .arg("-f")
            .arg("mp4")
            .arg(&*output_path);

        self.run(&self.ffmpeg_path, cmd).await?;
        Ok(output_path)
    }

    async fn health_check(&self) -> bool {
        for program in [&self.ffprobe_path, &self.ffmpeg_path] {
            let mut cmd = Command::new(program);
            cmd.arg("-version");
            if let Err(e) = self.run(program, cmd).await {
                debug!("{} is not usable: {}", program, e);
                return false;
            }
        }
        true
    }
}
