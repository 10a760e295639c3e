use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the video upload pipeline
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Maximum accepted video size in bytes (default: 1 GiB)
    pub max_upload_size: usize,

    /// ffprobe binary used for stream inspection (default: "ffprobe")
    pub ffprobe_path: String,

    /// ffmpeg binary used for the fast-start remux (default: "ffmpeg")
    pub ffmpeg_path: String,

    /// Deadline for a single external tool invocation in seconds (default: 300)
    pub tool_timeout_secs: u64,

    /// Directory for staged uploads (default: OS temp dir)
    pub staging_dir: PathBuf,

    /// Storage endpoint or CDN host used to build access URLs
    pub public_base_url: String,

    /// JWT Secret Key (Required in production)
    pub jwt_secret: String,

    /// Allowed CORS Origins (comma separated)
    pub allowed_origins: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_upload_size: 1024 * 1024 * 1024, // 1 GiB
            ffprobe_path: "ffprobe".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            tool_timeout_secs: 300,
            staging_dir: env::temp_dir(),
            public_base_url: "http://localhost:9000/videos".to_string(),
            jwt_secret: "secret".to_string(),
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(), // Vite default
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

impl UploadConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_size),

            ffprobe_path: env::var("FFPROBE_PATH").unwrap_or(default.ffprobe_path),

            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or(default.ffmpeg_path),

            tool_timeout_secs: env::var("TOOL_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.tool_timeout_secs),

            staging_dir: env::var("STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.staging_dir),

            public_base_url: env::var("CDN_BASE_URL").unwrap_or(default.public_base_url),

            jwt_secret: env::var("JWT_SECRET").unwrap_or(default.jwt_secret), // strictly enforced in production()

            allowed_origins: env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(default.allowed_origins),
        }
    }

    /// Create config for development (local MinIO, short tool deadline)
    pub fn development() -> Self {
        Self {
            tool_timeout_secs: 60,
            ..Self::default()
        }
    }

    /// Create config for production (secret and CDN host must be provided)
    pub fn production() -> anyhow::Result<Self> {
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("CRITICAL: JWT_SECRET must be set"))?;
        let public_base_url = env::var("CDN_BASE_URL")
            .map_err(|_| anyhow::anyhow!("CRITICAL: CDN_BASE_URL must be set"))?;

        Ok(Self {
            jwt_secret,
            public_base_url,
            ..Self::from_env()
        })
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = UploadConfig::default();
        assert_eq!(config.max_upload_size, 1024 * 1024 * 1024);
        assert_eq!(config.ffprobe_path, "ffprobe");
        assert_eq!(config.ffmpeg_path, "ffmpeg");
        assert_eq!(config.tool_timeout(), Duration::from_secs(300));
    }

    #[test]
    fn test_development_config() {
        let config = UploadConfig::development();
        assert_eq!(config.tool_timeout_secs, 60);
        assert_eq!(config.max_upload_size, UploadConfig::default().max_upload_size);
    }

    #[test]
    fn test_production_config_requires_secret() {
        unsafe { env::remove_var("JWT_SECRET") };
        assert!(UploadConfig::production().is_err());
    }

    #[test]
    fn test_from_env_cors_fallback() {
        unsafe { env::remove_var("ALLOWED_ORIGINS") };
        let config = UploadConfig::from_env();
        let default_config = UploadConfig::default();
        assert_eq!(config.allowed_origins, default_config.allowed_origins);
        assert!(!config.allowed_origins.contains(&"*".to_string()));
    }
}
