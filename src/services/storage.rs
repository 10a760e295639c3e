use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::{ByteStream, Length};
use tokio::io::AsyncSeekExt;

/// Durable object storage for finished videos.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores the bytes from `file`'s current position to EOF under `key` in a
    /// single write. Returns only once the store has acknowledged the object.
    async fn put_object(&self, key: &str, content_type: &str, file: tokio::fs::File)
    -> Result<()>;

    /// Public (CDN) URL for an object key.
    fn object_url(&self, key: &str) -> String;
}

/// Joins a configured base (`https://cdn.example.com`, `cdn.example.com/videos`) with a key.
pub fn build_object_url(base: &str, key: &str) -> String {
    let base = base.trim_end_matches('/');
    let base = if base.contains("://") {
        base.to_string()
    } else {
        format!("https://{}", base)
    };

    match url::Url::parse(&format!("{}/", base)).and_then(|u| u.join(key)) {
        Ok(url) => url.to_string(),
        Err(_) => format!("{}/{}", base, key),
    }
}

pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl S3ObjectStore {
    pub fn new(client: Client, bucket: String, public_base_url: String) -> Self {
        Self {
            client,
            bucket,
            public_base_url,
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(
        &self,
        key: &str,
        content_type: &str,
        mut file: tokio::fs::File,
    ) -> Result<()> {
        let offset = file.stream_position().await?;
        let len = file.metadata().await?.len();

        let body = ByteStream::read_from()
            .file(file)
            .offset(offset)
            .length(Length::Exact(len.saturating_sub(offset)))
            .build()
            .await?;

        let res = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(body)
            .send()
            .await;

        if let Err(e) = res {
            tracing::error!(
                "S3 put_object failed: bucket={}, key={}, error={:?}",
                self.bucket,
                key,
                e
            );
            return Err(anyhow::anyhow!(e.into_service_error()));
        }

        Ok(())
    }

    fn object_url(&self, key: &str) -> String {
        build_object_url(&self.public_base_url, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_host_gets_https() {
        assert_eq!(
            build_object_url("d1234.cloudfront.net", "landscape/abc.mp4"),
            "https://d1234.cloudfront.net/landscape/abc.mp4"
        );
    }

    #[test]
    fn test_base_with_path_and_trailing_slash() {
        assert_eq!(
            build_object_url("http://localhost:9000/videos/", "portrait/x-y_z.mp4"),
            "http://localhost:9000/videos/portrait/x-y_z.mp4"
        );
    }
}
