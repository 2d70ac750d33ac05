//! Archive transfer primitive.

use std::path::Path;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{TransferError, TransferResult};

/// Fetches a URL into a local file.
///
/// Provisioning goes through this trait so tests can count or fake
/// downloads without a network.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Download `url` into `dest`, truncating any existing content.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns a [`TransferError`] on network, HTTP status or write failure.
    async fn download(&self, url: &str, dest: &Path) -> TransferResult<u64>;
}

/// [`Downloader`] backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: reqwest::Client,
}

impl HttpDownloader {
    /// Create a downloader using the given client.
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &str, dest: &Path) -> TransferResult<u64> {
        let request = |e| TransferError::Request {
            url: url.to_owned(),
            source: e,
        };

        let response = self.client.get(url).send().await.map_err(request)?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::HttpStatus {
                url: url.to_owned(),
                status: status.as_u16(),
            });
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(request)?;
            file.write_all(&chunk).await?;
            written = written.saturating_add(u64::try_from(chunk.len()).unwrap_or(u64::MAX));
        }
        file.flush().await?;

        debug!(url, bytes = written, dest = %dest.display(), "download complete");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::http::{HttpOptions, build_client};

    fn downloader() -> HttpDownloader {
        HttpDownloader::new(build_client(&HttpOptions::default()).unwrap())
    }

    #[tokio::test]
    async fn writes_body_to_destination() {
        let server = MockServer::start().await;
        let payload = vec![7u8; 64 * 1024];
        Mock::given(method("GET"))
            .and(path("/pkg.zip"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(payload.clone()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("pkg.zip");
        let written = downloader()
            .download(&format!("{}/pkg.zip", server.uri()), &dest)
            .await
            .unwrap();

        assert_eq!(written, payload.len() as u64);
        assert_eq!(std::fs::read(&dest).unwrap(), payload);
    }

    #[tokio::test]
    async fn truncates_existing_destination() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/small.zip"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"abc".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("small.zip");
        std::fs::write(&dest, b"previous content that is longer").unwrap();

        downloader()
            .download(&format!("{}/small.zip", server.uri()), &dest)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"abc");
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let err = downloader()
            .download(&format!("{}/any.zip", server.uri()), &dir.path().join("x"))
            .await
            .unwrap_err();

        assert!(matches!(err, TransferError::HttpStatus { status: 503, .. }));
    }
}
