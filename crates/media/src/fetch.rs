use std::time::Duration;

use {async_trait::async_trait, bytes::Bytes, tracing::debug};

use crate::error::{Error, Result};

/// Hard cap on a single media download.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Media retrieval seam. The broker router takes `dyn Fetch` so tests can
/// substitute a fake without a network.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Retrieve the resource at `url` into memory. Single attempt, no
    /// retry; a failure aborts that message's delivery only.
    async fn fetch(&self, url: &str) -> Result<Bytes>;
}

/// reqwest-backed fetcher with a fixed request timeout.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status(status));
        }
        let body = response.bytes().await?;
        debug!(url, bytes = body.len(), "media downloaded");
        Ok(body)
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn success_returns_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/snapshot.png")
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body(b"\x89PNG fake")
            .create_async()
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let body = fetcher
            .fetch(&format!("{}/snapshot.png", server.url()))
            .await
            .unwrap();

        assert_eq!(&body[..], b"\x89PNG fake");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/gone.jpg")
            .with_status(404)
            .create_async()
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher
            .fetch(&format!("{}/gone.jpg", server.url()))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Status(status) if status.as_u16() == 404));
    }

    #[tokio::test]
    async fn connection_failure_is_a_network_error() {
        let fetcher = HttpFetcher::new().unwrap();
        // Nothing listens on the discard port.
        let err = fetcher
            .fetch("http://127.0.0.1:9/missing.png")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Network(_)));
    }
}
