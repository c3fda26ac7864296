//! Downloading source images

use crate::error::{ProxyError, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// HTTP client for fetching source images, one attempt per call
pub struct ImageFetcher {
    client: Client,
}

impl ImageFetcher {
    /// Create a fetcher whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProxyError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Download the body behind `url`.
    ///
    /// Only `http` and `https` URLs are accepted. Query strings are kept
    /// out of the logs since Plex URLs carry the access token there.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let parsed = Url::parse(url)
            .map_err(|e| ProxyError::BadRequest(format!("Invalid image URL: {}", e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ProxyError::BadRequest(format!(
                "Unsupported URL scheme: {}",
                parsed.scheme()
            )));
        }

        let host = parsed.host_str().unwrap_or_default().to_string();
        let path = parsed.path().to_string();
        debug!(host = %host, path = %path, "Fetching image");

        let response = self.client.get(parsed).send().await.map_err(|e| {
            warn!(host = %host, error = %e, "Image request failed");
            ProxyError::Upstream(format!("request to {} failed", host))
        })?;

        if !response.status().is_success() {
            warn!(status = %response.status(), host = %host, path = %path, "Failed to fetch image");
            return Err(ProxyError::Upstream(format!(
                "{} returned status {}",
                host,
                response.status()
            )));
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| ProxyError::Upstream(format!("reading body from {} failed: {}", host, e)))?
            .to_vec();

        debug!(host = %host, size = data.len(), "Fetched image");
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;

    async fn spawn_origin() -> String {
        let app = Router::new()
            .route("/poster.png", get(|| async { b"not really a png".to_vec() }))
            .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "late"
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn fetcher() -> ImageFetcher {
        ImageFetcher::new(Duration::from_millis(500)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let origin = spawn_origin().await;

        let data = fetcher()
            .fetch(&format!("{}/poster.png?X-Plex-Token=abc", origin))
            .await
            .unwrap();
        assert_eq!(data, b"not really a png");
    }

    #[tokio::test]
    async fn test_fetch_non_success_is_upstream_error() {
        let origin = spawn_origin().await;

        let result = fetcher().fetch(&format!("{}/missing", origin)).await;
        assert!(matches!(result, Err(ProxyError::Upstream(ref msg)) if msg.contains("404")));
    }

    #[tokio::test]
    async fn test_fetch_times_out() {
        let origin = spawn_origin().await;

        let result = fetcher().fetch(&format!("{}/slow", origin)).await;
        assert!(matches!(result, Err(ProxyError::Upstream(_))));
    }

    #[tokio::test]
    async fn test_fetch_rejects_invalid_url() {
        let result = fetcher().fetch("not a url").await;
        assert!(matches!(result, Err(ProxyError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_fetch_rejects_non_http_scheme() {
        let result = fetcher().fetch("file:///etc/passwd").await;
        assert!(matches!(result, Err(ProxyError::BadRequest(ref msg)) if msg.contains("file")));
    }
}
