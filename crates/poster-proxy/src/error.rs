//! Error types for the poster proxy

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use plex_client::PlexError;
use poster_cache::{CacheError, IngestError};
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum ProxyError {
    Cache(CacheError),
    Plex(PlexError),
    /// Remote image host failed or was unreachable
    Upstream(String),
    BadRequest(String),
    NotFound(String),
    /// Plex credentials were not configured
    PlexUnavailable,
    Io(Box<std::io::Error>),
    Config(String),
}

impl fmt::Display for ProxyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyError::Cache(err) => write!(f, "Cache error: {}", err),
            ProxyError::Plex(err) => write!(f, "Plex error: {}", err),
            ProxyError::Upstream(msg) => write!(f, "Upstream unavailable: {}", msg),
            ProxyError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ProxyError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ProxyError::PlexUnavailable => write!(f, "Plex is not configured"),
            ProxyError::Io(err) => write!(f, "IO error: {}", err),
            ProxyError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for ProxyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProxyError::Cache(err) => Some(err),
            ProxyError::Plex(err) => Some(err),
            ProxyError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Cache(CacheError::UnsupportedSelector(_))
            | ProxyError::Cache(CacheError::AmbiguousPartition)
            | ProxyError::Cache(CacheError::Ingest(IngestError::LossyPalette(_)))
            | ProxyError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::Cache(CacheError::EmptyCache(_))
            | ProxyError::Plex(PlexError::NotFound(_))
            | ProxyError::NotFound(_) => StatusCode::NOT_FOUND,
            ProxyError::Plex(_) | ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ProxyError::PlexUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::Cache(_) | ProxyError::Io(_) | ProxyError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Internal server error");
            "Internal server error".to_string()
        } else {
            tracing::warn!(status = %status, error = %self, "Request failed");
            self.to_string()
        };

        (status, axum::Json(json!({ "error": message }))).into_response()
    }
}

impl From<CacheError> for ProxyError {
    fn from(err: CacheError) -> Self {
        ProxyError::Cache(err)
    }
}

impl From<PlexError> for ProxyError {
    fn from(err: PlexError) -> Self {
        ProxyError::Plex(err)
    }
}

impl From<std::io::Error> for ProxyError {
    fn from(err: std::io::Error) -> Self {
        ProxyError::Io(Box::new(err))
    }
}

impl From<tracing_subscriber::filter::ParseError> for ProxyError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        ProxyError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;
