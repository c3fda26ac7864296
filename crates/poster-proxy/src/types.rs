//! Core types for the poster proxy

use poster_cache::{CacheStats, IngestOptions, OutputFormat, Partition};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the poster proxy
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub port: u16,
    pub cache_dir: PathBuf,
    pub max_cache_age_secs: u64,
    pub max_dimension: u32,
    pub image_quality: u8,
    pub output_format: OutputFormat,
    pub display_width: u32,
    pub display_height: u32,
    pub fetch_timeout_secs: u64,
    pub plex_base_url: Option<String>,
    pub plex_token: Option<String>,
    pub plex_section: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            cache_dir: PathBuf::from("/data/assets"),
            max_cache_age_secs: 7 * 24 * 60 * 60, // 1 week
            max_dimension: 512,
            image_quality: 85,
            output_format: OutputFormat::Jpeg,
            display_width: 800,
            display_height: 480,
            fetch_timeout_secs: 30,
            plex_base_url: None,
            plex_token: None,
            plex_section: "Movies".to_string(),
        }
    }
}

impl ProxyConfig {
    pub fn ingest_options(&self) -> IngestOptions {
        IngestOptions {
            max_dimension: self.max_dimension,
            quality: self.image_quality,
            format: self.output_format,
            display_width: self.display_width,
            display_height: self.display_height,
        }
    }
}

/// Query parameters shared by the cache routes
#[derive(Debug, Default, Deserialize)]
pub struct CacheQuery {
    pub target: Option<String>,
    pub mode: Option<String>,
}

/// Body of `POST /custom`
#[derive(Debug, Deserialize)]
pub struct CustomPosterRequest {
    pub url: String,
}

/// A cached image as reported by `GET /posters`
#[derive(Debug, Serialize)]
pub struct CachedPoster {
    pub filename: String,
    pub partition: Partition,
}

/// Result of a successful ingest
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub filename: String,
    pub partition: Partition,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub removed: usize,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub cache: CacheStats,
}
