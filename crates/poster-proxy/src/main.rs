//! Poster Proxy - caching image proxy for movie posters
//!
//! Fetches posters from Plex (or any image URL), normalizes them and keeps
//! them in a partitioned on-disk cache with age-based eviction.

mod error;
mod fetch;
mod server;
mod types;

use crate::error::{ProxyError, Result};
use crate::fetch::ImageFetcher;
use crate::server::{start_server, ServerState, SharedState};
use crate::types::ProxyConfig;
use plex_client::PlexClient;
use poster_cache::{ImageIngestor, OutputFormat};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::from_default_env()
        .add_directive("poster_proxy=info".parse()?)
        .add_directive("poster_cache=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting Poster Proxy...");

    // Load configuration from environment
    let config = load_config()?;
    info!("Port: {}", config.port);
    info!("Cache dir: {:?}", config.cache_dir);
    info!("Max cache age: {} seconds", config.max_cache_age_secs);
    info!(
        "Output: {:?}, max dimension {}px, quality {}",
        config.output_format, config.max_dimension, config.image_quality
    );

    if !config.output_format.is_lossless() {
        warn!("OUTPUT_FORMAT is lossy, palette mode requests will be rejected");
    }

    let fetch_timeout = Duration::from_secs(config.fetch_timeout_secs);

    // Create cache, fetcher and Plex client
    let ingestor = ImageIngestor::new(config.cache_dir.clone(), config.ingest_options());
    ingestor.store().ensure_directories().await?;

    let fetcher = ImageFetcher::new(fetch_timeout)?;

    let plex = match (&config.plex_base_url, &config.plex_token) {
        (Some(base_url), Some(token)) => {
            info!("Plex: {} (section {})", base_url, config.plex_section);
            Some(
                PlexClient::with_timeout(base_url, token, fetch_timeout)?
                    .with_section(&config.plex_section),
            )
        }
        _ => {
            warn!("PLEX_BASE_URL or PLEX_TOKEN not set, Plex routes disabled");
            None
        }
    };

    // Create shared state
    let state: SharedState = Arc::new(ServerState::new(
        ingestor,
        fetcher,
        plex,
        Duration::from_secs(config.max_cache_age_secs),
    ));

    // Start HTTP server (blocking)
    start_server(state, config.port)
        .await
        .map_err(|e| ProxyError::Config(format!("Server error: {}", e)))?;

    Ok(())
}

fn load_config() -> Result<ProxyConfig> {
    let defaults = ProxyConfig::default();

    let output_format = match std::env::var("OUTPUT_FORMAT") {
        Ok(v) => OutputFormat::from_str(&v).map_err(ProxyError::Config)?,
        Err(_) => defaults.output_format,
    };

    let image_quality = env_parse::<u8>("IMAGE_QUALITY")
        .unwrap_or(defaults.image_quality)
        .clamp(1, 100);

    Ok(ProxyConfig {
        port: env_parse("PORT").unwrap_or(defaults.port),
        cache_dir: std::env::var("CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.cache_dir),
        max_cache_age_secs: env_parse("MAX_CACHE_AGE_SECS").unwrap_or(defaults.max_cache_age_secs),
        max_dimension: env_parse("MAX_DIMENSION").unwrap_or(defaults.max_dimension),
        image_quality,
        output_format,
        display_width: env_parse("DISPLAY_WIDTH").unwrap_or(defaults.display_width),
        display_height: env_parse("DISPLAY_HEIGHT").unwrap_or(defaults.display_height),
        fetch_timeout_secs: env_parse("FETCH_TIMEOUT_SECS").unwrap_or(defaults.fetch_timeout_secs),
        plex_base_url: std::env::var("PLEX_BASE_URL").ok().filter(|s| !s.is_empty()),
        plex_token: std::env::var("PLEX_TOKEN").ok().filter(|s| !s.is_empty()),
        plex_section: std::env::var("PLEX_SECTION").unwrap_or(defaults.plex_section),
    })
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse::<T>().ok())
}
