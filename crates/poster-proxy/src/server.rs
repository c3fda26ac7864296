//! HTTP server for poster cache endpoints
//!
//! Maps query parameters onto cache operations and cache failures onto
//! status codes. Writes run `clean` on the target partition first.

use crate::error::{ProxyError, Result};
use crate::fetch::ImageFetcher;
use crate::types::{
    CacheQuery, CachedPoster, ClearResponse, CustomPosterRequest, HealthResponse, IngestResponse,
};
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use chrono::{DateTime, Utc};
use plex_client::{PlexClient, Poster};
use poster_cache::{CacheStore, ImageIngestor, NormalizePolicy, Partition};
use std::io::ErrorKind;
use std::path::Path as FsPath;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing::info;

const POSTER_FILENAME_HEADER: &str = "x-poster-filename";

/// Shared state for the HTTP server
pub struct ServerState {
    pub ingestor: ImageIngestor,
    pub fetcher: ImageFetcher,
    pub plex: Option<PlexClient>,
    pub max_cache_age: Duration,
    pub started_at: DateTime<Utc>,
}

impl ServerState {
    pub fn new(
        ingestor: ImageIngestor,
        fetcher: ImageFetcher,
        plex: Option<PlexClient>,
        max_cache_age: Duration,
    ) -> Self {
        Self {
            ingestor,
            fetcher,
            plex,
            max_cache_age,
            started_at: Utc::now(),
        }
    }

    fn store(&self) -> &CacheStore {
        self.ingestor.store()
    }

    fn plex(&self) -> Result<&PlexClient> {
        self.plex.as_ref().ok_or(ProxyError::PlexUnavailable)
    }
}

pub type SharedState = Arc<ServerState>;

impl CacheQuery {
    fn partition(&self) -> Result<Partition> {
        match self.target.as_deref() {
            Some(target) => Ok(target.parse()?),
            None => Ok(Partition::Both),
        }
    }

    fn policy(&self) -> Result<NormalizePolicy> {
        match self.mode.as_deref() {
            Some(mode) => mode.parse().map_err(ProxyError::BadRequest),
            None => Ok(NormalizePolicy::Standard),
        }
    }
}

/// Create the HTTP router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/random-poster", get(random_poster))
        .route("/posters", get(list_posters))
        .route("/posters/random", get(random_cached_poster))
        .route("/posters/fetch", post(fetch_random_movie))
        .route("/posters/fetch/{title}", post(fetch_movie))
        .route("/posters/{filename}", get(get_poster))
        .route("/custom", post(add_custom_poster))
        .route("/cache", delete(clear_cache))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(state: SharedState, port: u16) -> std::io::Result<()> {
    let router = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await
}

/// Health check endpoint
async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let uptime_secs = (Utc::now() - state.started_at).num_seconds().max(0) as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs,
        cache: state.store().stats().await,
    })
}

/// A random movie poster URL from Plex, without caching it
async fn random_poster(State(state): State<SharedState>) -> Result<Json<Poster>> {
    Ok(Json(state.plex()?.fetch_poster().await?))
}

/// Cached filenames with their partition, Movies first
async fn list_posters(
    State(state): State<SharedState>,
    Query(query): Query<CacheQuery>,
) -> Result<Json<Vec<CachedPoster>>> {
    let mut posters = Vec::new();
    for &partition in query.partition()?.concrete() {
        for path in state.store().list(partition).await? {
            if let Some(filename) = path.file_name().and_then(|n| n.to_str()) {
                posters.push(CachedPoster {
                    filename: filename.to_string(),
                    partition,
                });
            }
        }
    }
    Ok(Json(posters))
}

/// Bytes of a random cached image
async fn random_cached_poster(
    State(state): State<SharedState>,
    Query(query): Query<CacheQuery>,
) -> Result<Response> {
    let path = state.store().random_entry(query.partition()?).await?;
    let data = read_cached(&path).await?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();

    Ok((
        [
            (header::CONTENT_TYPE, content_type(&path).to_string()),
            (header::CACHE_CONTROL, "no-store".to_string()),
            (HeaderName::from_static(POSTER_FILENAME_HEADER), filename),
        ],
        data,
    )
        .into_response())
}

/// Bytes of one cached image.
///
/// Without a concrete `target` each partition is tried in order.
async fn get_poster(
    State(state): State<SharedState>,
    Path(filename): Path<String>,
    Query(query): Query<CacheQuery>,
) -> Result<Response> {
    if !is_plain_filename(&filename) {
        return Err(ProxyError::BadRequest(format!("Invalid filename: {}", filename)));
    }

    for &partition in query.partition()?.concrete() {
        let path = state.store().resolve(&filename, partition)?;
        match read_cached(&path).await {
            Ok(data) => {
                return Ok((
                    [
                        (header::CONTENT_TYPE, content_type(&path)),
                        (header::CACHE_CONTROL, "public, max-age=86400"),
                    ],
                    data,
                )
                    .into_response())
            }
            Err(ProxyError::NotFound(_)) => continue,
            Err(e) => return Err(e),
        }
    }

    Err(ProxyError::NotFound(format!("No cached poster named {}", filename)))
}

/// Cache the poster of a random Plex movie
async fn fetch_random_movie(
    State(state): State<SharedState>,
    Query(query): Query<CacheQuery>,
) -> Result<(StatusCode, Json<IngestResponse>)> {
    let policy = query.policy()?;
    let plex = state.plex()?;
    let poster = plex.fetch_poster().await?;
    cache_movie_poster(&state, poster, policy).await
}

/// Cache the poster of the Plex movie named `title`
async fn fetch_movie(
    State(state): State<SharedState>,
    Path(title): Path<String>,
    Query(query): Query<CacheQuery>,
) -> Result<(StatusCode, Json<IngestResponse>)> {
    let policy = query.policy()?;
    let plex = state.plex()?;
    let poster = plex.fetch_poster_for(&title).await?;
    cache_movie_poster(&state, poster, policy).await
}

async fn cache_movie_poster(
    state: &ServerState,
    poster: Poster,
    policy: NormalizePolicy,
) -> Result<(StatusCode, Json<IngestResponse>)> {
    let filename = ingest_url(state, &poster.poster_url, Partition::Movies, policy).await?;
    info!(title = %poster.title, filename = %filename, "Cached movie poster");

    Ok((
        StatusCode::CREATED,
        Json(IngestResponse {
            title: Some(poster.title),
            filename,
            partition: Partition::Movies,
        }),
    ))
}

/// Cache an image from an arbitrary URL in the custom partition
async fn add_custom_poster(
    State(state): State<SharedState>,
    Query(query): Query<CacheQuery>,
    Json(request): Json<CustomPosterRequest>,
) -> Result<(StatusCode, Json<IngestResponse>)> {
    let policy = query.policy()?;
    let filename = ingest_url(&state, &request.url, Partition::Custom, policy).await?;

    Ok((
        StatusCode::CREATED,
        Json(IngestResponse {
            title: None,
            filename,
            partition: Partition::Custom,
        }),
    ))
}

/// Remove every cached image in the target partition(s)
async fn clear_cache(
    State(state): State<SharedState>,
    Query(query): Query<CacheQuery>,
) -> Result<Json<ClearResponse>> {
    let removed = state.store().clear(query.partition()?).await?;
    Ok(Json(ClearResponse { removed }))
}

/// Evict stale entries, then download, normalize and store one image
async fn ingest_url(
    state: &ServerState,
    url: &str,
    partition: Partition,
    policy: NormalizePolicy,
) -> Result<String> {
    state.store().clean(partition, state.max_cache_age).await?;
    let bytes = state.fetcher.fetch(url).await?;
    Ok(state.ingestor.ingest(bytes, partition, policy).await?)
}

async fn read_cached(path: &FsPath) -> Result<Vec<u8>> {
    match tokio::fs::read(path).await {
        Ok(data) => Ok(data),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Err(ProxyError::NotFound("Cached poster no longer exists".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

fn content_type(path: &FsPath) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        _ => "application/octet-stream",
    }
}

/// A single visible path component: no separators, no dot prefix
fn is_plain_filename(name: &str) -> bool {
    !name.is_empty() && !name.starts_with('.') && !name.contains(['/', '\\'])
}
