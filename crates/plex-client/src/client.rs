use std::time::Duration;

use rand::seq::SliceRandom;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::PlexError;
use crate::types::{MetadataContainer, MovieMetadata, PlexResponse, Poster, SectionsContainer};

const DEFAULT_SECTION: &str = "Movies";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Plex Media Server client scoped to one movie library section
pub struct PlexClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    section: String,
}

impl PlexClient {
    /// Create a client with the default 30 second timeout
    pub fn new(base_url: &str, token: &str) -> crate::Result<Self> {
        Self::with_timeout(base_url, token, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a client with a custom request timeout
    pub fn with_timeout(base_url: &str, token: &str, timeout: Duration) -> crate::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            section: DEFAULT_SECTION.to_string(),
        })
    }

    /// Use a library section other than "Movies"
    pub fn with_section(mut self, section: &str) -> Self {
        self.section = section.to_string();
        self
    }

    /// Poster of a random movie in the section
    pub async fn fetch_poster(&self) -> crate::Result<Poster> {
        let movies = self.movies(None).await?;
        let picked = {
            let mut rng = rand::thread_rng();
            movies.choose(&mut rng).cloned()
        };
        let movie = picked.ok_or(PlexError::EmptyLibrary)?;

        debug!(title = %movie.title, candidates = movies.len(), "Picked random movie");
        self.poster_for(movie)
    }

    /// Poster of the movie whose title matches `title`, ignoring ASCII case
    pub async fn fetch_poster_for(&self, title: &str) -> crate::Result<Poster> {
        let wanted = title.trim();
        let movie = self
            .movies(Some(wanted))
            .await?
            .into_iter()
            .find(|m| m.title.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                warn!(title = %wanted, "Movie not found in Plex library");
                PlexError::NotFound(wanted.to_string())
            })?;

        self.poster_for(movie)
    }

    fn poster_for(&self, movie: MovieMetadata) -> crate::Result<Poster> {
        let thumb = movie
            .thumb
            .ok_or_else(|| PlexError::MissingThumb(movie.title.clone()))?;

        Ok(Poster {
            poster_url: format!(
                "{}{}?X-Plex-Token={}",
                self.base_url,
                thumb,
                urlencoding::encode(&self.token)
            ),
            title: movie.title,
        })
    }

    async fn section_key(&self) -> crate::Result<String> {
        let response: PlexResponse<SectionsContainer> = self.get_json("/library/sections").await?;

        response
            .media_container
            .directories
            .into_iter()
            .find(|s| s.title.eq_ignore_ascii_case(&self.section))
            .map(|s| s.key)
            .ok_or_else(|| PlexError::SectionNotFound(self.section.clone()))
    }

    async fn movies(&self, title: Option<&str>) -> crate::Result<Vec<MovieMetadata>> {
        let key = self.section_key().await?;
        let mut path = format!("/library/sections/{}/all", urlencoding::encode(&key));
        if let Some(title) = title {
            path.push_str(&format!("?title={}", urlencoding::encode(title)));
        }

        let response: PlexResponse<MetadataContainer> = self.get_json(&path).await?;
        Ok(response.media_container.metadata)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> crate::Result<T> {
        // The token travels in a header; only the path is logged
        let url = format!("{}{}", self.base_url, path);
        debug!(path, "Plex request");

        let response = self
            .http
            .get(&url)
            .header("X-Plex-Token", &self.token)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PlexError::ApiError(format!(
                "Plex returned status {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }
}
