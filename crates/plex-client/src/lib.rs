//! Plex Media Server Client
//!
//! Looks up movies in a Plex library section and builds authenticated
//! poster URLs for them.

mod client;
mod error;
mod types;

pub use client::PlexClient;
pub use error::{PlexError, Result};
pub use types::Poster;
