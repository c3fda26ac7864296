//! Partitioned on-disk poster cache
//!
//! Stores normalized poster images under random filenames in one of two
//! partition directories (`movies`, `custom`) below a single cache root.
//! The directory listing is the only index: every list, clean and clear
//! re-reads the filesystem.

mod enumerate;
mod error;
mod evict;
mod ingest;
mod normalize;
mod partition;
mod store;
mod types;

pub use error::{CacheError, IngestError, Result};
pub use ingest::{ImageIngestor, IngestOptions};
pub use normalize::{cover_crop, fit_within, NormalizePolicy, OutputFormat, PALETTE};
pub use partition::Partition;
pub use store::CacheStore;
pub use types::CacheStats;
