//! Error types for the poster cache

use crate::normalize::OutputFormat;
use crate::partition::Partition;
use std::fmt;

#[derive(Debug)]
pub enum CacheError {
    /// A selector string that names no partition
    UnsupportedSelector(String),
    /// A single-directory operation was given `Partition::Both`
    AmbiguousPartition,
    /// Nothing cached in the selected partition(s)
    EmptyCache(Partition),
    Ingest(IngestError),
    Io(Box<std::io::Error>),
}

/// Failure of one ingest stage
#[derive(Debug)]
pub enum IngestError {
    Decode(image::ImageError),
    Transform(String),
    /// Palette output requested with a lossy encoding
    LossyPalette(OutputFormat),
    Encode(image::ImageError),
    Write(std::io::Error),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::UnsupportedSelector(s) => write!(f, "Unsupported partition: {}", s),
            CacheError::AmbiguousPartition => {
                write!(f, "Ambiguous partition: a single partition is required")
            }
            CacheError::EmptyCache(p) => write!(f, "No cached images in {}", p),
            CacheError::Ingest(err) => write!(f, "Ingest error: {}", err),
            CacheError::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestError::Decode(err) => write!(f, "failed to decode image: {}", err),
            IngestError::Transform(msg) => write!(f, "failed to transform image: {}", msg),
            IngestError::LossyPalette(format) => write!(
                f,
                "palette mode needs a lossless output format, cache writes {:?}",
                format
            ),
            IngestError::Encode(err) => write!(f, "failed to encode image: {}", err),
            IngestError::Write(err) => write!(f, "failed to write image: {}", err),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Ingest(err) => Some(err),
            CacheError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl std::error::Error for IngestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IngestError::Decode(err) | IngestError::Encode(err) => Some(err),
            IngestError::Write(err) => Some(err),
            IngestError::Transform(_) | IngestError::LossyPalette(_) => None,
        }
    }
}

impl From<IngestError> for CacheError {
    fn from(err: IngestError) -> Self {
        CacheError::Ingest(err)
    }
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::Io(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;
