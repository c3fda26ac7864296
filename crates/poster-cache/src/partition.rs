//! Partition selector

use crate::error::CacheError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Selects one cache partition, or both of them.
///
/// `Both` is a view over `Movies` and `Custom` and never maps to a
/// directory of its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    Movies,
    Custom,
    #[default]
    Both,
}

impl Partition {
    /// The concrete partitions this selector covers, Movies before Custom.
    pub fn concrete(self) -> &'static [Partition] {
        match self {
            Partition::Movies => &[Partition::Movies],
            Partition::Custom => &[Partition::Custom],
            Partition::Both => &[Partition::Movies, Partition::Custom],
        }
    }

    /// Directory name under the cache root, `None` for `Both`.
    pub fn dir_name(self) -> Option<&'static str> {
        match self {
            Partition::Movies => Some("movies"),
            Partition::Custom => Some("custom"),
            Partition::Both => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Partition::Movies => "movies",
            Partition::Custom => "custom",
            Partition::Both => "both",
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Partition {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movies" => Ok(Partition::Movies),
            "custom" => Ok(Partition::Custom),
            "both" => Ok(Partition::Both),
            _ => Err(CacheError::UnsupportedSelector(s.to_string())),
        }
    }
}
