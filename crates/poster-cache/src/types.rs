//! Cache types

use serde::{Deserialize, Serialize};

/// Number of cached images per partition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub movies: usize,
    pub custom: usize,
}

impl CacheStats {
    pub fn total(&self) -> usize {
        self.movies + self.custom
    }
}
