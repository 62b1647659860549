//! Construction-time configuration.

use crate::hashing::DEFAULT_LOAD_FACTOR;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    #[error("load factor must be a positive number, got {0}")]
    InvalidLoadFactor(f32),
}

/// Sizing options for a [`TreeHashMap`](crate::TreeHashMap).
///
/// ```
/// use tree_hashmap::{MapConfig, TreeHashMap};
///
/// let cfg = MapConfig::new().initial_capacity(100).load_factor(0.5);
/// let map: TreeHashMap<u64, u64> = TreeHashMap::with_config(cfg).unwrap();
/// assert!(map.is_empty());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapConfig {
    pub(crate) initial_capacity: Option<usize>,
    pub(crate) load_factor: f32,
}

impl MapConfig {
    pub const fn new() -> Self {
        Self {
            initial_capacity: None,
            load_factor: DEFAULT_LOAD_FACTOR,
        }
    }

    /// Number of entries to plan for. Rounded up to a power of two when the
    /// bucket array is first allocated.
    #[must_use]
    pub const fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = Some(capacity);
        self
    }

    /// Maximum ratio of entries to buckets before the table doubles.
    #[must_use]
    pub const fn load_factor(mut self, load_factor: f32) -> Self {
        self.load_factor = load_factor;
        self
    }

    /// Rejects a load factor that is not strictly positive (NaN included).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.load_factor > 0.0 {
            Ok(())
        } else {
            Err(ConfigError::InvalidLoadFactor(self.load_factor))
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self::new()
    }
}
