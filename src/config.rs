use std::path::Path;

use serde::Deserialize;

use crate::error::Result;

const DEFAULT_CAPACITY: usize = 2;

/// Queue configuration
/// ```
/// let config = ringq::config()
///     .capacity(16)
///     .verbose(true);
///
/// let queue = ringq::Queue::<u32>::with_config(config).unwrap();
/// assert_eq!(queue.capacity(), 16);
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub(crate) capacity: usize,
    pub(crate) verbose: bool,
}

impl Config {
    /// Read a config from a json file.
    /// Missing fields fall back to their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let config = serde_json::from_slice(&bytes)?;
        Ok(config)
    }

    /// The number of slots in the queue
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Emit a `log::trace!` record for every push, eviction and pop
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Whether tracing is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            verbose: false,
        }
    }
}

/// Create a default config
pub fn config() -> Config {
    Config::default()
}
