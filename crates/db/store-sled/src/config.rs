// Configuration constants
pub(crate) const DEFAULT_CACHE_CAPACITY: u64 = 1024 * 1024 * 1024;
pub(crate) const DEFAULT_FLUSH_EVERY_MS: u64 = 500;
pub(crate) const TEST_CACHE_CAPACITY: u64 = 16 * 1024 * 1024; // Smaller for tests

/// sled database configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SledDbConfig {
    /// Page cache size in bytes.
    pub cache_capacity: u64,
    /// Background flush interval; `None` disables periodic flushing.
    pub flush_every_ms: Option<u64>,
    /// Use a temporary database removed on drop.
    pub temporary: bool,
}

impl SledDbConfig {
    pub fn new(cache_capacity: u64, flush_every_ms: Option<u64>) -> Self {
        Self {
            cache_capacity,
            flush_every_ms,
            temporary: false,
        }
    }

    /// Create production configuration with default values
    pub fn production() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY, Some(DEFAULT_FLUSH_EVERY_MS))
    }

    /// Create test configuration backed by a temporary database
    pub fn test() -> Self {
        Self {
            cache_capacity: TEST_CACHE_CAPACITY,
            flush_every_ms: None,
            temporary: true,
        }
    }

    pub(crate) fn to_sled_config(&self) -> sled::Config {
        sled::Config::new()
            .cache_capacity(self.cache_capacity)
            .flush_every_ms(self.flush_every_ms)
            .temporary(self.temporary)
    }
}

impl Default for SledDbConfig {
    fn default() -> Self {
        Self::production()
    }
}
