//! Pipe configuration

use crate::core::WaitStrategy;

/// Kapasitas default, sama dengan pipe operasi di demo
pub const DEFAULT_CAPACITY: usize = 1024;

/// Parameter konstruksi pipe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipeConfig {
    /// Jumlah slot yang di-pre-allocate
    pub capacity: usize,
    /// Hanya dipakai oleh blocking pipe
    pub wait: WaitStrategy,
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            wait: WaitStrategy::default(),
        }
    }
}

impl PipeConfig {
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_wait(mut self, wait: WaitStrategy) -> Self {
        self.wait = wait;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipeConfig::default();
        assert_eq!(config.capacity, DEFAULT_CAPACITY);
        assert_eq!(config.wait, WaitStrategy::BusySpin);
    }

    #[test]
    fn test_builder_chain() {
        let config = PipeConfig::default()
            .with_capacity(8)
            .with_wait(WaitStrategy::Backoff);
        assert_eq!(config.capacity, 8);
        assert_eq!(config.wait, WaitStrategy::Backoff);
    }
}
