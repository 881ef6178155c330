//! Segment store configuration.

/// Configuration for a segment store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Maximum length in bytes of a segment name passed to `create_segment`.
    pub max_name_length: usize,

    /// Maximum size of a single append payload.
    pub max_append_length: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_name_length: 256,
            max_append_length: 8 * 1024 * 1024, // 8 MB
        }
    }
}

impl StoreConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum segment name length.
    #[must_use]
    pub const fn max_name_length(mut self, length: usize) -> Self {
        self.max_name_length = length;
        self
    }

    /// Sets the maximum append payload size.
    #[must_use]
    pub const fn max_append_length(mut self, length: usize) -> Self {
        self.max_append_length = length;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.max_name_length, 256);
        assert_eq!(config.max_append_length, 8 * 1024 * 1024);
    }

    #[test]
    fn builder_pattern() {
        let config = StoreConfig::new().max_name_length(16).max_append_length(1024);

        assert_eq!(config.max_name_length, 16);
        assert_eq!(config.max_append_length, 1024);
    }
}
