//! Comments layer configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Comments layer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentsConfig {
    /// Maximum cached author profiles
    pub user_cache_capacity: u64,
    /// How long a cached profile is served before it is re-read
    pub user_cache_ttl_secs: u64,
}

impl CommentsConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With profile cache capacity
    #[inline]
    #[must_use]
    pub fn with_user_cache_capacity(mut self, capacity: u64) -> Self {
        self.user_cache_capacity = capacity;
        self
    }

    /// With profile cache time-to-live
    #[inline]
    #[must_use]
    pub fn with_user_cache_ttl(mut self, ttl: Duration) -> Self {
        self.user_cache_ttl_secs = ttl.as_secs();
        self
    }

    /// Profile cache time-to-live
    #[inline]
    #[must_use]
    pub fn user_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.user_cache_ttl_secs)
    }
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            user_cache_capacity: 1_000,
            user_cache_ttl_secs: 300,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = CommentsConfig::new()
            .with_user_cache_capacity(5)
            .with_user_cache_ttl(Duration::from_secs(9));
        assert_eq!(config.user_cache_capacity, 5);
        assert_eq!(config.user_cache_ttl(), Duration::from_secs(9));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: CommentsConfig =
            serde_json::from_str(r#"{ "user_cache_capacity": 10 }"#).unwrap();
        assert_eq!(config.user_cache_capacity, 10);
        assert_eq!(config.user_cache_ttl_secs, 300);
    }
}
