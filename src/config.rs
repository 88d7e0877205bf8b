//! Configuration Module
//!
//! Holds the eviction settings of a cache and loads them from environment
//! variables.

use std::env;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Environment variable holding the eviction interval in milliseconds.
pub const EVICTION_INTERVAL_VAR: &str = "CACHEMAP_EVICTION_INTERVAL_MS";

/// Environment variable holding the optional sweep batch size.
pub const SWEEP_BATCH_SIZE_VAR: &str = "CACHEMAP_SWEEP_BATCH_SIZE";

/// Eviction settings for a [`SafeCache`](crate::SafeCache).
///
/// No default interval exists; it trades sweep cost against how long
/// expired entries linger and depends on the caller's key churn and TTLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Time between two background sweeps
    pub eviction_interval: Duration,
    /// Keys examined per lock acquisition during a sweep, None = whole map at once
    pub sweep_batch_size: Option<usize>,
}

impl CacheConfig {
    /// Creates a config that sweeps the whole map atomically every `eviction_interval`.
    pub fn new(eviction_interval: Duration) -> Self {
        Self {
            eviction_interval,
            sweep_batch_size: None,
        }
    }

    /// Splits each sweep into chunks of `batch_size` keys.
    pub fn with_sweep_batch_size(mut self, batch_size: usize) -> Self {
        self.sweep_batch_size = Some(batch_size);
        self
    }

    /// Checks that the interval and batch size are usable.
    pub fn validate(&self) -> Result<()> {
        if self.eviction_interval.is_zero() {
            return Err(CacheError::InvalidConfig(
                "eviction interval must be greater than zero".to_string(),
            ));
        }
        if self.sweep_batch_size == Some(0) {
            return Err(CacheError::InvalidConfig(
                "sweep batch size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Loads the config from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHEMAP_EVICTION_INTERVAL_MS` - Sweep interval in milliseconds (required)
    /// - `CACHEMAP_SWEEP_BATCH_SIZE` - Keys per sweep chunk (optional)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads the config through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let interval_ms: u64 = parse_var(&lookup, EVICTION_INTERVAL_VAR)?.ok_or_else(|| {
            CacheError::InvalidConfig(format!("{} is not set", EVICTION_INTERVAL_VAR))
        })?;

        let mut config = Self::new(Duration::from_millis(interval_ms));
        config.sweep_batch_size = parse_var(&lookup, SWEEP_BATCH_SIZE_VAR)?;
        config.validate()?;
        Ok(config)
    }
}

fn parse_var<F, T>(lookup: &F, name: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| {
                CacheError::InvalidConfig(format!("{} has invalid value {:?}", name, raw))
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_config_new() {
        let config = CacheConfig::new(Duration::from_secs(1));
        assert_eq!(config.eviction_interval, Duration::from_secs(1));
        assert_eq!(config.sweep_batch_size, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_zero_interval() {
        let config = CacheConfig::new(Duration::ZERO);
        assert!(matches!(config.validate(), Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_config_rejects_zero_batch() {
        let config = CacheConfig::new(Duration::from_secs(1)).with_sweep_batch_size(0);
        assert!(matches!(config.validate(), Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_config_from_lookup() {
        let config = CacheConfig::from_lookup(lookup_from(&[
            (EVICTION_INTERVAL_VAR, "250"),
            (SWEEP_BATCH_SIZE_VAR, " 64 "),
        ]))
        .unwrap();

        assert_eq!(config.eviction_interval, Duration::from_millis(250));
        assert_eq!(config.sweep_batch_size, Some(64));
    }

    #[test]
    fn test_config_from_lookup_accepts_huge_interval() {
        let huge = u64::MAX.to_string();
        let lookup = lookup_from(&[(EVICTION_INTERVAL_VAR, huge.as_str())]);
        let config = CacheConfig::from_lookup(lookup).unwrap();

        assert_eq!(config.eviction_interval, Duration::from_millis(u64::MAX));
    }

    #[test]
    fn test_config_from_env() {
        env::set_var(EVICTION_INTERVAL_VAR, "1500");
        env::set_var(SWEEP_BATCH_SIZE_VAR, "128");

        let config = CacheConfig::from_env().unwrap();
        assert_eq!(config.eviction_interval, Duration::from_millis(1500));
        assert_eq!(config.sweep_batch_size, Some(128));

        env::remove_var(EVICTION_INTERVAL_VAR);
        env::remove_var(SWEEP_BATCH_SIZE_VAR);

        let result = CacheConfig::from_env();
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_config_from_lookup_requires_interval() {
        let result = CacheConfig::from_lookup(lookup_from(&[(SWEEP_BATCH_SIZE_VAR, "64")]));
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_config_from_lookup_rejects_garbage() {
        let result = CacheConfig::from_lookup(lookup_from(&[(EVICTION_INTERVAL_VAR, "soon")]));
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));

        let result = CacheConfig::from_lookup(lookup_from(&[(EVICTION_INTERVAL_VAR, "0")]));
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }
}
