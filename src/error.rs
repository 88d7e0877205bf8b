//! Error types for the cache engine
//!
//! Only construction and configuration can fail. Cache operations report
//! absence through `Option`/`bool` and never return an error.

use thiserror::Error;

// == Cache Error Enum ==
#[derive(Error, Debug)]
pub enum CacheError {
    /// Configuration value missing or out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The background sweeper needs a tokio runtime to be spawned on
    #[error("No tokio runtime available to run the eviction task")]
    NoRuntime,
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
