//! Error types for cache operations

use std::fmt;

/// Result type alias for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors that can occur while talking to a cache backend
#[derive(Debug)]
pub enum CacheError {
    /// Backend could not be reached
    ConnectionFailed(String),

    /// Backend rejected or failed a command
    CommandFailed(String),

    /// Payload could not be encoded or decoded
    Serialization(String),

    /// Invalid backend configuration
    InvalidConfig(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::ConnectionFailed(msg) => {
                write!(f, "failed to connect to cache backend: {}", msg)
            }
            CacheError::CommandFailed(msg) => write!(f, "cache command failed: {}", msg),
            CacheError::Serialization(msg) => write!(f, "cache serialization error: {}", msg),
            CacheError::InvalidConfig(msg) => write!(f, "invalid cache configuration: {}", msg),
        }
    }
}

impl std::error::Error for CacheError {}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_refusal() || err.is_connection_dropped() || err.is_io_error() {
            CacheError::ConnectionFailed(err.to_string())
        } else {
            CacheError::CommandFailed(err.to_string())
        }
    }
}
