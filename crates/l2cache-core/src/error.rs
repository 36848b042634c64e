//! Error taxonomy for the second-level cache.

use thiserror::Error;

/// Unified error type for cache resolver operations.
///
/// Cache misses are never errors. Every variant here is surfaced to the
/// caller immediately; nothing at this layer retries.
#[derive(Error, Debug)]
pub enum L2Error {
    // ============ Write-side Errors ============
    /// The backend refused a write or delete.
    #[error("Cache write error: {0}")]
    CacheWrite(String),

    /// A query-result payload could not be serialized.
    #[error("Persistence error: {0}")]
    Persistence(String),

    // ============ Read-side Errors ============
    /// A cached payload could not be deserialized.
    #[error("Cache read error: {0}")]
    CacheRead(String),

    // ============ Infrastructure Errors ============
    /// Transport-level failure reported by the backend (connection, pool, command).
    #[error("Cache backend error: {0}")]
    Backend(String),

    /// A key pattern the backend cannot evaluate.
    #[error("Invalid key pattern: {0}")]
    InvalidPattern(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl L2Error {
    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::CacheWrite(_) => "CACHE_WRITE_ERROR",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
            Self::CacheRead(_) => "CACHE_READ_ERROR",
            Self::Backend(_) => "CACHE_BACKEND_ERROR",
            Self::InvalidPattern(_) => "INVALID_KEY_PATTERN",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }

    /// Creates a cache write error.
    #[must_use]
    pub fn cache_write<T: Into<String>>(message: T) -> Self {
        Self::CacheWrite(message.into())
    }

    /// Creates a cache read error.
    #[must_use]
    pub fn cache_read<T: Into<String>>(message: T) -> Self {
        Self::CacheRead(message.into())
    }

    /// Creates a persistence error.
    #[must_use]
    pub fn persistence<T: Into<String>>(message: T) -> Self {
        Self::Persistence(message.into())
    }

    /// Creates a backend error.
    #[must_use]
    pub fn backend<T: Into<String>>(message: T) -> Self {
        Self::Backend(message.into())
    }

    /// Checks if this error was raised while the backend was being written to.
    #[must_use]
    pub const fn is_write_failure(&self) -> bool {
        matches!(self, Self::CacheWrite(_) | Self::Persistence(_))
    }

    /// Checks if this error came from a payload that could not be (de)serialized.
    #[must_use]
    pub const fn is_codec_failure(&self) -> bool {
        matches!(self, Self::CacheRead(_) | Self::Persistence(_))
    }
}
