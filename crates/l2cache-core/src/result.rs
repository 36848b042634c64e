//! Result type aliases for L2Cache.

use crate::L2Error;

/// A specialized `Result` type for cache operations.
pub type L2Result<T> = Result<T, L2Error>;
