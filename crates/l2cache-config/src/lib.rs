//! # L2Cache Config
//!
//! Configuration management for the second-level cache resolver.
//! Supports layered configuration from files and environment variables,
//! with runtime reload so TTL changes reach the next cache write.

mod app_config;
mod loader;

pub use app_config::*;
pub use loader::*;
