//! # L2Cache Core
//!
//! Core types and error definitions for the L2Cache second-level cache resolver.
//! This crate provides the foundational abstractions shared by the
//! configuration layer and the resolver itself.

pub mod entity;
pub mod error;
pub mod pagination;
pub mod result;
pub mod telemetry;

pub use entity::*;
pub use error::*;
pub use pagination::*;
pub use result::*;
pub use telemetry::*;
