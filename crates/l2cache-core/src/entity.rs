//! Stable identifiers for cached entity types.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt::{self, Display};

/// A stable identifier for a domain entity type.
///
/// Every cache key belonging to a type is rooted at this identifier, so it
/// must not change between deployments that share a backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityTypeId(String);

impl EntityTypeId {
    /// Creates an entity type identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for EntityTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityTypeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for EntityTypeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for EntityTypeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for EntityTypeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Implemented by domain types that are stored in the second-level cache.
///
/// ```
/// use l2cache_core::CacheEntity;
///
/// struct Order;
///
/// impl CacheEntity for Order {
///     const ENTITY_TYPE: &'static str = "shop.Order";
/// }
///
/// assert_eq!(Order::entity_type_id().as_str(), "shop.Order");
/// ```
pub trait CacheEntity {
    /// The stable type name all keys of this entity are rooted at.
    const ENTITY_TYPE: &'static str;

    /// Returns the entity type identifier.
    #[must_use]
    fn entity_type_id() -> EntityTypeId {
        EntityTypeId::from(Self::ENTITY_TYPE)
    }
}
