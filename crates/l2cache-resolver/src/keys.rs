//! Backend key derivation.
//!
//! Simple keys are `{type}.literal` and can be addressed or deleted one at a
//! time. Condition-hashed keys are `sha256(type + version + condition)` and
//! can only be found again by recomputing them under the same version.

use crate::codec;
use crate::NamespaceVersioner;
use l2cache_core::{EntityTypeId, L2Error, L2Result};
use serde::Serialize;
use tracing::debug;

/// Generate the simple key for a literal key of a type.
#[must_use]
pub fn simple_key(type_id: &EntityTypeId, key: &str) -> String {
    format!("{{{}}}.{}", type_id, key)
}

/// Pattern matching every simple key of a type.
///
/// Glob metacharacters inside the type id are bracket-escaped, a form both
/// Redis `KEYS` and the `glob` crate read as literals. A backslash has no
/// such form (Redis treats it as an escape, `glob` as a literal), so type
/// ids containing one are rejected.
pub fn type_pattern(type_id: &EntityTypeId) -> L2Result<String> {
    if type_id.as_str().contains('\\') {
        return Err(L2Error::InvalidPattern(format!(
            "Entity type '{}' contains a backslash and cannot be matched by pattern",
            type_id
        )));
    }

    let mut escaped = String::with_capacity(type_id.as_str().len() + 4);
    for ch in type_id.as_str().chars() {
        match ch {
            '*' | '?' | '[' => {
                escaped.push('[');
                escaped.push(ch);
                escaped.push(']');
            }
            _ => escaped.push(ch),
        }
    }
    Ok(format!("{{{}}}.*", escaped))
}

/// Condition-hashed key under an explicit namespace version.
pub fn hashed_key_with_version<C: Serialize + ?Sized>(
    type_id: &EntityTypeId,
    version: &str,
    condition: &C,
) -> L2Result<String> {
    let condition = codec::canonicalize(condition)?;
    Ok(codec::digest(&format!("{}{}{}", type_id, version, condition)))
}

/// Derives backend keys, consulting the namespace versioner for hashed keys.
#[derive(Clone)]
pub struct KeyCodec {
    versioner: NamespaceVersioner,
}

impl KeyCodec {
    /// Create a key codec.
    #[must_use]
    pub fn new(versioner: NamespaceVersioner) -> Self {
        Self { versioner }
    }

    /// The namespace versioner backing hashed keys.
    #[must_use]
    pub fn versioner(&self) -> &NamespaceVersioner {
        &self.versioner
    }

    /// Condition-hashed key under the type's current version.
    ///
    /// Reads the version exactly once, initialising it if absent.
    pub async fn hashed_key<C: Serialize + ?Sized>(
        &self,
        type_id: &EntityTypeId,
        condition: &C,
    ) -> L2Result<String> {
        let version = self.versioner.current_version(type_id).await?;
        let key = hashed_key_with_version(type_id, &version, condition)?;
        debug!(entity_type = %type_id, version = %version, key = %key, "Derived hashed key");
        Ok(key)
    }
}
