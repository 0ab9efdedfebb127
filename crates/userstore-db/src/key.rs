//! Native record keys.
//!
//! SurrealDB assigns each record created without an explicit key a random
//! 20-character alphanumeric key. Callers only ever see that key as text;
//! [`RecordKey`] is the parsed form used to address records.

use std::fmt;

use userstore_core::error::StoreError;

/// Length of a store-generated record key.
pub(crate) const KEY_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct RecordKey(String);

impl RecordKey {
    /// Parse an external identifier, rejecting anything the store could
    /// not have generated.
    pub(crate) fn parse(id: &str) -> Result<Self, StoreError> {
        let invalid = |reason: String| StoreError::InvalidIdentifier {
            id: id.to_string(),
            reason,
        };

        if id.len() != KEY_LEN {
            return Err(invalid(format!(
                "expected {KEY_LEN} characters, got {}",
                id.len()
            )));
        }
        if let Some(c) = id.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(invalid(format!("unexpected character {c:?}")));
        }

        Ok(Self(id.to_string()))
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
