//! User domain model.
//!
//! `User` serializes to its external face: the credential hash is never
//! written out. The persisted face lives with each storage backend.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Store-assigned identifier; `None` until the user is persisted.
    #[serde(default)]
    pub id: Option<String>,
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password_hash: String,
    pub email: String,
}

/// Creation payload. Identifiers are always store-assigned, so there is
/// no `id` here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateUser {
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email: String,
}

impl From<CreateUser> for User {
    fn from(input: CreateUser) -> Self {
        Self {
            id: None,
            username: input.username,
            password_hash: input.password_hash,
            email: input.email,
        }
    }
}
