//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async and take identifiers in their
//! external string form. Backend-native identifier types never appear in
//! these signatures.

use crate::error::StoreResult;
use crate::models::user::User;

pub trait UserRepository: Send + Sync {
    /// Persist a transient user. Any `id` on the input is ignored; the
    /// returned string is the store-assigned identifier.
    fn create(&self, user: User) -> impl Future<Output = StoreResult<String>> + Send;

    fn find_one(&self, id: &str) -> impl Future<Output = StoreResult<User>> + Send;

    /// Replace every mutable field of the record identified by `user.id`.
    /// The identifier itself is never rewritten.
    fn update(&self, user: User) -> impl Future<Output = StoreResult<()>> + Send;

    fn delete(&self, id: &str) -> impl Future<Output = StoreResult<()>> + Send;
}
