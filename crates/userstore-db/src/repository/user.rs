//! SurrealDB implementation of [`UserRepository`].
//!
//! Records are created without an explicit key so the store assigns one;
//! that key, as text, is the identifier callers see. Every identifier is
//! parsed into a [`RecordKey`] before the store is contacted, so malformed
//! input never reaches a query.
//!
//! Writes go through [`UserDocument`], the persisted face of a user. It
//! has no identifier field, which is what keeps `update` from ever
//! rewriting a record's identity.

use serde::Serialize;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{Instrument, Span, debug, error, trace};
use userstore_core::error::{Operation, StoreError, StoreResult};
use userstore_core::models::user::User;
use userstore_core::repository::UserRepository;

use crate::error::DbError;
use crate::key::RecordKey;

const ENTITY: &str = "user";

/// Placeholder identifier for errors raised before the store assigns one.
const UNASSIGNED: &str = "<unassigned>";

/// Persisted face of a user.
#[derive(Debug, Serialize, SurrealValue)]
struct UserDocument {
    username: String,
    password_hash: String,
    email: String,
}

impl UserDocument {
    fn from_user(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            password_hash: user.password_hash.clone(),
            email: user.email.clone(),
        }
    }

    fn into_user(self, id: String) -> User {
        User {
            id: Some(id),
            username: self.username,
            password_hash: self.password_hash,
            email: self.email,
        }
    }

    /// Render the document as a bindable object.
    fn encode(&self, operation: Operation) -> StoreResult<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| {
            error!(%operation, error = %e, "Failed to encode user document");
            StoreError::Encoding {
                operation,
                message: e.to_string(),
            }
        })
    }
}

/// Key of a freshly created record via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct CreatedRow {
    record_id: String,
}

/// A record touched by UPDATE or DELETE. Only its presence matters.
#[derive(Debug, SurrealValue)]
struct AffectedRow {
    #[allow(dead_code)]
    username: String,
}

fn storage_error(operation: Operation, id: &str, err: surrealdb::Error) -> StoreError {
    trace!(%operation, id, error = %err, "Store call failed");
    DbError::from(err).into_store_error(operation, id)
}

fn decoding_error(operation: Operation, id: &str, err: impl std::fmt::Display) -> StoreError {
    error!(%operation, id, error = %err, "Failed to decode user record");
    StoreError::Decoding {
        operation,
        id: id.to_string(),
        message: err.to_string(),
    }
}

fn not_found(id: &RecordKey) -> StoreError {
    trace!(id = %id, "User not found");
    StoreError::NotFound {
        entity: ENTITY.into(),
        id: id.to_string(),
    }
}

/// SurrealDB implementation of the User repository.
///
/// Holds a cloned client handle, the table name and the span all
/// operations are instrumented with. Cloning is cheap and clones share
/// the underlying connection.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
    table: String,
    span: Span,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>, table: impl Into<String>) -> Self {
        let table = table.into();
        let span = tracing::info_span!("user_repository", table = %table);
        Self::with_span(db, table, span)
    }

    /// Build a repository that logs under a caller-supplied span.
    pub fn with_span(db: Surreal<C>, table: impl Into<String>, span: Span) -> Self {
        Self {
            db,
            table: table.into(),
            span,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, user: User) -> StoreResult<String> {
        async move {
            const OP: Operation = Operation::Create;

            if let Some(ignored) = &user.id {
                trace!(id = %ignored, "Ignoring caller-supplied id on create");
            }
            debug!(username = %user.username, "Creating user");

            let doc = UserDocument::from_user(&user).encode(OP)?;

            let result = self
                .db
                .query(
                    "CREATE type::table($table) CONTENT $doc \
                     RETURN meta::id(id) AS record_id",
                )
                .bind(("table", self.table.clone()))
                .bind(("doc", doc))
                .await
                .map_err(|e| storage_error(OP, UNASSIGNED, e))?;

            let mut result = result
                .check()
                .map_err(|e| storage_error(OP, UNASSIGNED, e))?;

            // The statement succeeded, so a failed conversion means the
            // store handed back a key we cannot represent.
            let rows: Vec<CreatedRow> = result.take(0).map_err(|e| {
                error!(error = %e, "Store returned an unreadable record id");
                StoreError::Encoding {
                    operation: OP,
                    message: format!("unreadable record id: {e}"),
                }
            })?;
            let record_id = rows
                .into_iter()
                .next()
                .map(|row| row.record_id)
                .ok_or_else(|| StoreError::Encoding {
                    operation: OP,
                    message: "store returned no record id".into(),
                })?;

            let key = RecordKey::parse(&record_id).map_err(|e| {
                error!(record_id = %record_id, error = %e, "Store assigned an unexpected record id");
                StoreError::Encoding {
                    operation: OP,
                    message: e.to_string(),
                }
            })?;

            debug!(id = %key, "Created user");
            Ok(key.to_string())
        }
        .instrument(self.span.clone())
        .await
    }

    async fn find_one(&self, id: &str) -> StoreResult<User> {
        async move {
            const OP: Operation = Operation::FindOne;

            let key = RecordKey::parse(id)?;

            let result = self
                .db
                .query(
                    "SELECT username, password_hash, email \
                     FROM type::record($table, $id)",
                )
                .bind(("table", self.table.clone()))
                .bind(("id", key.to_string()))
                .await
                .map_err(|e| storage_error(OP, id, e))?;

            let mut result = result.check().map_err(|e| storage_error(OP, id, e))?;

            let rows: Vec<UserDocument> =
                result.take(0).map_err(|e| decoding_error(OP, id, e))?;
            let doc = rows.into_iter().next().ok_or_else(|| not_found(&key))?;

            Ok(doc.into_user(key.to_string()))
        }
        .instrument(self.span.clone())
        .await
    }

    async fn update(&self, user: User) -> StoreResult<()> {
        async move {
            const OP: Operation = Operation::Update;

            let id = user
                .id
                .as_deref()
                .ok_or_else(|| StoreError::InvalidIdentifier {
                    id: String::new(),
                    reason: "user has not been persisted".into(),
                })?;
            let key = RecordKey::parse(id)?;

            let doc = UserDocument::from_user(&user).encode(OP)?;

            let result = self
                .db
                .query("UPDATE type::record($table, $id) MERGE $doc")
                .bind(("table", self.table.clone()))
                .bind(("id", key.to_string()))
                .bind(("doc", doc))
                .await
                .map_err(|e| storage_error(OP, id, e))?;

            let mut result = result.check().map_err(|e| storage_error(OP, id, e))?;

            let rows: Vec<AffectedRow> =
                result.take(0).map_err(|e| decoding_error(OP, id, e))?;
            if rows.is_empty() {
                return Err(not_found(&key));
            }

            trace!(id = %key, matched = rows.len(), "Updated user");
            Ok(())
        }
        .instrument(self.span.clone())
        .await
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        async move {
            const OP: Operation = Operation::Delete;

            let key = RecordKey::parse(id)?;

            let result = self
                .db
                .query("DELETE type::record($table, $id) RETURN BEFORE")
                .bind(("table", self.table.clone()))
                .bind(("id", key.to_string()))
                .await
                .map_err(|e| storage_error(OP, id, e))?;

            let mut result = result.check().map_err(|e| storage_error(OP, id, e))?;

            let rows: Vec<AffectedRow> =
                result.take(0).map_err(|e| decoding_error(OP, id, e))?;
            if rows.is_empty() {
                return Err(not_found(&key));
            }

            trace!(id = %key, deleted = rows.len(), "Deleted user");
            Ok(())
        }
        .instrument(self.span.clone())
        .await
    }
}
