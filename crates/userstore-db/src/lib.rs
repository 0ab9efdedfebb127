//! userstore Database — SurrealDB connection management and the
//! [`UserRepository`](userstore_core::UserRepository) implementation.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema bootstrap ([`run_migrations`])
//! - The SurrealDB user repository ([`SurrealUserRepository`])

mod connection;
mod error;
mod key;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use repository::SurrealUserRepository;
pub use schema::{run_migrations, validate_table_name};
