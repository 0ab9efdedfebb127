//! userstore core — the user entity model, the storage contract and the
//! error taxonomy shared by every backend and by the HTTP layer.

pub mod cancel;
pub mod error;
pub mod models;
pub mod repository;

pub use cancel::with_cancellation;
pub use error::{Operation, StoreError, StoreResult};
pub use models::user::{CreateUser, User};
pub use repository::UserRepository;
