//! Domain models for userstore.

pub mod user;
