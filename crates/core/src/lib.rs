//! `sigil-core` — domain models, error taxonomy, and the credential store
//! capability contract.
//!
//! This crate is intentionally decoupled from HTTP, RPC, and any concrete
//! storage backend.

pub mod error;
pub mod models;
pub mod store;

pub use error::{StorageError, StorageResult};
pub use models::{Application, User};
pub use store::CredentialStore;
