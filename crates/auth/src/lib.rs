//! `sigil-auth` — credential verification, role/scope resolution, and token
//! issuance.
//!
//! This crate is intentionally decoupled from HTTP/RPC and from any concrete
//! storage backend; it sees persistence only through
//! [`sigil_core::CredentialStore`].

pub mod password;
pub mod permissions;
pub mod service;
pub mod token;

pub use password::PasswordError;
pub use service::{AuthError, AuthService};
pub use token::{Claims, TokenError};
