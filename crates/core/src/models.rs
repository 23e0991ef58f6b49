//! Core identity records.

use serde::{Deserialize, Serialize};

/// A registered user.
///
/// # Invariants
/// - `email` is unique across the platform (enforced by the store).
/// - `pass_hash` is a salted one-way hash; the plaintext password is never
///   stored or logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    /// PHC-encoded password hash. Never serialized into responses.
    #[serde(skip_serializing)]
    pub pass_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: String,
}

/// A consuming application (tenant) of the identity platform.
///
/// The `secret` is used only for signing and verifying tokens issued for
/// this application's users. Applications are created out-of-band and are
/// read-only in this system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    pub id: i64,
    pub name: String,
    pub secret: String,
}
