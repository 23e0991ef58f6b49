//! `sigil-storage` — credential store backends.
//!
//! Three implementations of [`sigil_core::CredentialStore`] behind one
//! contract: Postgres (relational), SQLite (embedded file), and an
//! in-memory store for tests and local development. Backend-specific
//! conflict signaling (e.g. unique-constraint violations) is normalized to
//! the shared [`sigil_core::StorageError`] kinds.

pub mod memory;
pub mod postgres;
pub mod sqlite;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use sqlite::SqliteStore;

/// Default role → permission mapping seeded into fresh stores.
///
/// Mirrors the platform's baseline migrations: roles are created before any
/// user registers, permissions attach to roles, never to users.
pub const DEFAULT_ROLE_SCOPES: &[(&str, &[&str])] = &[
    (
        "admin",
        &["tasks:read", "tasks:write", "tasks:delete", "tasks:solve"],
    ),
    ("teacher", &["tasks:read", "tasks:write", "tasks:delete"]),
    ("student", &["tasks:read", "tasks:solve"]),
];

#[cfg(test)]
mod contract;
