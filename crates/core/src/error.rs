//! Storage error model.

use thiserror::Error;

/// Result type used across the storage boundary.
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage-level error.
///
/// Domain-recognized conditions (not-found, conflict) get their own
/// variants so the service layer can translate them deliberately; every
/// other backend fault is wrapped with call-site context in `Backend`.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Email uniqueness constraint was violated on insert.
    #[error("user already exists")]
    UserAlreadyExists,

    /// No user with the given email.
    #[error("user not found")]
    UserNotFound,

    /// No application with the given id.
    #[error("application not found")]
    ApplicationNotFound,

    /// No role with the given name, or no role linked to the user.
    #[error("role not found")]
    RoleNotFound,

    /// Any other backend fault (connection loss, malformed row, ...).
    #[error("{op}: {source}")]
    Backend {
        /// Call site, e.g. `"storage.sqlite.save_user"`.
        op: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl StorageError {
    /// Wrap an arbitrary backend error with call-site context.
    pub fn backend(
        op: &'static str,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Backend {
            op,
            source: Box::new(source),
        }
    }
}
