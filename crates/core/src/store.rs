//! Credential store capability contract.
//!
//! One trait covers everything the auth service needs from persistence:
//! user lookup/insert, application lookup, and role/permission resolution.
//! Multiple backends implement it (Postgres, embedded SQLite, in-memory);
//! each normalizes its own conflict signaling to [`StorageError`] kinds.

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::models::{Application, User};

/// Persistence capabilities required by the auth service.
///
/// Every mutating operation is atomic with respect to its single row.
/// Multi-row flows (save user + link role at registration) are two separate
/// operations by design; callers must surface a failure of the second step
/// as an error rather than silently succeeding.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a new user; returns the assigned id.
    ///
    /// Fails with [`StorageError::UserAlreadyExists`] when the email
    /// uniqueness constraint is violated.
    async fn save_user(
        &self,
        email: &str,
        pass_hash: &str,
        first_name: &str,
        last_name: &str,
        middle_name: &str,
    ) -> StorageResult<i64>;

    /// Look up a user by email.
    async fn user_by_email(&self, email: &str) -> StorageResult<User>;

    /// Whether a user with the given id exists.
    async fn user_exists(&self, user_id: i64) -> StorageResult<bool>;

    /// Users holding `role` whose first/last name or email contains `search`.
    async fn list_users(&self, role: &str, search: &str) -> StorageResult<Vec<User>>;

    /// Look up an application (tenant) by id.
    async fn application(&self, app_id: i64) -> StorageResult<Application>;

    /// Link a user to a role.
    async fn link_user_role(&self, user_id: i64, role_id: i64) -> StorageResult<()>;

    /// Resolve a role name to its id.
    async fn role_id(&self, role: &str) -> StorageResult<i64>;

    /// Resolve the role name of a user.
    ///
    /// Fails with [`StorageError::RoleNotFound`] when no link exists.
    async fn user_role(&self, user_id: i64) -> StorageResult<String>;

    /// Resolve the permission scope of a user via their role.
    ///
    /// An empty vec (not an error) when the role carries no permissions.
    async fn scope(&self, user_id: i64) -> StorageResult<Vec<String>>;
}
