//! Relational credential store backed by PostgreSQL (sqlx).
//!
//! Schema provisioning lives in external migration tooling; this module
//! assumes the `users`, `applications`, `roles`, `user_roles`,
//! `permissions`, and `role_permissions` tables exist.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use sigil_core::{Application, CredentialStore, StorageError, StorageResult, User};

/// Postgres-backed store.
///
/// The sqlx pool handles connection management and is safe to share across
/// tasks. Unique violations on `users.email` (SQLSTATE 23505) are
/// normalized to [`StorageError::UserAlreadyExists`].
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register an application (tenant); returns its id.
    pub async fn insert_application(&self, name: &str, secret: &str) -> StorageResult<i64> {
        const OP: &str = "storage.postgres.insert_application";

        let row =
            sqlx::query("INSERT INTO applications (name, secret) VALUES ($1, $2) RETURNING id")
                .bind(name)
                .bind(secret)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| StorageError::backend(OP, e))?;

        Ok(row.get(0))
    }
}

fn row_to_user(row: &sqlx::postgres::PgRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        pass_hash: row.get("pass_hash"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        middle_name: row.get("middle_name"),
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn save_user(
        &self,
        email: &str,
        pass_hash: &str,
        first_name: &str,
        last_name: &str,
        middle_name: &str,
    ) -> StorageResult<i64> {
        const OP: &str = "storage.postgres.save_user";

        let result = sqlx::query(
            r#"
            INSERT INTO users (email, pass_hash, first_name, last_name, middle_name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(email)
        .bind(pass_hash)
        .bind(first_name)
        .bind(last_name)
        .bind(middle_name)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(row.get(0)),
            Err(e) => {
                if e.as_database_error()
                    .is_some_and(|d| d.is_unique_violation())
                {
                    return Err(StorageError::UserAlreadyExists);
                }
                Err(StorageError::backend(OP, e))
            }
        }
    }

    async fn user_by_email(&self, email: &str) -> StorageResult<User> {
        const OP: &str = "storage.postgres.user_by_email";

        let row = sqlx::query(
            r#"
            SELECT id, email, pass_hash, first_name, last_name, middle_name
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::backend(OP, e))?;

        row.map(|r| row_to_user(&r)).ok_or(StorageError::UserNotFound)
    }

    async fn user_exists(&self, user_id: i64) -> StorageResult<bool> {
        const OP: &str = "storage.postgres.user_exists";

        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StorageError::backend(OP, e))?;

        Ok(row.get(0))
    }

    async fn list_users(&self, role: &str, search: &str) -> StorageResult<Vec<User>> {
        const OP: &str = "storage.postgres.list_users";

        let pattern = format!("%{search}%");
        let rows = sqlx::query(
            r#"
            SELECT u.id, u.email, u.pass_hash, u.first_name, u.last_name, u.middle_name
            FROM users u
            JOIN user_roles ur ON u.id = ur.user_id
            JOIN roles r ON ur.role_id = r.id
            WHERE r.role = $1
              AND (u.first_name LIKE $2 OR u.last_name LIKE $2 OR u.email LIKE $2)
            "#,
        )
        .bind(role)
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::backend(OP, e))?;

        Ok(rows.iter().map(row_to_user).collect())
    }

    async fn application(&self, app_id: i64) -> StorageResult<Application> {
        const OP: &str = "storage.postgres.application";

        let row = sqlx::query("SELECT id, name, secret FROM applications WHERE id = $1")
            .bind(app_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::backend(OP, e))?;

        row.map(|r| Application {
            id: r.get("id"),
            name: r.get("name"),
            secret: r.get("secret"),
        })
        .ok_or(StorageError::ApplicationNotFound)
    }

    async fn link_user_role(&self, user_id: i64, role_id: i64) -> StorageResult<()> {
        const OP: &str = "storage.postgres.link_user_role";

        sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(role_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::backend(OP, e))?;

        Ok(())
    }

    async fn role_id(&self, role: &str) -> StorageResult<i64> {
        const OP: &str = "storage.postgres.role_id";

        let row = sqlx::query("SELECT id FROM roles WHERE role = $1")
            .bind(role)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::backend(OP, e))?;

        row.map(|r| r.get(0)).ok_or(StorageError::RoleNotFound)
    }

    async fn user_role(&self, user_id: i64) -> StorageResult<String> {
        const OP: &str = "storage.postgres.user_role";

        let row = sqlx::query(
            r#"
            SELECT r.role
            FROM roles r
            INNER JOIN user_roles ur ON r.id = ur.role_id
            WHERE ur.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::backend(OP, e))?;

        row.map(|r| r.get(0)).ok_or(StorageError::RoleNotFound)
    }

    async fn scope(&self, user_id: i64) -> StorageResult<Vec<String>> {
        const OP: &str = "storage.postgres.scope";

        let rows = sqlx::query(
            r#"
            SELECT p.slug
            FROM permissions p
            JOIN role_permissions rp ON p.id = rp.permission_id
            JOIN user_roles ur ON rp.role_id = ur.role_id
            WHERE ur.user_id = $1
            ORDER BY p.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::backend(OP, e))?;

        Ok(rows.iter().map(|r| r.get(0)).collect())
    }
}
