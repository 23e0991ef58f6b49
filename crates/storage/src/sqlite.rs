//! Embedded-file credential store backed by SQLite (sqlx).

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use sigil_core::{Application, CredentialStore, StorageError, StorageResult, User};

/// SQLite-backed store.
///
/// Safe for concurrent use after construction; single-row atomicity comes
/// from SQLite itself. The email uniqueness constraint is the only conflict
/// this backend recognizes specially.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) an embedded store at `path` and ensure
    /// the schema exists.
    pub async fn open(path: &str) -> StorageResult<Self> {
        const OP: &str = "storage.sqlite.open";

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| StorageError::backend(OP, e))?;

        let store = Self { pool };
        store.ensure_schema().await?;

        debug!(path, "sqlite store opened");

        Ok(store)
    }

    /// Open an in-memory store (tests, dev).
    ///
    /// A single connection is used so the whole pool sees one database.
    pub async fn in_memory() -> StorageResult<Self> {
        const OP: &str = "storage.sqlite.in_memory";

        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| StorageError::backend(OP, e))?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::backend(OP, e))?;

        let store = Self { pool };
        store.ensure_schema().await?;

        Ok(store)
    }

    /// Create the minimum schema if it does not exist yet.
    async fn ensure_schema(&self) -> StorageResult<()> {
        const OP: &str = "storage.sqlite.ensure_schema";

        const SCHEMA: &[&str] = &[
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                email       TEXT NOT NULL UNIQUE,
                pass_hash   TEXT NOT NULL,
                first_name  TEXT NOT NULL,
                last_name   TEXT NOT NULL,
                middle_name TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS applications (
                id     INTEGER PRIMARY KEY AUTOINCREMENT,
                name   TEXT NOT NULL,
                secret TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS roles (
                id   INTEGER PRIMARY KEY AUTOINCREMENT,
                role TEXT NOT NULL UNIQUE
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS user_roles (
                user_id INTEGER NOT NULL,
                role_id INTEGER NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS permissions (
                id   INTEGER PRIMARY KEY AUTOINCREMENT,
                slug TEXT NOT NULL UNIQUE
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS role_permissions (
                role_id       INTEGER NOT NULL,
                permission_id INTEGER NOT NULL
            )
            "#,
        ];

        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| StorageError::backend(OP, e))?;
        }

        Ok(())
    }

    /// Seed the platform's role and permission vocabulary (idempotent).
    pub async fn seed_defaults(&self) -> StorageResult<()> {
        const OP: &str = "storage.sqlite.seed_defaults";

        for (role, scopes) in super::DEFAULT_ROLE_SCOPES {
            sqlx::query("INSERT OR IGNORE INTO roles (role) VALUES (?)")
                .bind(*role)
                .execute(&self.pool)
                .await
                .map_err(|e| StorageError::backend(OP, e))?;

            let role_id: i64 = sqlx::query("SELECT id FROM roles WHERE role = ?")
                .bind(*role)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| StorageError::backend(OP, e))?
                .get(0);

            for slug in *scopes {
                sqlx::query("INSERT OR IGNORE INTO permissions (slug) VALUES (?)")
                    .bind(*slug)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| StorageError::backend(OP, e))?;

                let permission_id: i64 = sqlx::query("SELECT id FROM permissions WHERE slug = ?")
                    .bind(*slug)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(|e| StorageError::backend(OP, e))?
                    .get(0);

                sqlx::query(
                    r#"
                    INSERT INTO role_permissions (role_id, permission_id)
                    SELECT ?, ?
                    WHERE NOT EXISTS (
                        SELECT 1 FROM role_permissions
                        WHERE role_id = ? AND permission_id = ?
                    )
                    "#,
                )
                .bind(role_id)
                .bind(permission_id)
                .bind(role_id)
                .bind(permission_id)
                .execute(&self.pool)
                .await
                .map_err(|e| StorageError::backend(OP, e))?;
            }
        }

        Ok(())
    }

    /// Register an application (tenant); returns its id.
    pub async fn insert_application(&self, name: &str, secret: &str) -> StorageResult<i64> {
        const OP: &str = "storage.sqlite.insert_application";

        let row = sqlx::query("INSERT INTO applications (name, secret) VALUES (?, ?) RETURNING id")
            .bind(name)
            .bind(secret)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StorageError::backend(OP, e))?;

        Ok(row.get(0))
    }
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> User {
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
impl CredentialStore for SqliteStore {
    async fn save_user(
        &self,
        email: &str,
        pass_hash: &str,
        first_name: &str,
        last_name: &str,
        middle_name: &str,
    ) -> StorageResult<i64> {
        const OP: &str = "storage.sqlite.save_user";

        let result = sqlx::query(
            r#"
            INSERT INTO users (email, pass_hash, first_name, last_name, middle_name)
            VALUES (?, ?, ?, ?, ?)
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
        const OP: &str = "storage.sqlite.user_by_email";

        let row = sqlx::query(
            r#"
            SELECT id, email, pass_hash, first_name, last_name, middle_name
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::backend(OP, e))?;

        row.map(|r| row_to_user(&r)).ok_or(StorageError::UserNotFound)
    }

    async fn user_exists(&self, user_id: i64) -> StorageResult<bool> {
        const OP: &str = "storage.sqlite.user_exists";

        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StorageError::backend(OP, e))?;

        Ok(row.get::<i64, _>(0) != 0)
    }

    async fn list_users(&self, role: &str, search: &str) -> StorageResult<Vec<User>> {
        const OP: &str = "storage.sqlite.list_users";

        let pattern = format!("%{search}%");
        let rows = sqlx::query(
            r#"
            SELECT u.id, u.email, u.pass_hash, u.first_name, u.last_name, u.middle_name
            FROM users u
            JOIN user_roles ur ON u.id = ur.user_id
            JOIN roles r ON ur.role_id = r.id
            WHERE r.role = ?
              AND (u.first_name LIKE ? OR u.last_name LIKE ? OR u.email LIKE ?)
            "#,
        )
        .bind(role)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::backend(OP, e))?;

        Ok(rows.iter().map(row_to_user).collect())
    }

    async fn application(&self, app_id: i64) -> StorageResult<Application> {
        const OP: &str = "storage.sqlite.application";

        let row = sqlx::query("SELECT id, name, secret FROM applications WHERE id = ?")
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
        const OP: &str = "storage.sqlite.link_user_role";

        sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(role_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::backend(OP, e))?;

        Ok(())
    }

    async fn role_id(&self, role: &str) -> StorageResult<i64> {
        const OP: &str = "storage.sqlite.role_id";

        let row = sqlx::query("SELECT id FROM roles WHERE role = ?")
            .bind(role)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::backend(OP, e))?;

        row.map(|r| r.get(0)).ok_or(StorageError::RoleNotFound)
    }

    async fn user_role(&self, user_id: i64) -> StorageResult<String> {
        const OP: &str = "storage.sqlite.user_role";

        let row = sqlx::query(
            r#"
            SELECT r.role
            FROM roles r
            INNER JOIN user_roles ur ON r.id = ur.role_id
            WHERE ur.user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::backend(OP, e))?;

        row.map(|r| r.get(0)).ok_or(StorageError::RoleNotFound)
    }

    async fn scope(&self, user_id: i64) -> StorageResult<Vec<String>> {
        const OP: &str = "storage.sqlite.scope";

        let rows = sqlx::query(
            r#"
            SELECT p.slug
            FROM permissions p
            JOIN role_permissions rp ON p.id = rp.permission_id
            JOIN user_roles ur ON rp.role_id = ur.role_id
            WHERE ur.user_id = ?
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
