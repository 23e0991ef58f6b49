//! In-memory credential store (tests and local development).

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use sigil_core::{Application, CredentialStore, StorageError, StorageResult, User};

#[derive(Debug, Default)]
struct Inner {
    users: Vec<User>,
    next_user_id: i64,
    applications: Vec<Application>,
    next_app_id: i64,
    /// role id → role name
    roles: HashMap<i64, String>,
    next_role_id: i64,
    /// (user id, role id)
    user_roles: Vec<(i64, i64)>,
    /// role id → permission slugs
    role_permissions: HashMap<i64, Vec<String>>,
}

/// Mutex-protected in-memory store.
///
/// Single-row atomicity falls out of the lock; like the real backends there
/// is no cross-operation transaction, so the two-step registration gap is
/// reproducible here too.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an application (tenant); returns its id.
    ///
    /// Applications are created out-of-band in production; this stands in
    /// for that administrative process.
    pub async fn insert_application(&self, name: &str, secret: &str) -> StorageResult<i64> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_app_id += 1;
        let id = inner.next_app_id;
        inner.applications.push(Application {
            id,
            name: name.to_string(),
            secret: secret.to_string(),
        });
        Ok(id)
    }

    /// Create a role; returns its id.
    pub async fn insert_role(&self, role: &str) -> StorageResult<i64> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_role_id += 1;
        let id = inner.next_role_id;
        inner.roles.insert(id, role.to_string());
        Ok(id)
    }

    /// Attach a permission slug to a role.
    pub async fn grant_permission(&self, role_id: i64, slug: &str) -> StorageResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .role_permissions
            .entry(role_id)
            .or_default()
            .push(slug.to_string());
        Ok(())
    }

    /// Seed the platform's role and permission vocabulary.
    pub async fn seed_defaults(&self) -> StorageResult<()> {
        for (role, scopes) in super::DEFAULT_ROLE_SCOPES {
            let role_id = self.insert_role(role).await?;
            for slug in *scopes {
                self.grant_permission(role_id, slug).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn save_user(
        &self,
        email: &str,
        pass_hash: &str,
        first_name: &str,
        last_name: &str,
        middle_name: &str,
    ) -> StorageResult<i64> {
        let mut inner = self.inner.lock().unwrap();

        if inner.users.iter().any(|u| u.email == email) {
            return Err(StorageError::UserAlreadyExists);
        }

        inner.next_user_id += 1;
        let id = inner.next_user_id;
        inner.users.push(User {
            id,
            email: email.to_string(),
            pass_hash: pass_hash.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            middle_name: middle_name.to_string(),
        });

        Ok(id)
    }

    async fn user_by_email(&self, email: &str) -> StorageResult<User> {
        let inner = self.inner.lock().unwrap();
        inner
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(StorageError::UserNotFound)
    }

    async fn user_exists(&self, user_id: i64) -> StorageResult<bool> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().any(|u| u.id == user_id))
    }

    async fn list_users(&self, role: &str, search: &str) -> StorageResult<Vec<User>> {
        let inner = self.inner.lock().unwrap();

        let role_id = inner
            .roles
            .iter()
            .find(|(_, name)| name.as_str() == role)
            .map(|(id, _)| *id);

        let Some(role_id) = role_id else {
            return Ok(Vec::new());
        };

        Ok(inner
            .users
            .iter()
            .filter(|u| {
                inner
                    .user_roles
                    .iter()
                    .any(|(uid, rid)| *uid == u.id && *rid == role_id)
            })
            .filter(|u| {
                u.first_name.contains(search)
                    || u.last_name.contains(search)
                    || u.email.contains(search)
            })
            .cloned()
            .collect())
    }

    async fn application(&self, app_id: i64) -> StorageResult<Application> {
        let inner = self.inner.lock().unwrap();
        inner
            .applications
            .iter()
            .find(|a| a.id == app_id)
            .cloned()
            .ok_or(StorageError::ApplicationNotFound)
    }

    async fn link_user_role(&self, user_id: i64, role_id: i64) -> StorageResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.user_roles.push((user_id, role_id));
        Ok(())
    }

    async fn role_id(&self, role: &str) -> StorageResult<i64> {
        let inner = self.inner.lock().unwrap();
        inner
            .roles
            .iter()
            .find(|(_, name)| name.as_str() == role)
            .map(|(id, _)| *id)
            .ok_or(StorageError::RoleNotFound)
    }

    async fn user_role(&self, user_id: i64) -> StorageResult<String> {
        let inner = self.inner.lock().unwrap();
        inner
            .user_roles
            .iter()
            .find(|(uid, _)| *uid == user_id)
            .and_then(|(_, rid)| inner.roles.get(rid).cloned())
            .ok_or(StorageError::RoleNotFound)
    }

    async fn scope(&self, user_id: i64) -> StorageResult<Vec<String>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .user_roles
            .iter()
            .filter(|(uid, _)| *uid == user_id)
            .flat_map(|(_, rid)| {
                inner
                    .role_permissions
                    .get(rid)
                    .cloned()
                    .unwrap_or_default()
            })
            .collect())
    }
}
