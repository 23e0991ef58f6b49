//! Auth service: Login and Register orchestration.

use std::sync::Arc;

use chrono::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use sigil_core::{CredentialStore, StorageError};

use crate::password::{self, PasswordError};
use crate::permissions::DEFAULT_ROLE;
use crate::token::{self, TokenError};

/// Service-boundary error taxonomy.
///
/// "No such email" and "wrong password" deliberately collapse into
/// [`AuthError::InvalidCredentials`] so callers cannot enumerate accounts.
/// Infrastructure faults propagate as [`AuthError::Storage`] and are never
/// masked behind the credential-failure kind.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid application id")]
    InvalidApplication,

    #[error("user already exists")]
    UserAlreadyExists,

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Storage(StorageError),
}

/// Stateless authentication/authorization service.
///
/// Holds only a storage handle and configuration; retry of failed storage
/// calls belongs to the caller's RPC fabric, never to this service.
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(store: Arc<dyn CredentialStore>, token_ttl: Duration) -> Self {
        Self { store, token_ttl }
    }

    /// Authenticate a user against an application and mint a signed token.
    ///
    /// Token claims: subject (user id), email, issued-at, expiry
    /// (now + configured TTL), role, space-joined scope.
    pub async fn login(&self, email: &str, password: &str, app_id: i64) -> Result<String, AuthError> {
        debug!(app_id, "attempting to login user");

        let user = match self.store.user_by_email(email).await {
            Ok(user) => user,
            Err(StorageError::UserNotFound) => {
                warn!("user not found");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => {
                error!(error = %e, "failed to get user");
                return Err(AuthError::Storage(e));
            }
        };

        if !password::verify(password, &user.pass_hash) {
            warn!(user_id = user.id, "invalid credentials");
            return Err(AuthError::InvalidCredentials);
        }

        debug!(user_id = user.id, "credentials valid");

        let application = match self.store.application(app_id).await {
            Ok(app) => app,
            Err(StorageError::ApplicationNotFound) => {
                warn!(app_id, "application not found");
                return Err(AuthError::InvalidApplication);
            }
            Err(e) => {
                error!(error = %e, "failed to get application");
                return Err(AuthError::Storage(e));
            }
        };

        let role = self.store.user_role(user.id).await.map_err(|e| {
            error!(error = %e, "failed to get user role");
            AuthError::Storage(e)
        })?;

        let scope = self.store.scope(user.id).await.map_err(|e| {
            error!(error = %e, "failed to get permission scope");
            AuthError::Storage(e)
        })?;

        let token = token::issue(&user, &application, self.token_ttl, &role, &scope)?;

        debug!(user_id = user.id, app_id, "token issued");

        Ok(token)
    }

    /// Register a new user and link them to the default role.
    ///
    /// Saving the user and linking the role are two single-row operations,
    /// not one transaction (faithful to the upstream design): if the link
    /// step fails after the user row exists, the error is surfaced and the
    /// roleless user row remains.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
        middle_name: &str,
    ) -> Result<i64, AuthError> {
        debug!("registering new user");

        let pass_hash = password::hash(password)?;

        let user_id = match self
            .store
            .save_user(email, &pass_hash, first_name, last_name, middle_name)
            .await
        {
            Ok(id) => id,
            Err(StorageError::UserAlreadyExists) => {
                warn!("user already exists");
                return Err(AuthError::UserAlreadyExists);
            }
            Err(e) => {
                error!(error = %e, "failed to save user");
                return Err(AuthError::Storage(e));
            }
        };

        let role_id = self.store.role_id(DEFAULT_ROLE).await.map_err(|e| {
            error!(error = %e, "failed to get default role id");
            AuthError::Storage(e)
        })?;

        self.store
            .link_user_role(user_id, role_id)
            .await
            .map_err(|e| {
                error!(error = %e, user_id, "failed to link user role");
                AuthError::Storage(e)
            })?;

        info!(user_id, "user registered");

        Ok(user_id)
    }
}
