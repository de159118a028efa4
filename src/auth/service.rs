/// Credential Service
///
/// Orchestrates registration, login, token refresh, profile lookup and
/// logout on top of the `TokenService` and a `CredentialStore`.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::claims::TokenType;
use crate::auth::jwt::{TokenError, TokenService};
use crate::auth::password::{hash_password, verify_dummy, verify_password};
use crate::metrics::Metrics;
use crate::store::{Credential, CredentialStore, NewCredential, StoreError, UserResponse};

pub const TOKEN_TYPE_BEARER: &str = "Bearer";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("email already registered")]
    EmailTaken,
    /// Unknown email and wrong password both end up here.
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("user not found")]
    NotFound,
    #[error("invalid refresh token: {0}")]
    InvalidRefreshToken(#[source] TokenError),
    #[error("internal error: {0}")]
    Internal(String),
}

fn internal(context: &str, err: impl std::fmt::Display) -> AuthError {
    AuthError::Internal(format!("{}: {}", context, err))
}

/// Result of a successful register, login or refresh
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

pub struct CredentialService {
    store: Arc<dyn CredentialStore>,
    tokens: Arc<TokenService>,
    metrics: Arc<Metrics>,
}

impl CredentialService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        tokens: Arc<TokenService>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            store,
            tokens,
            metrics,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Register a new credential and open a session for it.
    ///
    /// # Errors
    /// - `EmailTaken` if the email is already registered (including when a
    ///   concurrent registration wins the insert)
    /// - `Internal` on hashing, store or signing failure
    #[tracing::instrument(name = "register", skip(self, name, password))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let result = self.try_register(name, email, password).await;
        self.metrics.record_auth_attempt("signup", result.is_ok());
        result
    }

    async fn try_register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let exists = self
            .store
            .email_exists(email)
            .await
            .map_err(|e| internal("failed to check email existence", e))?;
        if exists {
            return Err(AuthError::EmailTaken);
        }

        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| internal("password hashing task failed", e))?
            .map_err(|e| internal("failed to hash password", e))?;

        let credential = self
            .store
            .create(NewCredential {
                name: name.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await
            .map_err(|e| match e {
                StoreError::DuplicateEmail => AuthError::EmailTaken,
                other => internal("failed to create user", other),
            })?;

        tracing::info!(user_id = %credential.id, "User registered successfully");
        self.open_session(&credential)
    }

    /// Verify an email/password pair and open a session.
    ///
    /// # Errors
    /// - `InvalidCredentials` for an unknown email or a wrong password
    /// - `Internal` on store or signing failure
    #[tracing::instrument(name = "login", skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let result = self.try_login(email, password).await;
        self.metrics.record_auth_attempt("signin", result.is_ok());
        result
    }

    async fn try_login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let credential = self
            .store
            .find_by_email(email)
            .await
            .map_err(|e| internal("failed to get user", e))?;

        let password = password.to_string();
        let Some(credential) = credential else {
            let _ = tokio::task::spawn_blocking(move || verify_dummy(&password)).await;
            return Err(AuthError::InvalidCredentials);
        };

        let password_hash = credential.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
            .await
            .map_err(|e| internal("password verification task failed", e))?;

        match verified {
            Ok(true) => {}
            Ok(false) => return Err(AuthError::InvalidCredentials),
            Err(e) => {
                tracing::error!(user_id = %credential.id, error = %e, "Stored password hash is unreadable");
                return Err(AuthError::InvalidCredentials);
            }
        }

        tracing::info!(user_id = %credential.id, "User logged in successfully");
        self.open_session(&credential)
    }

    /// Public profile of a credential
    ///
    /// # Errors
    /// `NotFound` if no credential has this id
    pub async fn get_by_id(&self, id: Uuid) -> Result<UserResponse, AuthError> {
        self.find(id).await.map(|credential| credential.to_response())
    }

    /// Trade a refresh token for a new access token.
    ///
    /// The same refresh token is handed back; it stays valid until its own
    /// expiry.
    ///
    /// # Errors
    /// - `InvalidRefreshToken` on any token failure
    /// - `NotFound` if the subject no longer exists
    #[tracing::instrument(name = "refresh", skip(self, refresh_token))]
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AuthError> {
        let result = self.try_refresh(refresh_token).await;
        self.metrics.record_auth_attempt("refresh", result.is_ok());
        result
    }

    async fn try_refresh(&self, refresh_token: &str) -> Result<AuthSession, AuthError> {
        let access = self
            .tokens
            .refresh_access(refresh_token)
            .map_err(AuthError::InvalidRefreshToken)?;

        let validated = self
            .tokens
            .validate(refresh_token, TokenType::Refresh)
            .map_err(AuthError::InvalidRefreshToken)?;
        let user_id = self
            .tokens
            .extract_subject(&validated)
            .map_err(AuthError::InvalidRefreshToken)?;

        let user = self.get_by_id(user_id).await?;
        self.metrics.record_token_issued();

        tracing::info!(user_id = %user_id, "Access token refreshed");
        Ok(AuthSession {
            user,
            access_token: access.token,
            refresh_token: refresh_token.to_string(),
            token_type: TOKEN_TYPE_BEARER,
            expires_in: access.expires_in,
        })
    }

    /// Log a user out.
    ///
    /// Tokens are stateless, so this only confirms the user exists; tokens
    /// already issued stay valid until they expire.
    ///
    /// # Errors
    /// `NotFound` if no credential has this id
    pub async fn logout(&self, id: Uuid) -> Result<(), AuthError> {
        self.find(id).await?;
        tracing::info!(user_id = %id, "User logged out");
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Credential, AuthError> {
        self.store
            .find_by_id(id)
            .await
            .map_err(|e| internal("failed to get user", e))?
            .ok_or(AuthError::NotFound)
    }

    fn open_session(&self, credential: &Credential) -> Result<AuthSession, AuthError> {
        let pair = self
            .tokens
            .generate_token_pair(credential)
            .map_err(|e| internal("failed to generate tokens", e))?;
        self.metrics.record_token_issued();

        Ok(AuthSession {
            user: credential.to_response(),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: TOKEN_TYPE_BEARER,
            expires_in: pair.expires_in,
        })
    }
}
