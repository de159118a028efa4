/// Credential Store
///
/// Persistence boundary for user credentials. The auth services only see the
/// `CredentialStore` trait; Postgres backs it in production and an in-memory
/// map backs it in tests and local development.

mod memory;
mod postgres;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

pub use memory::InMemoryCredentialStore;
pub use postgres::PostgresCredentialStore;

/// A persisted user credential.
///
/// Deliberately not `Serialize`: the password hash must never leave the
/// service. Use [`Credential::to_response`] for anything caller-facing.
#[derive(Clone)]
pub struct Credential {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Credential {
    pub fn to_response(&self) -> UserResponse {
        UserResponse {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password_hash", &"[redacted]")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Data needed to insert a credential; id and timestamps are assigned by the store.
pub struct NewCredential {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Public projection of a credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("email already registered")]
    DuplicateEmail,
    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
                StoreError::DuplicateEmail
            }
            other => StoreError::Database(other.to_string()),
        }
    }
}

/// Connection pool occupancy, for stores backed by a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub active: u32,
    pub idle: u32,
}

/// Storage operations the auth services depend on.
///
/// `create` must enforce email uniqueness itself and report a clash as
/// [`StoreError::DuplicateEmail`]; callers' `email_exists` pre-checks race.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn create(&self, credential: NewCredential) -> Result<Credential, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Credential>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Credential>, StoreError>;
    async fn email_exists(&self, email: &str) -> Result<bool, StoreError>;

    /// Cheap connectivity probe used by the health endpoint.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn pool_stats(&self) -> Option<PoolStats> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential() -> Credential {
        Credential {
            id: Uuid::new_v4(),
            name: "John".to_string(),
            email: "john@example.com".to_string(),
            password_hash: "$2b$12$secret".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn debug_output_redacts_password_hash() {
        let rendered = format!("{:?}", credential());
        assert!(!rendered.contains("$2b$12$secret"));
        assert!(rendered.contains("[redacted]"));
    }

    #[test]
    fn public_projection_has_no_password_field() {
        let cred = credential();
        let json = serde_json::to_value(cred.to_response()).unwrap();

        assert_eq!(json["email"], "john@example.com");
        assert_eq!(json["id"], cred.id.to_string());
        assert!(json.get("password").is_none());
        assert!(json.get("password_hash").is_none());
    }

    #[derive(Debug, Error)]
    #[error("{message}")]
    struct PgError {
        code: &'static str,
        message: &'static str,
    }

    impl sqlx::error::DatabaseError for PgError {
        fn message(&self) -> &str {
            self.message
        }

        fn code(&self) -> Option<std::borrow::Cow<'_, str>> {
            Some(std::borrow::Cow::Borrowed(self.code))
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }
    }

    fn database_error(code: &'static str, message: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(PgError { code, message }))
    }

    #[test]
    fn unique_violation_maps_to_duplicate_email() {
        let err = database_error(
            "23505",
            "duplicate key value violates unique constraint \"users_email_key\"",
        );
        assert!(matches!(StoreError::from(err), StoreError::DuplicateEmail));
    }

    #[test]
    fn other_database_errors_keep_their_message() {
        let err = database_error("23503", "insert violates foreign key constraint");
        match StoreError::from(err) {
            StoreError::Database(message) => assert!(message.contains("foreign key")),
            other => panic!("expected Database error, got {:?}", other),
        }
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        assert!(matches!(
            StoreError::from(sqlx::Error::RowNotFound),
            StoreError::NotFound
        ));
    }
}
