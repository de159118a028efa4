use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{Credential, CredentialStore, NewCredential, StoreError};

/// In-memory store for development and tests.
///
/// Uniqueness is checked and the insert performed under one lock, so it
/// gives the same guarantee as the database constraint.
#[derive(Clone, Default)]
pub struct InMemoryCredentialStore {
    users: Arc<Mutex<HashMap<Uuid, Credential>>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, Credential>>, StoreError> {
        self.users
            .lock()
            .map_err(|_| StoreError::Database("credential map lock poisoned".to_string()))
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn create(&self, credential: NewCredential) -> Result<Credential, StoreError> {
        let mut users = self.lock()?;

        if users.values().any(|u| u.email == credential.email) {
            return Err(StoreError::DuplicateEmail);
        }

        let now = Utc::now();
        let created = Credential {
            id: Uuid::new_v4(),
            name: credential.name,
            email: credential.email,
            password_hash: credential.password_hash,
            created_at: now,
            updated_at: now,
        };
        users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Credential>, StoreError> {
        let users = self.lock()?;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Credential>, StoreError> {
        let users = self.lock()?;
        Ok(users.get(&id).cloned())
    }

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        let users = self.lock()?;
        Ok(users.values().any(|u| u.email == email))
    }
}
