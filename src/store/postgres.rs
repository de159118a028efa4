use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{Credential, CredentialStore, NewCredential, PoolStats, StoreError};

type CredentialRow = (Uuid, String, String, String, DateTime<Utc>, DateTime<Utc>);

fn into_credential(row: CredentialRow) -> Credential {
    let (id, name, email, password_hash, created_at, updated_at) = row;
    Credential {
        id,
        name,
        email,
        password_hash,
        created_at,
        updated_at,
    }
}

/// Postgres-backed store over the `users` table.
///
/// Email uniqueness is a table constraint; see `migrations/`.
#[derive(Clone)]
pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn create(&self, credential: NewCredential) -> Result<Credential, StoreError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, CredentialRow>(
            r#"
            INSERT INTO users (id, name, email, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&credential.name)
        .bind(&credential.email)
        .bind(&credential.password_hash)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(into_credential(row))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Credential>, StoreError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(into_credential))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Credential>, StoreError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(into_credential))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn pool_stats(&self) -> Option<PoolStats> {
        let size = self.pool.size();
        let idle = u32::try_from(self.pool.num_idle()).unwrap_or(size);
        Some(PoolStats {
            active: size.saturating_sub(idle),
            idle,
        })
    }
}
