//! Integration tests for the status, health and metrics endpoints

use std::net::TcpListener;
use std::sync::Arc;

use async_trait::async_trait;
use inventory_api::auth::TokenService;
use inventory_api::configuration::JwtSettings;
use inventory_api::metrics::Metrics;
use inventory_api::startup::run;
use inventory_api::store::{
    Credential, CredentialStore, InMemoryCredentialStore, NewCredential, PoolStats, StoreError,
};
use serde_json::Value;
use uuid::Uuid;

fn spawn_app_with_store(store: Arc<dyn CredentialStore>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let jwt = JwtSettings {
        secret: "health-access-secret".to_string(),
        refresh_secret: "health-refresh-secret".to_string(),
        access_token_expiry: 900,
        refresh_token_expiry: 604800,
        issuer: "pseudo-app".to_string(),
    };
    let tokens = Arc::new(TokenService::new(&jwt).expect("Invalid JWT settings"));
    let metrics = Arc::new(Metrics::new().expect("Failed to create metrics"));
    let server = run(listener, store, tokens, metrics).expect("Failed to create server");

    let _ = tokio::spawn(async move {
        let _ = server.await;
    });

    format!("http://127.0.0.1:{}", port)
}

fn spawn_app() -> String {
    spawn_app_with_store(Arc::new(InMemoryCredentialStore::new()))
}

/// Store whose connectivity probe always fails
struct UnreachableStore;

#[async_trait]
impl CredentialStore for UnreachableStore {
    async fn create(&self, _credential: NewCredential) -> Result<Credential, StoreError> {
        Err(StoreError::Database("unreachable".to_string()))
    }
    async fn find_by_email(&self, _email: &str) -> Result<Option<Credential>, StoreError> {
        Err(StoreError::Database("unreachable".to_string()))
    }
    async fn find_by_id(&self, _id: Uuid) -> Result<Option<Credential>, StoreError> {
        Err(StoreError::Database("unreachable".to_string()))
    }
    async fn email_exists(&self, _email: &str) -> Result<bool, StoreError> {
        Err(StoreError::Database("unreachable".to_string()))
    }
    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::Database("unreachable".to_string()))
    }
}

/// In-memory store that reports a fixed connection pool
struct PooledStore {
    inner: InMemoryCredentialStore,
    stats: PoolStats,
}

#[async_trait]
impl CredentialStore for PooledStore {
    async fn create(&self, credential: NewCredential) -> Result<Credential, StoreError> {
        self.inner.create(credential).await
    }
    async fn find_by_email(&self, email: &str) -> Result<Option<Credential>, StoreError> {
        self.inner.find_by_email(email).await
    }
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Credential>, StoreError> {
        self.inner.find_by_id(id).await
    }
    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        self.inner.email_exists(email).await
    }
    fn pool_stats(&self) -> Option<PoolStats> {
        Some(self.stats)
    }
}

#[tokio::test]
async fn status_works() {
    let addr = spawn_app();

    let response = reqwest::Client::new()
        .get(&format!("{}/api/v1/status", addr))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "true");
}

#[tokio::test]
async fn health_check_reports_healthy_store() {
    let addr = spawn_app();

    let response = reqwest::Client::new()
        .get(&format!("{}/api/v1/health", addr))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn health_check_reports_unreachable_store() {
    let addr = spawn_app_with_store(Arc::new(UnreachableStore));

    let response = reqwest::Client::new()
        .get(&format!("{}/api/v1/health", addr))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(503, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "unhealthy");
}

#[tokio::test]
async fn store_failure_on_signup_is_a_500_without_details() {
    let addr = spawn_app_with_store(Arc::new(UnreachableStore));

    let response = reqwest::Client::new()
        .post(&format!("{}/api/v1/auth/signup", addr))
        .json(&serde_json::json!({
            "name": "John",
            "email": "john@example.com",
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(500, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "INTERNAL_ERROR");
    assert_eq!(body["error"], "Internal server error");
}

#[tokio::test]
async fn metrics_expose_request_counters() {
    let addr = spawn_app();
    let client = reqwest::Client::new();

    client
        .get(&format!("{}/api/v1/status", addr))
        .send()
        .await
        .expect("Failed to execute request");

    let response = client
        .get(&format!("{}/metrics", addr))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(200, response.status().as_u16());
    let body = response.text().await.unwrap();
    assert!(body.contains(
        "http_requests_total{method=\"GET\",path=\"/api/v1/status\",status=\"200\"} 1"
    ));
}

#[tokio::test]
async fn metrics_sample_connection_pool_on_scrape() {
    let addr = spawn_app_with_store(Arc::new(PooledStore {
        inner: InMemoryCredentialStore::new(),
        stats: PoolStats { active: 3, idle: 2 },
    }));

    let response = reqwest::Client::new()
        .get(&format!("{}/metrics", addr))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(200, response.status().as_u16());
    let body = response.text().await.unwrap();
    assert!(body.contains("db_connections_active 3"));
    assert!(body.contains("db_connections_idle 2"));
}
