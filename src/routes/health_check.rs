use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::store::CredentialStore;

/// GET /api/v1/status
pub async fn status() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "message": "true" }))
}

/// GET /api/v1/health
///
/// Reports unhealthy (503) when the credential store cannot be reached.
pub async fn health_check(store: web::Data<dyn CredentialStore>) -> HttpResponse {
    tracing::debug!("Health check endpoint called");

    match store.ping().await {
        Ok(()) => HttpResponse::Ok().json(json!({
            "status": "healthy",
            "message": "Service is running",
            "database": "connected",
        })),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            HttpResponse::ServiceUnavailable().json(json!({
                "status": "unhealthy",
                "message": "Database connection failed",
            }))
        }
    }
}
