use actix_web::{web, HttpResponse};

use crate::error::AppError;
use crate::metrics::Metrics;
use crate::store::CredentialStore;

/// GET /metrics
///
/// Pool gauges are sampled from the store on every scrape.
pub async fn metrics(
    metrics: web::Data<Metrics>,
    store: web::Data<dyn CredentialStore>,
) -> Result<HttpResponse, AppError> {
    if let Some(stats) = store.pool_stats() {
        metrics.record_pool_stats(stats);
    }

    let body = metrics
        .render()
        .map_err(|e| AppError::Internal(format!("failed to encode metrics: {}", e)))?;

    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(body))
}
