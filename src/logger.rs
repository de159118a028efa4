use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures::future::LocalBoxFuture;
use log::info;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use crate::metrics::Metrics;

/// Request logger middleware
///
/// Logs each request and records it in the HTTP metrics, labelled with the
/// matched route pattern rather than the raw path.
pub struct LoggerMiddleware {
    metrics: Arc<Metrics>,
}

impl LoggerMiddleware {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self { metrics }
    }
}

impl<S, B> Transform<S, ServiceRequest> for LoggerMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = LoggerMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(LoggerMiddlewareService {
            service: Rc::new(service),
            metrics: self.metrics.clone(),
        }))
    }
}

pub struct LoggerMiddlewareService<S> {
    service: Rc<S>,
    metrics: Arc<Metrics>,
}

impl<S, B> Service<ServiceRequest> for LoggerMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start_time = Instant::now();
        let method = req.method().to_string();
        let path = req.path().to_string();

        info!("Request started: {} {}", method, path);

        let service = self.service.clone();
        let metrics = self.metrics.clone();
        metrics.http_requests_in_flight.inc();

        Box::pin(async move {
            let result = service.call(req).await;
            metrics.http_requests_in_flight.dec();

            let elapsed = start_time.elapsed();
            // Errors raised by inner middleware have not been rendered yet
            let (status, route) = match &result {
                Ok(res) => (
                    res.status(),
                    res.request()
                        .match_pattern()
                        .unwrap_or_else(|| "unmatched".to_string()),
                ),
                Err(e) => (e.as_response_error().status_code(), path.clone()),
            };

            metrics.record_http_request(&method, &route, status.as_u16(), elapsed);
            info!(
                "Request completed: {} {} - Status: {} ({}ms)",
                method,
                path,
                status.as_u16(),
                elapsed.as_millis()
            );

            result
        })
    }
}
