/// JWT Authentication Middleware
///
/// Validates the bearer access token from the Authorization header and
/// injects the authenticated user into request extensions.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{TokenError, TokenService};
use crate::error::AppError;
use crate::metrics::Metrics;

/// Identity taken from a validated access token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub email: String,
}

/// Returns the token of a `Bearer <token>` header value
pub fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn authenticate(tokens: &TokenService, token: &str) -> Result<AuthenticatedUser, TokenError> {
    let validated = tokens.validate_access(token)?;
    let id = tokens.extract_subject(&validated)?;
    Ok(AuthenticatedUser {
        id,
        email: validated.claims().email.clone(),
    })
}

/// JWT middleware for protecting routes
pub struct JwtMiddleware {
    tokens: Arc<TokenService>,
    metrics: Arc<Metrics>,
}

impl JwtMiddleware {
    pub fn new(tokens: Arc<TokenService>, metrics: Arc<Metrics>) -> Self {
        Self { tokens, metrics }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtMiddlewareService {
            service: Rc::new(service),
            tokens: self.tokens.clone(),
            metrics: self.metrics.clone(),
        }))
    }
}

pub struct JwtMiddlewareService<S> {
    service: Rc<S>,
    tokens: Arc<TokenService>,
    metrics: Arc<Metrics>,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
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
        let token = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(bearer_token)
            .map(str::to_string);

        let Some(token) = token else {
            tracing::warn!(path = %req.path(), "Missing or invalid Authorization header");
            return Box::pin(async { Err(Error::from(AppError::MissingToken)) });
        };

        match authenticate(&self.tokens, &token) {
            Ok(user) => {
                self.metrics.record_token_validation("valid");
                tracing::debug!(user_id = %user.id, "JWT validated successfully");

                req.extensions_mut().insert(user);
                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(e) => {
                let status = if e == TokenError::Expired { "expired" } else { "invalid" };
                self.metrics.record_token_validation(status);
                tracing::warn!(error = %e, "JWT validation failed");

                Box::pin(async move { Err(Error::from(AppError::Token(e))) })
            }
        }
    }
}
