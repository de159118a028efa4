use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::{CredentialService, TokenService};
use crate::error::{AppError, ValidationError};
use crate::logger::LoggerMiddleware;
use crate::metrics::Metrics;
use crate::middleware::JwtMiddleware;
use crate::routes::{
    health_check, logout, me, metrics, refresh_token, sign_in, sign_up, status,
};
use crate::store::CredentialStore;

/// Unparseable JSON bodies are validation failures (422), not 400s
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        AppError::from(ValidationError::InvalidBody(err.to_string())).into()
    })
}

pub fn run(
    listener: TcpListener,
    store: Arc<dyn CredentialStore>,
    tokens: Arc<TokenService>,
    metrics_registry: Arc<Metrics>,
) -> Result<Server, std::io::Error> {
    let credentials = web::Data::new(CredentialService::new(
        store.clone(),
        tokens.clone(),
        metrics_registry.clone(),
    ));
    let store = web::Data::from(store);
    let metrics_data = web::Data::from(metrics_registry.clone());

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(LoggerMiddleware::new(metrics_registry.clone()))

            // Shared state
            .app_data(json_config())
            .app_data(credentials.clone())
            .app_data(store.clone())
            .app_data(metrics_data.clone())

            .route("/metrics", web::get().to(metrics))
            .service(
                web::scope("/api/v1")
                    .route("/status", web::get().to(status))
                    .route("/health", web::get().to(health_check))
                    .service(
                        web::scope("/auth")
                            // Public routes
                            .route("/signup", web::post().to(sign_up))
                            .route("/signin", web::post().to(sign_in))
                            .route("/refresh-token", web::post().to(refresh_token))

                            // Protected routes (require a valid access token)
                            .service(
                                web::resource("/me")
                                    .wrap(JwtMiddleware::new(tokens.clone(), metrics_registry.clone()))
                                    .route(web::get().to(me)),
                            )
                            .service(
                                web::resource("/logout")
                                    .wrap(JwtMiddleware::new(tokens.clone(), metrics_registry.clone()))
                                    .route(web::post().to(logout)),
                            ),
                    ),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
