use std::net::TcpListener;
use std::sync::Arc;

use inventory_api::auth::TokenService;
use inventory_api::configuration::get_configuration;
use inventory_api::metrics::Metrics;
use inventory_api::startup::run;
use inventory_api::store::PostgresCredentialStore;
use inventory_api::telemetry::init_telemetry;
use sqlx::postgres::PgPoolOptions;

fn startup_error(kind: std::io::ErrorKind, message: &'static str) -> std::io::Error {
    std::io::Error::new(kind, message)
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("Starting application");

    let configuration = get_configuration().map_err(|e| {
        tracing::error!("Failed to read configuration: {}", e);
        startup_error(std::io::ErrorKind::InvalidInput, "Configuration error")
    })?;
    tracing::info!("Configuration loaded successfully");

    let tokens = TokenService::new(&configuration.jwt).map_err(|e| {
        tracing::error!("Invalid JWT configuration: {}", e);
        startup_error(std::io::ErrorKind::InvalidInput, "JWT configuration error")
    })?;

    let metrics = Metrics::new().map_err(|e| {
        tracing::error!("Failed to register metrics: {}", e);
        startup_error(std::io::ErrorKind::Other, "Metrics registry error")
    })?;

    tracing::info!("Attempting to connect to database");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&configuration.database.connection_string())
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            startup_error(std::io::ErrorKind::ConnectionRefused, "Database connection error")
        })?;

    sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
        tracing::error!("Failed to run migrations: {}", e);
        startup_error(std::io::ErrorKind::Other, "Database migration error")
    })?;
    tracing::info!("Database ready");

    let address = configuration.application.address();
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let server = run(
        listener,
        Arc::new(PostgresCredentialStore::new(pool)),
        Arc::new(tokens),
        Arc::new(metrics),
    )?;

    server.await
}
