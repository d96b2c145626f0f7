//! # Sambal API Server
//!
//! Storefront backend: website forms, campaign triggers and the product
//! catalog, behind per-IP rate limits.

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

mod background;
mod config;
mod handlers;
mod middleware;
mod observability;
mod state;
mod telemetry;

use config::AppConfig;
use observability::RequestIdMiddleware;
use state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();
    telemetry::init_telemetry(&config.telemetry);

    tracing::info!(
        "Starting Sambal API Server on {}:{}",
        config.host,
        config.port
    );

    let state = AppState::new(&config).await?;
    let jobs = background::start(&config.scheduler, state.local_limiter.clone()).await?;

    let server_state = state.clone();
    let result = HttpServer::new(move || {
        App::new()
            .wrap(RequestIdMiddleware)
            .wrap(TracingLogger::default())
            .configure(|cfg| handlers::configure_app(cfg, server_state.clone()))
            .default_service(web::to(middleware::error::not_found))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await;

    jobs.shutdown().await;
    tracing::info!("Server stopped");
    result
}
