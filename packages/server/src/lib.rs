#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the safety map dashboard.
//!
//! Serves the JSON API the map frontend talks to: branch markers,
//! per-location statistics with a windowed trend, main-branch rollups and
//! the report lists behind a trend bar or category. Reports are read from
//! the configured [`ReportStore`] on every request.

pub mod config;
mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use safety_map_report_models::MonthLocale;
use safety_map_store::ReportStore;

pub use config::{ConfigError, ServerConfig, StoreConfig};

/// Shared application state.
pub struct AppState {
    /// Source of locations and reports.
    pub store: Arc<dyn ReportStore>,
    /// Language of trend labels.
    pub locale: MonthLocale,
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/locations", web::get().to(handlers::locations))
            .route("/locations/{id}/stats", web::get().to(handlers::stats))
            .route("/locations/{id}/hierarchy", web::get().to(handlers::hierarchy))
            .route("/locations/{id}/reports", web::get().to(handlers::reports)),
    );
}

/// Starts the safety map API server.
///
/// Opens the configured report store and serves the API on
/// `bind_addr:port`. The caller is responsible for providing the async
/// runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an error if the store cannot be opened, or the HTTP server
/// fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    log::info!("Opening report store...");
    let store = config.store.open().await?;

    let state = web::Data::new(AppState {
        store,
        locale: config.locale,
    });

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((config.bind_addr.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}
