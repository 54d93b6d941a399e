#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the safety map.
//!
//! Loads an incident/facility snapshot into memory at startup and serves
//! the risk engine's queries under `/api/safety`. Engine calls are
//! CPU-bound and run on the blocking thread pool.

mod handlers;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use safety_map_risk::{ConfigError, RiskConfig, RiskError, SafetyEngine};
use safety_map_store::{InMemoryStore, StoreError};
use thiserror::Error;

/// Snapshot loaded when `SAFETY_MAP_DATA` is unset.
pub const DEFAULT_DATA_PATH: &str = "data/sample_snapshot.json";

/// Errors that can stop the server from starting.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Binding or running the HTTP server failed.
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot could not be loaded.
    #[error("Failed to load snapshot: {0}")]
    Store(#[from] StoreError),

    /// The risk config could not be loaded.
    #[error("Failed to load config: {0}")]
    Config(#[from] ConfigError),

    /// The engine rejected its configuration.
    #[error("Failed to build engine: {0}")]
    Risk(#[from] RiskError),
}

/// Shared application state.
pub struct AppState {
    /// Risk engine over the loaded snapshot.
    pub engine: Arc<SafetyEngine<InMemoryStore>>,
}

impl AppState {
    /// Loads the snapshot at `data_path` and the optional config override,
    /// and builds the engine.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] if either file cannot be loaded or the
    /// config is invalid.
    pub fn load(data_path: &Path, config_path: Option<&Path>) -> Result<Self, ServerError> {
        let config = RiskConfig::load(config_path)?;
        let store = InMemoryStore::load(data_path)?;
        Ok(Self::new(SafetyEngine::new(store, config)?))
    }

    /// Wraps an already built engine.
    #[must_use]
    pub fn new(engine: SafetyEngine<InMemoryStore>) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .service(
                web::scope("/safety")
                    .route("/risk", web::get().to(handlers::risk))
                    .route("/choropleth", web::get().to(handlers::choropleth))
                    .route("/zones", web::get().to(handlers::zones))
                    .route("/analyze", web::get().to(handlers::analyze))
                    .route("/nearby-incidents", web::get().to(handlers::nearby_incidents))
                    .route("/facilities", web::get().to(handlers::facilities)),
            ),
    );
}

/// Starts the safety map API server.
///
/// Reads `SAFETY_MAP_DATA` (snapshot path), `SAFETY_MAP_CONFIG` (optional
/// TOML override), `BIND_ADDR` and `PORT` from the environment. This is a
/// regular async function; the caller provides the runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns [`ServerError`] if the snapshot or config cannot be loaded, or
/// the HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> Result<(), ServerError> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let data_path =
        std::env::var("SAFETY_MAP_DATA").map_or_else(|_| PathBuf::from(DEFAULT_DATA_PATH), PathBuf::from);
    let config_path = std::env::var("SAFETY_MAP_CONFIG").ok().map(PathBuf::from);

    let state = web::Data::new(AppState::load(&data_path, config_path.as_deref())?);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await?;

    Ok(())
}
