#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the yield risk dashboard.
//!
//! Every dashboard page is exposed as a `GET` endpoint returning its
//! render descriptor as JSON. Tables are read from the data directory on
//! first use and cached for the life of the process; county boundaries are
//! fetched once, on the first risk map request.

mod handlers;

use std::path::PathBuf;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use yield_risk_dashboard::DashboardContext;
use yield_risk_dataset::DataStore;
use yield_risk_dataset::paths::{DEFAULT_DATA_DIR, DEFAULT_MODEL_PATH};
use yield_risk_geography::GeographyError;
use yield_risk_geography::boundaries::{BoundaryService, DEFAULT_BOUNDARIES_URL};
use yield_risk_model::PredictionAdapter;

/// Server startup failures.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Binding or running the HTTP server failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The boundary client could not be built.
    #[error(transparent)]
    Geography(#[from] GeographyError),
}

/// Startup configuration, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Listen address (`BIND_ADDR`).
    pub bind_addr: String,
    /// Listen port (`PORT`).
    pub port: u16,
    /// Directory holding the CSV tables (`YIELD_RISK_DATA_DIR`).
    pub data_dir: PathBuf,
    /// Serialized model artifact (`YIELD_RISK_MODEL_PATH`).
    pub model_path: PathBuf,
    /// County boundary `GeoJSON` source (`YIELD_RISK_BOUNDARIES_URL`).
    pub boundaries_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            boundaries_url: DEFAULT_BOUNDARIES_URL.to_string(),
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from the process environment. Unset or
    /// unparseable variables keep their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            data_dir: lookup("YIELD_RISK_DATA_DIR").map_or(defaults.data_dir, PathBuf::from),
            model_path: lookup("YIELD_RISK_MODEL_PATH").map_or(defaults.model_path, PathBuf::from),
            boundaries_url: lookup("YIELD_RISK_BOUNDARIES_URL").unwrap_or(defaults.boundaries_url),
        }
    }
}

/// Shared application state.
pub struct AppState {
    /// Tables and prediction adapter read by the pages.
    pub dashboard: DashboardContext,
    /// County boundary source for the risk map.
    pub boundaries: BoundaryService,
}

impl AppState {
    /// Builds the state described by `config`. The model is loaded
    /// eagerly; tables and boundaries are loaded on first use.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] if the boundary client cannot be built.
    pub fn from_config(config: &ServerConfig) -> Result<Self, ServerError> {
        log::info!("Reading tables from {}", config.data_dir.display());
        let store = DataStore::new(&config.data_dir);

        log::info!("Loading model from {}", config.model_path.display());
        let adapter = PredictionAdapter::load(&config.model_path);

        Ok(Self {
            dashboard: DashboardContext::new(store, adapter),
            boundaries: BoundaryService::new(config.boundaries_url.clone())?,
        })
    }
}

/// Registers every API route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/classify", web::get().to(handlers::classify))
            .service(
                web::scope("/pages")
                    .route("/overview", web::get().to(handlers::overview))
                    .route("/risk-map", web::get().to(handlers::risk_map))
                    .route("/county-explorer", web::get().to(handlers::county_explorer))
                    .route("/impact-modeler", web::get().to(handlers::impact_modeler))
                    .route("/analytics", web::get().to(handlers::analytics))
                    .route(
                        "/model-performance",
                        web::get().to(handlers::model_performance),
                    ),
            ),
    );
}

/// Starts the yield risk API server.
///
/// This is a regular async function; the caller provides the runtime
/// (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns [`ServerError`] if the state cannot be built or the HTTP
/// server fails to bind or run.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let state = web::Data::new(AppState::from_config(&config)?);

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((config.bind_addr, config.port))?
    .run()
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn missing_variables_keep_defaults() {
        let config = ServerConfig::from_lookup(|_| None);
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn variables_override_defaults() {
        let env = BTreeMap::from([
            ("PORT", "9000"),
            ("YIELD_RISK_DATA_DIR", "/srv/yield"),
            ("BIND_ADDR", "0.0.0.0"),
        ]);
        let config = ServerConfig::from_lookup(|key| env.get(key).map(ToString::to_string));

        assert_eq!(config.port, 9000);
        assert_eq!(config.bind_addr, "0.0.0.0");
        assert_eq!(config.data_dir, PathBuf::from("/srv/yield"));
        assert_eq!(config.boundaries_url, DEFAULT_BOUNDARIES_URL);
    }

    #[test]
    fn unparseable_port_is_ignored() {
        let config =
            ServerConfig::from_lookup(|key| (key == "PORT").then(|| "eighty".to_string()));
        assert_eq!(config.port, 8080);
    }
}
