#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! County aggregation, boundary fetching, and choropleth rendering.
//!
//! Prediction rows are collapsed to one [`CountyAggregate`] per geo code,
//! joined against county boundary polygons downloaded once from a remote
//! `GeoJSON` endpoint, and styled by risk category.
//!
//! [`CountyAggregate`]: yield_risk_geography_models::CountyAggregate

pub mod aggregate;
pub mod boundaries;
pub mod choropleth;

use thiserror::Error;

/// Errors that can occur during geography operations.
#[derive(Debug, Error)]
pub enum GeographyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not a valid `GeoJSON` `FeatureCollection`.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// Data conversion error.
    #[error("Conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}
