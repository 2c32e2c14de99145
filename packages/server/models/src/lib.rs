#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the yield risk server.
//!
//! Query types mirror the dashboard's widget state. They are kept separate
//! from the domain inputs so that missing parameters can fall back to the
//! widget defaults.

use serde::{Deserialize, Serialize};
use yield_risk_model::{CropType, ScenarioParams};
use yield_risk_risk_models::{RiskCategory, try_classify};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// Query parameters for the risk map page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskMapQuery {
    /// Case-insensitive county or state substring.
    pub search: Option<String>,
}

/// Query parameters for the county explorer page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountyExplorerQuery {
    /// `"County, State"` option label.
    pub county: Option<String>,
    /// Crop to show for the county.
    pub crop: Option<String>,
}

/// Query parameters for the impact modeler page. Missing values use the
/// slider defaults.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactModelerQuery {
    /// Mean temperature change (°C).
    pub temp_mean_change: Option<f64>,
    /// Temperature variability change (°C).
    pub temp_std_change: Option<f64>,
    /// Maximum temperature change (°C).
    pub temp_max_change: Option<f64>,
    /// Change in days above 35°C.
    pub extreme_heat_days_change: Option<f64>,
    /// NDVI mean change.
    pub ndvi_mean_change: Option<f64>,
    /// NDVI variability change.
    pub ndvi_std_change: Option<f64>,
    /// Relative humidity change (%).
    pub humidity_change: Option<f64>,
    /// Baseline yield mean.
    pub early_yield_mean: Option<f64>,
    /// Baseline yield CV (%).
    pub early_yield_cv: Option<f64>,
    /// Crop type.
    pub crop: Option<CropType>,
}

impl From<ImpactModelerQuery> for ScenarioParams {
    fn from(query: ImpactModelerQuery) -> Self {
        let defaults = Self::default();
        Self {
            temp_mean_change: query.temp_mean_change.unwrap_or(defaults.temp_mean_change),
            temp_std_change: query.temp_std_change.unwrap_or(defaults.temp_std_change),
            temp_max_change: query.temp_max_change.unwrap_or(defaults.temp_max_change),
            extreme_heat_days_change: query
                .extreme_heat_days_change
                .unwrap_or(defaults.extreme_heat_days_change),
            ndvi_mean_change: query.ndvi_mean_change.unwrap_or(defaults.ndvi_mean_change),
            ndvi_std_change: query.ndvi_std_change.unwrap_or(defaults.ndvi_std_change),
            humidity_change: query.humidity_change.unwrap_or(defaults.humidity_change),
            early_yield_mean: query.early_yield_mean.unwrap_or(defaults.early_yield_mean),
            early_yield_cv: query.early_yield_cv.unwrap_or(defaults.early_yield_cv),
            crop: query.crop.unwrap_or(defaults.crop),
        }
    }
}

/// Query parameters for the classify endpoint.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ClassifyQuery {
    /// Predicted volatility change in percentage points.
    pub value: f64,
}

/// Category assigned to a single value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiClassification {
    /// Value that was classified.
    pub value: f64,
    /// Assigned category.
    pub category: RiskCategory,
    /// Display color of the category.
    pub color: String,
}

impl ApiClassification {
    /// Classifies `value`, or `None` when it is NaN.
    #[must_use]
    pub fn new(value: f64) -> Option<Self> {
        let category = try_classify(value)?;
        Some(Self {
            value,
            category,
            color: category.color().to_string(),
        })
    }
}

/// Error body returned for rejected requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable message.
    pub error: String,
}
