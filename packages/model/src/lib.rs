#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! What-if volatility prediction.
//!
//! [`ScenarioParams`] holds the user's climate and baseline inputs,
//! [`FeatureVector`] lays them out in the order the model was trained on,
//! and [`PredictionAdapter`] runs them through a [`Predictor`], substituting
//! a closed-form estimate whenever the model is missing or fails.

pub mod adapter;
pub mod artifact;
pub mod features;
pub mod params;
pub mod scenario;

use std::path::PathBuf;

use thiserror::Error;

pub use adapter::{Prediction, PredictionAdapter, PredictionSource, Predictor};
pub use artifact::TreeEnsemble;
pub use features::{FEATURE_COUNT, FEATURE_NAMES, FeatureVector};
pub use params::{CropType, ScenarioParams};

/// Errors that can occur while loading or evaluating a model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The model file does not exist.
    #[error("Model file not found: {}", path.display())]
    NotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// I/O error reading the model file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The model file is not valid JSON or has the wrong shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The model parsed but is structurally unusable.
    #[error("Invalid model artifact: {message}")]
    InvalidArtifact {
        /// Description of what went wrong.
        message: String,
    },

    /// The model was trained on different features than we supply.
    #[error("Feature mismatch at position {position}: model expects '{expected}', got '{found}'")]
    FeatureMismatch {
        /// Zero-based feature position.
        position: usize,
        /// Name the model was trained with.
        expected: String,
        /// Name this crate supplies at that position.
        found: String,
    },

    /// Evaluation produced NaN or infinity.
    #[error("Model produced a non-finite prediction: {value}")]
    NonFinite {
        /// The offending value.
        value: f64,
    },
}
