//! Model invocation with a closed-form fallback.

use std::path::Path;

use serde::{Deserialize, Serialize};
use yield_risk_risk_models::ScenarioRisk;

use crate::ModelError;
use crate::artifact::TreeEnsemble;
use crate::features::FeatureVector;
use crate::params::ScenarioParams;

/// Anything that can score a feature vector.
pub trait Predictor: Send + Sync {
    /// Predicts the change in yield coefficient of variation, in percent.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] if the prediction cannot be computed.
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError>;
}

/// Where a prediction came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PredictionSource {
    /// The trained model.
    Model,
    /// The closed-form estimate, used because of `reason`.
    Fallback {
        /// Why the model was not used.
        reason: String,
    },
}

/// A scored scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    /// Predicted change in yield CV, in percent.
    pub value: f64,
    /// Provenance of `value`.
    pub source: PredictionSource,
    /// Three-band risk level of `value`.
    pub risk: ScenarioRisk,
}

impl Prediction {
    fn new(value: f64, source: PredictionSource) -> Self {
        Self {
            value,
            source,
            risk: ScenarioRisk::classify(value),
        }
    }

    /// Whether the fallback estimate was used.
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self.source, PredictionSource::Fallback { .. })
    }
}

enum Backend {
    Loaded(Box<dyn Predictor>),
    Unavailable { reason: String },
}

/// Scores scenarios, loaded once at startup and shared read-only.
pub struct PredictionAdapter {
    backend: Backend,
}

impl PredictionAdapter {
    /// Loads the model at `path`. A missing or unreadable model is logged
    /// and leaves the adapter in fallback mode.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        match TreeEnsemble::load(path) {
            Ok(model) => Self::with_predictor(model),
            Err(e) => {
                log::warn!("Model unavailable, using fallback estimates: {e}");
                Self::unavailable(e.to_string())
            }
        }
    }

    /// Wraps an already constructed predictor.
    #[must_use]
    pub fn with_predictor(predictor: impl Predictor + 'static) -> Self {
        Self {
            backend: Backend::Loaded(Box::new(predictor)),
        }
    }

    /// An adapter with no model that always uses the fallback.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            backend: Backend::Unavailable {
                reason: reason.into(),
            },
        }
    }

    /// Whether a model is loaded.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self.backend, Backend::Loaded(_))
    }

    /// Why no model is loaded, if none is.
    #[must_use]
    pub fn unavailable_reason(&self) -> Option<&str> {
        match &self.backend {
            Backend::Loaded(_) => None,
            Backend::Unavailable { reason } => Some(reason),
        }
    }

    /// Scores `params` after clamping them into range.
    ///
    /// Never fails: a missing model or a predictor error yields the
    /// fallback estimate tagged with the reason.
    #[must_use]
    pub fn predict(&self, params: &ScenarioParams) -> Prediction {
        let params = params.clamped();

        match &self.backend {
            Backend::Unavailable { reason } => Prediction::new(
                fallback_value(&params),
                PredictionSource::Fallback {
                    reason: reason.clone(),
                },
            ),
            Backend::Loaded(predictor) => {
                match predictor.predict(&FeatureVector::from_params(&params)) {
                    Ok(value) => Prediction::new(value, PredictionSource::Model),
                    Err(e) => {
                        log::warn!("Prediction failed, using fallback estimate: {e}");
                        Prediction::new(
                            fallback_value(&params),
                            PredictionSource::Fallback {
                                reason: format!("Prediction error: {e}"),
                            },
                        )
                    }
                }
            }
        }
    }
}

/// Closed-form estimate used when the model cannot be.
#[must_use]
pub fn fallback_value(params: &ScenarioParams) -> f64 {
    params.extreme_heat_days_change.mul_add(
        0.5,
        params
            .temp_std_change
            .mul_add(2.0, params.early_yield_cv * 0.3),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl Predictor for Failing {
        fn predict(&self, _features: &FeatureVector) -> Result<f64, ModelError> {
            Err(ModelError::InvalidArtifact {
                message: "boom".to_string(),
            })
        }
    }

    struct Constant(f64);

    impl Predictor for Constant {
        fn predict(&self, _features: &FeatureVector) -> Result<f64, ModelError> {
            Ok(self.0)
        }
    }

    #[test]
    fn predictor_error_uses_fallback() {
        let adapter = PredictionAdapter::with_predictor(Failing);
        let prediction = adapter.predict(&ScenarioParams::default());

        assert!((prediction.value - 8.5).abs() < 1e-9);
        assert_eq!(prediction.risk, ScenarioRisk::Medium);
        assert!(prediction.is_fallback());
        assert!(matches!(
            prediction.source,
            PredictionSource::Fallback { ref reason } if reason.contains("boom")
        ));
    }

    #[test]
    fn missing_model_uses_fallback_with_reason() {
        let adapter = PredictionAdapter::load(Path::new("/nonexistent/xgboost_model.json"));

        assert!(!adapter.is_available());
        assert!(adapter.unavailable_reason().unwrap().contains("not found"));
        let prediction = adapter.predict(&ScenarioParams::default());
        assert!(prediction.is_fallback());
        assert!((prediction.value - 8.5).abs() < 1e-9);
    }

    #[test]
    fn model_value_is_classified() {
        let adapter = PredictionAdapter::with_predictor(Constant(12.0));
        let prediction = adapter.predict(&ScenarioParams::default());

        assert_eq!(prediction.source, PredictionSource::Model);
        assert_eq!(prediction.risk, ScenarioRisk::High);
        assert!(adapter.unavailable_reason().is_none());
    }

    #[test]
    fn inputs_are_clamped_before_fallback() {
        let adapter = PredictionAdapter::unavailable("no model");
        let prediction = adapter.predict(&ScenarioParams {
            temp_std_change: 100.0,
            ..ScenarioParams::default()
        });
        // 2 * 5 + 0.5 * 3 + 0.3 * 10
        assert!((prediction.value - 14.5).abs() < 1e-9);
    }
}
