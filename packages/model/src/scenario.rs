//! Values derived from a prediction for display alongside it.

use serde::{Deserialize, Serialize};
use yield_risk_risk_models::{SCENARIO_HIGH_THRESHOLD, SCENARIO_MEDIUM_THRESHOLD, ScenarioRisk};

use crate::params::ScenarioParams;

/// Upper end of the gauge axis.
pub const GAUGE_MAX: f64 = 30.0;

/// Value the gauge delta is measured against.
pub const GAUGE_REFERENCE: f64 = SCENARIO_MEDIUM_THRESHOLD;

/// Confidence never exceeds this.
pub const MAX_CONFIDENCE: f64 = 95.0;

/// One colored band on the gauge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GaugeStep {
    /// Inclusive start.
    pub from: f64,
    /// End of the band.
    pub to: f64,
    /// Band color.
    pub color: &'static str,
}

/// Gauge bands, aligned with [`ScenarioRisk`].
#[must_use]
pub const fn gauge_steps() -> [GaugeStep; 3] {
    [
        GaugeStep {
            from: 0.0,
            to: SCENARIO_MEDIUM_THRESHOLD,
            color: ScenarioRisk::Low.color(),
        },
        GaugeStep {
            from: SCENARIO_MEDIUM_THRESHOLD,
            to: SCENARIO_HIGH_THRESHOLD,
            color: ScenarioRisk::Medium.color(),
        },
        GaugeStep {
            from: SCENARIO_HIGH_THRESHOLD,
            to: GAUGE_MAX,
            color: ScenarioRisk::High.color(),
        },
    ]
}

/// Baseline volatility plus the predicted change.
#[must_use]
pub fn projected_volatility(params: &ScenarioParams, value: f64) -> f64 {
    params.early_yield_cv + value
}

/// Heuristic display confidence: `min(95, 60 + 2|value|)`.
#[must_use]
pub fn confidence(value: f64) -> f64 {
    value.abs().mul_add(2.0, 60.0).min(MAX_CONFIDENCE)
}

/// One term of the driver breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    /// Factor label.
    pub factor: String,
    /// Weighted contribution.
    pub contribution: f64,
}

/// Weighted input contributions, smallest first.
#[must_use]
pub fn drivers(params: &ScenarioParams) -> Vec<Driver> {
    let mut drivers = [
        ("Temperature Variability", params.temp_std_change * 2.0),
        ("Extreme Heat Events", params.extreme_heat_days_change * 0.5),
        ("Baseline Volatility", params.early_yield_cv * 0.3),
        ("NDVI Variability", params.ndvi_std_change * 10.0),
        ("Average Temperature", params.temp_mean_change * 0.5),
    ]
    .into_iter()
    .map(|(factor, contribution)| Driver {
        factor: factor.to_string(),
        contribution,
    })
    .collect::<Vec<_>>();

    drivers.sort_by(|a, b| a.contribution.total_cmp(&b.contribution));
    drivers
}
