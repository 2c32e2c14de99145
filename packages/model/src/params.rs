//! User-adjustable scenario inputs.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Slider bounds and default for one numeric input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    /// Smallest accepted value.
    pub min: f64,
    /// Largest accepted value.
    pub max: f64,
    /// Value used when the input is absent or NaN.
    pub default: f64,
    /// Slider increment.
    pub step: f64,
}

impl ParamRange {
    const fn new(min: f64, max: f64, default: f64, step: f64) -> Self {
        Self {
            min,
            max,
            default,
            step,
        }
    }

    /// Clamps `value` into range. NaN becomes the default.
    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            self.default
        } else {
            value.clamp(self.min, self.max)
        }
    }
}

/// Average growing-season temperature change, °C.
pub const TEMP_MEAN_CHANGE: ParamRange = ParamRange::new(-2.0, 5.0, 1.0, 0.1);
/// Temperature standard deviation change, °C.
pub const TEMP_STD_CHANGE: ParamRange = ParamRange::new(-1.0, 5.0, 2.0, 0.1);
/// Peak temperature change, °C.
pub const TEMP_MAX_CHANGE: ParamRange = ParamRange::new(-2.0, 8.0, 2.0, 0.1);
/// Change in days above 30 °C. Whole days only.
pub const EXTREME_HEAT_DAYS_CHANGE: ParamRange = ParamRange::new(-5.0, 15.0, 3.0, 1.0);
/// NDVI mean change.
pub const NDVI_MEAN_CHANGE: ParamRange = ParamRange::new(-0.2, 0.2, -0.05, 0.01);
/// NDVI standard deviation change.
pub const NDVI_STD_CHANGE: ParamRange = ParamRange::new(-0.1, 0.2, 0.05, 0.01);
/// Relative humidity change, percentage points.
pub const HUMIDITY_CHANGE: ParamRange = ParamRange::new(-15.0, 15.0, -2.0, 0.5);
/// Historical average yield, bu/acre.
pub const EARLY_YIELD_MEAN: ParamRange = ParamRange::new(50.0, 200.0, 140.0, 5.0);
/// Historical yield coefficient of variation, percent.
pub const EARLY_YIELD_CV: ParamRange = ParamRange::new(0.0, 30.0, 10.0, 1.0);

/// Crop the scenario applies to.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum CropType {
    /// Corn (maize).
    #[default]
    Corn,
    /// Soybean.
    Soybean,
}

/// Every input to a what-if prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioParams {
    /// See [`TEMP_MEAN_CHANGE`].
    pub temp_mean_change: f64,
    /// See [`TEMP_STD_CHANGE`].
    pub temp_std_change: f64,
    /// See [`TEMP_MAX_CHANGE`].
    pub temp_max_change: f64,
    /// See [`EXTREME_HEAT_DAYS_CHANGE`].
    pub extreme_heat_days_change: f64,
    /// See [`NDVI_MEAN_CHANGE`].
    pub ndvi_mean_change: f64,
    /// See [`NDVI_STD_CHANGE`].
    pub ndvi_std_change: f64,
    /// See [`HUMIDITY_CHANGE`].
    pub humidity_change: f64,
    /// See [`EARLY_YIELD_MEAN`].
    pub early_yield_mean: f64,
    /// See [`EARLY_YIELD_CV`].
    pub early_yield_cv: f64,
    /// Crop type.
    pub crop: CropType,
}

impl Default for ScenarioParams {
    fn default() -> Self {
        Self {
            temp_mean_change: TEMP_MEAN_CHANGE.default,
            temp_std_change: TEMP_STD_CHANGE.default,
            temp_max_change: TEMP_MAX_CHANGE.default,
            extreme_heat_days_change: EXTREME_HEAT_DAYS_CHANGE.default,
            ndvi_mean_change: NDVI_MEAN_CHANGE.default,
            ndvi_std_change: NDVI_STD_CHANGE.default,
            humidity_change: HUMIDITY_CHANGE.default,
            early_yield_mean: EARLY_YIELD_MEAN.default,
            early_yield_cv: EARLY_YIELD_CV.default,
            crop: CropType::Corn,
        }
    }
}

impl ScenarioParams {
    /// Returns a copy with every field forced into its slider range.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            temp_mean_change: TEMP_MEAN_CHANGE.clamp(self.temp_mean_change),
            temp_std_change: TEMP_STD_CHANGE.clamp(self.temp_std_change),
            temp_max_change: TEMP_MAX_CHANGE.clamp(self.temp_max_change),
            extreme_heat_days_change: EXTREME_HEAT_DAYS_CHANGE
                .clamp(self.extreme_heat_days_change)
                .round(),
            ndvi_mean_change: NDVI_MEAN_CHANGE.clamp(self.ndvi_mean_change),
            ndvi_std_change: NDVI_STD_CHANGE.clamp(self.ndvi_std_change),
            humidity_change: HUMIDITY_CHANGE.clamp(self.humidity_change),
            early_yield_mean: EARLY_YIELD_MEAN.clamp(self.early_yield_mean),
            early_yield_cv: EARLY_YIELD_CV.clamp(self.early_yield_cv),
            crop: self.crop,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use super::*;

    #[test]
    fn defaults_are_inside_their_ranges() {
        let params = ScenarioParams::default();
        assert_eq!(params.clamped(), params);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let params = ScenarioParams {
            temp_std_change: 12.0,
            early_yield_cv: -4.0,
            extreme_heat_days_change: 3.6,
            humidity_change: f64::NAN,
            ..ScenarioParams::default()
        }
        .clamped();

        assert!((params.temp_std_change - 5.0).abs() < f64::EPSILON);
        assert!(params.early_yield_cv.abs() < f64::EPSILON);
        assert!((params.extreme_heat_days_change - 4.0).abs() < f64::EPSILON);
        assert!((params.humidity_change - -2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn crop_parses_case_insensitively() {
        assert_eq!(CropType::from_str("soybean").unwrap(), CropType::Soybean);
        assert_eq!(CropType::from_str("Corn").unwrap(), CropType::Corn);
        assert!(CropType::from_str("wheat").is_err());
        assert_eq!(CropType::Soybean.to_string(), "Soybean");
    }
}
