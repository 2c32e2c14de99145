//! The model's input layout.

use crate::params::{CropType, ScenarioParams};

/// Number of model inputs.
pub const FEATURE_COUNT: usize = 13;

/// Feature names in the order the model was trained on.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "T2M_mean_change",
    "T2M_std_change",
    "T2M_max_change",
    "extreme_heat_days_change",
    "RH2M_mean_change",
    "ALLSKY_SFC_SW_DWN_mean_change",
    "NDVI_mean_change",
    "NDVI_std_change",
    "EVI_mean_change",
    "NDWI_mean_change",
    "early_yield_mean",
    "early_yield_cv",
    "crop_soybean",
];

/// EVI change as a fraction of NDVI change.
pub const EVI_PER_NDVI: f64 = 0.8;

/// NDWI change as a fraction of NDVI change.
pub const NDWI_PER_NDVI: f64 = 0.9;

/// One row of model input, ordered as [`FEATURE_NAMES`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Wraps raw values already in [`FEATURE_NAMES`] order.
    #[must_use]
    pub const fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    /// Derives the model input from scenario parameters.
    ///
    /// Solar radiation is held constant. EVI and NDWI have no input of
    /// their own and move proportionally with NDVI.
    #[must_use]
    pub fn from_params(params: &ScenarioParams) -> Self {
        Self([
            params.temp_mean_change,
            params.temp_std_change,
            params.temp_max_change,
            params.extreme_heat_days_change,
            params.humidity_change,
            0.0,
            params.ndvi_mean_change,
            params.ndvi_std_change,
            params.ndvi_mean_change * EVI_PER_NDVI,
            params.ndvi_mean_change * NDWI_PER_NDVI,
            params.early_yield_mean,
            params.early_yield_cv,
            match params.crop {
                CropType::Corn => 0.0,
                CropType::Soybean => 1.0,
            },
        ])
    }

    /// Raw values.
    #[must_use]
    pub const fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }

    /// Looks up a value by feature name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|&n| n == name)
            .map(|i| self.0[i])
    }

    /// `(name, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.0.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vegetation_indices_track_ndvi() {
        let params = ScenarioParams {
            ndvi_mean_change: -0.1,
            ..ScenarioParams::default()
        };
        let features = FeatureVector::from_params(&params);

        assert!((features.get("EVI_mean_change").unwrap() - -0.08).abs() < 1e-12);
        assert!((features.get("NDWI_mean_change").unwrap() - -0.09).abs() < 1e-12);
        assert!(
            features
                .get("ALLSKY_SFC_SW_DWN_mean_change")
                .unwrap()
                .abs()
                < f64::EPSILON
        );
    }

    #[test]
    fn crop_becomes_indicator() {
        let corn = FeatureVector::from_params(&ScenarioParams::default());
        let soybean = FeatureVector::from_params(&ScenarioParams {
            crop: CropType::Soybean,
            ..ScenarioParams::default()
        });

        assert!(corn.get("crop_soybean").unwrap().abs() < f64::EPSILON);
        assert!((soybean.get("crop_soybean").unwrap() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn inputs_land_in_trained_positions() {
        let features = FeatureVector::from_params(&ScenarioParams::default());
        let values = features.values();

        assert!((values[1] - 2.0).abs() < f64::EPSILON);
        assert!((values[3] - 3.0).abs() < f64::EPSILON);
        assert!((values[4] - -2.0).abs() < f64::EPSILON);
        assert!((values[10] - 140.0).abs() < f64::EPSILON);
        assert!((values[11] - 10.0).abs() < f64::EPSILON);
        assert_eq!(features.iter().count(), FEATURE_COUNT);
        assert!(features.get("unknown").is_none());
    }
}
