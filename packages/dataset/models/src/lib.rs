#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Typed row schemas for the precomputed volatility tables.
//!
//! Every CSV consumed by the dashboard has a row type here plus a
//! [`TableSchema`] implementation naming its file and the columns that must
//! be present. Column names match the headers written by the offline
//! pipeline exactly.

pub mod parse;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Static description of one CSV table.
pub trait TableSchema: DeserializeOwned + Send + Sync + 'static {
    /// Short table name used in error messages and logs.
    const TABLE: &'static str;
    /// File name relative to the data directory.
    const FILE_NAME: &'static str;
    /// Columns that must appear in the header row.
    const REQUIRED_COLUMNS: &'static [&'static str];

    /// Rewrites header names before validation and deserialization.
    fn normalize_headers(_headers: &mut [String]) {}
}

/// One row of `model_predictions.csv`: a county/crop observation with the
/// model's predicted volatility change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRow {
    /// State FIPS code (unpadded).
    #[serde(deserialize_with = "parse::code")]
    pub state_fp: u32,
    /// County FIPS code within the state (unpadded).
    #[serde(deserialize_with = "parse::code")]
    pub county_fp: u32,
    /// Crop label (e.g. `"corn"`).
    pub crop: String,
    /// Predicted change in yield coefficient of variation, in percent.
    #[serde(deserialize_with = "parse::lenient_f64")]
    pub predicted_cv_change: f64,
    /// Whether the model flagged this observation as high risk.
    #[serde(deserialize_with = "parse::flag")]
    pub predicted_high_risk: bool,
    /// County display name.
    pub county_name: String,
    /// State display name.
    pub state_name: String,
    /// Observed historical change, when the pipeline exported it.
    #[serde(default, deserialize_with = "parse::optional_f64")]
    pub yield_cv_change: Option<f64>,
}

impl TableSchema for PredictionRow {
    const TABLE: &'static str = "predictions";
    const FILE_NAME: &'static str = "model_predictions.csv";
    const REQUIRED_COLUMNS: &'static [&'static str] = &[
        "state_fp",
        "county_fp",
        "crop",
        "predicted_cv_change",
        "predicted_high_risk",
        "county_name",
        "state_name",
    ];
}

/// One row of `volatility_final_analysis.csv`: early vs late volatility
/// and climate deltas for a county/crop pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRow {
    /// County display name.
    pub county_name: String,
    /// State display name.
    pub state_name: String,
    /// Crop label.
    pub crop: String,
    /// County FIPS code within the state.
    #[serde(deserialize_with = "parse::code")]
    pub county_fp: u32,
    /// Precomputed category label, e.g. `"High Risk (Increasing)"`.
    pub risk_category: String,
    /// Change in yield CV between the early and late periods, in percent.
    #[serde(deserialize_with = "parse::lenient_f64")]
    pub yield_cv_change: f64,
    /// Yield CV over the 2005-2014 baseline.
    #[serde(deserialize_with = "parse::lenient_f64")]
    pub early_yield_cv: f64,
    /// Yield CV over the later period.
    #[serde(deserialize_with = "parse::lenient_f64")]
    pub late_yield_cv: f64,
    /// Mean baseline yield, if exported.
    #[serde(default, deserialize_with = "parse::optional_f64")]
    pub early_yield_mean: Option<f64>,
    /// Model prediction joined onto the analysis row, if exported.
    #[serde(default, deserialize_with = "parse::optional_f64")]
    pub predicted_cv_change: Option<f64>,
    /// Change in mean growing-season temperature (°C).
    #[serde(rename = "T2M_mean_change", deserialize_with = "parse::lenient_f64")]
    pub t2m_mean_change: f64,
    /// Change in temperature standard deviation (°C).
    #[serde(rename = "T2M_std_change", deserialize_with = "parse::lenient_f64")]
    pub t2m_std_change: f64,
    /// Change in maximum temperature (°C).
    #[serde(rename = "T2M_max_change", deserialize_with = "parse::lenient_f64")]
    pub t2m_max_change: f64,
    /// Change in the number of days above 30°C.
    #[serde(deserialize_with = "parse::lenient_f64")]
    pub extreme_heat_days_change: f64,
    /// Change in mean relative humidity (%).
    #[serde(rename = "RH2M_mean_change", deserialize_with = "parse::lenient_f64")]
    pub rh2m_mean_change: f64,
    /// Change in surface shortwave radiation.
    #[serde(
        rename = "ALLSKY_SFC_SW_DWN_mean_change",
        deserialize_with = "parse::lenient_f64"
    )]
    pub solar_radiation_change: f64,
    /// Change in mean NDVI.
    #[serde(rename = "NDVI_mean_change", deserialize_with = "parse::lenient_f64")]
    pub ndvi_mean_change: f64,
    /// Change in NDVI standard deviation.
    #[serde(rename = "NDVI_std_change", deserialize_with = "parse::lenient_f64")]
    pub ndvi_std_change: f64,
    /// Change in mean EVI.
    #[serde(rename = "EVI_mean_change", deserialize_with = "parse::lenient_f64")]
    pub evi_mean_change: f64,
    /// Change in mean NDWI.
    #[serde(rename = "NDWI_mean_change", deserialize_with = "parse::lenient_f64")]
    pub ndwi_mean_change: f64,
}

impl AnalysisRow {
    /// `"County, State"` key used by the county selector.
    #[must_use]
    pub fn county_key(&self) -> String {
        format!("{}, {}", self.county_name, self.state_name)
    }
}

impl TableSchema for AnalysisRow {
    const TABLE: &'static str = "analysis";
    const FILE_NAME: &'static str = "volatility_final_analysis.csv";
    const REQUIRED_COLUMNS: &'static [&'static str] = &[
        "county_name",
        "state_name",
        "crop",
        "county_fp",
        "risk_category",
        "yield_cv_change",
        "early_yield_cv",
        "late_yield_cv",
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
    ];
}

/// One row of `merged_crop_climate_data.csv`: a single county/crop/year
/// yield observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRow {
    /// County display name.
    pub county_name: String,
    /// State display name.
    pub state_name: String,
    /// Crop label.
    pub crop: String,
    /// Harvest year.
    #[serde(deserialize_with = "parse::year")]
    pub year: i32,
    /// Yield in bushels per acre.
    #[serde(deserialize_with = "parse::lenient_f64")]
    pub yield_value: f64,
}

impl TableSchema for HistoricalRow {
    const TABLE: &'static str = "historical";
    const FILE_NAME: &'static str = "merged_crop_climate_data.csv";
    const REQUIRED_COLUMNS: &'static [&'static str] =
        &["county_name", "state_name", "crop", "year", "yield_value"];
}

/// One row of `feature_importance.csv`, ordered most important first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportanceRow {
    /// Raw feature name (e.g. `"T2M_std_change"`).
    #[serde(rename = "Feature")]
    pub feature: String,
    /// Random forest importance score.
    #[serde(rename = "RF_Importance", deserialize_with = "parse::lenient_f64")]
    pub importance: f64,
}

impl TableSchema for FeatureImportanceRow {
    const TABLE: &'static str = "feature_importance";
    const FILE_NAME: &'static str = "feature_importance.csv";
    const REQUIRED_COLUMNS: &'static [&'static str] = &["Feature", "RF_Importance"];
}

/// Header name the first column of the metrics table is normalized to.
pub const MODEL_COLUMN: &str = "Model";

/// One row of `model_comparison_metrics.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetricsRow {
    /// Model name. Read from the first column whatever its header.
    #[serde(rename = "Model")]
    pub model: String,
    /// R² on the training split.
    #[serde(deserialize_with = "parse::lenient_f64")]
    pub train_r2: f64,
    /// R² on the held-out test split.
    #[serde(deserialize_with = "parse::lenient_f64")]
    pub test_r2: f64,
    /// Root mean squared error on the test split.
    #[serde(deserialize_with = "parse::lenient_f64")]
    pub test_rmse: f64,
    /// Mean absolute error on the test split.
    #[serde(deserialize_with = "parse::lenient_f64")]
    pub test_mae: f64,
    /// Mean cross-validation R².
    #[serde(deserialize_with = "parse::lenient_f64")]
    pub cv_r2_mean: f64,
    /// Standard deviation of cross-validation R².
    #[serde(deserialize_with = "parse::lenient_f64")]
    pub cv_r2_std: f64,
}

impl ModelMetricsRow {
    /// Metrics published with the trained models, used when the metrics
    /// file is absent.
    #[must_use]
    pub fn published() -> Vec<Self> {
        vec![
            Self::new("Linear Regression", [0.604, 0.509, 6.32, 4.28, 0.593, 0.031]),
            Self::new("Random Forest", [0.637, 0.547, 6.07, 4.02, 0.616, 0.028]),
            Self::new("XGBoost", [0.659, 0.566, 5.95, 3.93, 0.636, 0.026]),
        ]
    }

    fn new(model: &str, [train_r2, test_r2, test_rmse, test_mae, cv_r2_mean, cv_r2_std]: [f64; 6]) -> Self {
        Self {
            model: model.to_string(),
            train_r2,
            test_r2,
            test_rmse,
            test_mae,
            cv_r2_mean,
            cv_r2_std,
        }
    }
}

impl TableSchema for ModelMetricsRow {
    const TABLE: &'static str = "model_metrics";
    const FILE_NAME: &'static str = "model_comparison_metrics.csv";
    const REQUIRED_COLUMNS: &'static [&'static str] = &[
        MODEL_COLUMN,
        "train_r2",
        "test_r2",
        "test_rmse",
        "test_mae",
        "cv_r2_mean",
        "cv_r2_std",
    ];

    fn normalize_headers(headers: &mut [String]) {
        if !headers.iter().any(|h| h == MODEL_COLUMN)
            && let Some(first) = headers.first_mut()
        {
            *first = MODEL_COLUMN.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read<T: TableSchema>(data: &str) -> Vec<T> {
        csv::Reader::from_reader(data.as_bytes())
            .deserialize()
            .collect::<Result<Vec<T>, _>>()
            .unwrap()
    }

    #[test]
    fn prediction_rows_parse_exported_csv() {
        let rows: Vec<PredictionRow> = read(
            "state_fp,county_fp,crop,predicted_cv_change,predicted_high_risk,county_name,state_name\n\
             6,1,corn,7.5,True,Alameda,California\n\
             48,453,soybean,-0.25,False,Travis,Texas\n",
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].state_fp, 6);
        assert!(rows[0].predicted_high_risk);
        assert!(!rows[1].predicted_high_risk);
        assert_eq!(rows[1].county_fp, 453);
        assert!(rows[0].yield_cv_change.is_none());
    }

    #[test]
    fn optional_columns_accept_empty_cells() {
        let rows: Vec<PredictionRow> = read(
            "state_fp,county_fp,crop,predicted_cv_change,predicted_high_risk,county_name,state_name,yield_cv_change\n\
             6,1,corn,1.0,False,Alameda,California,\n\
             6,3,corn,1.0,False,Alpine,California,2.5\n",
        );
        assert_eq!(rows[0].yield_cv_change, None);
        assert_eq!(rows[1].yield_cv_change, Some(2.5));
    }

    #[test]
    fn metrics_first_header_is_renamed_to_model() {
        let mut headers = vec!["Unnamed: 0".to_string(), "train_r2".to_string()];
        ModelMetricsRow::normalize_headers(&mut headers);
        assert_eq!(headers[0], MODEL_COLUMN);

        let mut already = vec!["train_r2".to_string(), MODEL_COLUMN.to_string()];
        ModelMetricsRow::normalize_headers(&mut already);
        assert_eq!(already[0], "train_r2");
    }

    #[test]
    fn published_metrics_rank_xgboost_best() {
        let rows = ModelMetricsRow::published();
        let best = rows
            .iter()
            .max_by(|a, b| a.test_r2.total_cmp(&b.test_r2))
            .unwrap();
        assert_eq!(best.model, "XGBoost");
    }
}
