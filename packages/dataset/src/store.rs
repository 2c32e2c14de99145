//! Process-wide table cache.
//!
//! A [`DataStore`] is built once at startup and handed to every page. Each
//! table is read from disk on first successful access and the parsed rows
//! are shared by `Arc` afterwards. Failed loads are not cached, so a file
//! that appears later is picked up on the next request.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use yield_risk_dataset_models::{
    AnalysisRow, FeatureImportanceRow, HistoricalRow, ModelMetricsRow, PredictionRow, TableSchema,
};

use crate::DatasetError;
use crate::loader::load_table;
use crate::paths::table_path;

/// Read-through cache slot for one table.
///
/// Two callers racing on a cold slot may both read the file; the first
/// writer wins and both receive identical content.
struct Memo<T> {
    slot: RwLock<Option<Arc<Vec<T>>>>,
}

impl<T: TableSchema> Memo<T> {
    const fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    fn cached(&self) -> Option<Arc<Vec<T>>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(Arc::clone)
    }

    fn get_or_load(&self, data_dir: &Path) -> Result<Arc<Vec<T>>, DatasetError> {
        if let Some(rows) = self.cached() {
            return Ok(rows);
        }

        let path = table_path::<T>(data_dir);
        log::debug!("Cache miss for table '{}'", T::TABLE);
        let rows = Arc::new(load_table::<T>(&path)?);

        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(slot.get_or_insert(rows)))
    }
}

/// Metrics table together with the reason the published fallback was used,
/// if it was.
#[derive(Debug)]
pub struct MetricsTable {
    /// Rows to display.
    pub rows: Arc<Vec<ModelMetricsRow>>,
    /// Load error that triggered the fallback.
    pub fallback_reason: Option<DatasetError>,
}

/// Shared, lazily populated access to every dashboard table.
pub struct DataStore {
    data_dir: PathBuf,
    predictions: Memo<PredictionRow>,
    analysis: Memo<AnalysisRow>,
    historical: Memo<HistoricalRow>,
    feature_importance: Memo<FeatureImportanceRow>,
    model_metrics: Memo<ModelMetricsRow>,
}

impl DataStore {
    /// Creates an empty store reading from `data_dir`.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            predictions: Memo::new(),
            analysis: Memo::new(),
            historical: Memo::new(),
            feature_importance: Memo::new(),
            model_metrics: Memo::new(),
        }
    }

    /// Directory the tables are read from.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Model prediction rows.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if the table cannot be loaded.
    pub fn predictions(&self) -> Result<Arc<Vec<PredictionRow>>, DatasetError> {
        self.predictions.get_or_load(&self.data_dir)
    }

    /// Volatility analysis rows.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if the table cannot be loaded.
    pub fn analysis(&self) -> Result<Arc<Vec<AnalysisRow>>, DatasetError> {
        self.analysis.get_or_load(&self.data_dir)
    }

    /// Historical yield rows.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if the table cannot be loaded.
    pub fn historical(&self) -> Result<Arc<Vec<HistoricalRow>>, DatasetError> {
        self.historical.get_or_load(&self.data_dir)
    }

    /// Feature importance rows, most important first.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if the table cannot be loaded.
    pub fn feature_importance(&self) -> Result<Arc<Vec<FeatureImportanceRow>>, DatasetError> {
        self.feature_importance.get_or_load(&self.data_dir)
    }

    /// Model comparison rows.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if the table cannot be loaded.
    pub fn model_metrics(&self) -> Result<Arc<Vec<ModelMetricsRow>>, DatasetError> {
        self.model_metrics.get_or_load(&self.data_dir)
    }

    /// Model comparison rows, falling back to
    /// [`ModelMetricsRow::published`] when the table cannot be loaded.
    #[must_use]
    pub fn model_metrics_or_published(&self) -> MetricsTable {
        match self.model_metrics() {
            Ok(rows) => MetricsTable {
                rows,
                fallback_reason: None,
            },
            Err(e) => {
                log::warn!("Using published model metrics: {e}");
                MetricsTable {
                    rows: Arc::new(ModelMetricsRow::published()),
                    fallback_reason: Some(e),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::loader::load_table;

    const PREDICTIONS: &str = "state_fp,county_fp,crop,predicted_cv_change,predicted_high_risk,county_name,state_name\n\
                               6,1,corn,7.5,True,Alameda,California\n\
                               48,453,soybean,1.5,False,Travis,Texas\n";

    fn fixture_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "yield_risk_store_{name}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn cached_rows_match_a_cold_read() {
        let dir = fixture_dir("cold");
        fs::write(dir.join(PredictionRow::FILE_NAME), PREDICTIONS).unwrap();

        let store = DataStore::new(&dir);
        let first = store.predictions().unwrap();
        let second = store.predictions().unwrap();
        let cold = load_table::<PredictionRow>(&dir.join(PredictionRow::FILE_NAME)).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*first, cold);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn cached_rows_survive_file_removal() {
        let dir = fixture_dir("survive");
        fs::write(dir.join(PredictionRow::FILE_NAME), PREDICTIONS).unwrap();

        let store = DataStore::new(&dir);
        let first = store.predictions().unwrap();
        fs::remove_file(dir.join(PredictionRow::FILE_NAME)).unwrap();
        let again = store.predictions().unwrap();

        assert_eq!(first.len(), 2);
        assert!(Arc::ptr_eq(&first, &again));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn failed_loads_are_not_cached() {
        let dir = fixture_dir("retry");
        let store = DataStore::new(&dir);
        assert!(store.predictions().unwrap_err().is_not_found());

        fs::write(dir.join(PredictionRow::FILE_NAME), PREDICTIONS).unwrap();
        assert_eq!(store.predictions().unwrap().len(), 2);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_metrics_fall_back_to_published() {
        let dir = fixture_dir("metrics");
        let store = DataStore::new(&dir);
        let table = store.model_metrics_or_published();

        assert_eq!(table.rows.len(), 3);
        assert!(table.fallback_reason.is_some_and(|e| e.is_not_found()));
        fs::remove_dir_all(&dir).unwrap();
    }
}
