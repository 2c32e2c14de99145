//! Canonical file paths for the data directory.
//!
//! Table files live directly under the data directory; the model artifact
//! is configured separately.

use std::path::{Path, PathBuf};

use yield_risk_dataset_models::TableSchema;

/// Default data directory, relative to the working directory.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Default model artifact path, relative to the working directory.
pub const DEFAULT_MODEL_PATH: &str = "models/xgboost_model.json";

/// Returns the path of table `T` inside `data_dir`.
#[must_use]
pub fn table_path<T: TableSchema>(data_dir: &Path) -> PathBuf {
    data_dir.join(T::FILE_NAME)
}
