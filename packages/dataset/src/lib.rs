#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Schema-validated CSV loading and a memoizing data store.
//!
//! Tables are read from a fixed data directory, their headers checked
//! against each row type's [`TableSchema`](yield_risk_dataset_models::TableSchema),
//! and the parsed rows cached in a [`DataStore`](store::DataStore) that is
//! constructed once at startup and shared by every page.

pub mod loader;
pub mod paths;
pub mod store;

use std::path::PathBuf;

use thiserror::Error;

pub use store::DataStore;

/// Errors that can occur while loading a table.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The table's file does not exist.
    #[error("No such file: {}", path.display())]
    NotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The header row lacks a column the schema requires.
    #[error("Table '{table}' is missing required column '{column}'")]
    MissingColumn {
        /// Table name.
        table: &'static str,
        /// Missing column name.
        column: &'static str,
    },

    /// I/O failure other than a missing file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV or a cell that failed to parse.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl DatasetError {
    /// Whether this error means the file is absent.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
