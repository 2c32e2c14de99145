//! Shared, read-only state handed to every page.

use yield_risk_dataset::DataStore;
use yield_risk_model::PredictionAdapter;

/// Everything a page may read.
pub struct DashboardContext {
    store: DataStore,
    adapter: PredictionAdapter,
}

impl DashboardContext {
    /// Bundles a table store and a prediction adapter.
    #[must_use]
    pub const fn new(store: DataStore, adapter: PredictionAdapter) -> Self {
        Self { store, adapter }
    }

    /// Table store.
    #[must_use]
    pub const fn store(&self) -> &DataStore {
        &self.store
    }

    /// Prediction adapter.
    #[must_use]
    pub const fn adapter(&self) -> &PredictionAdapter {
        &self.adapter
    }
}
