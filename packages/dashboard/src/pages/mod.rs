//! One module per dashboard page.

pub mod analytics;
pub mod county_explorer;
pub mod impact_modeler;
pub mod model_performance;
pub mod overview;
pub mod risk_map;

use yield_risk_dataset::DatasetError;

/// Message shown when a required table cannot be loaded.
fn load_failure(error: &DatasetError) -> String {
    if error.is_not_found() {
        format!("Data file not found! {error}")
    } else {
        format!("Could not load data: {error}")
    }
}
