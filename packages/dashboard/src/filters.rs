//! Row selection shared by the pages.

use yield_risk_dataset_models::{AnalysisRow, PredictionRow};

/// Rows whose county or state name contains `query`, ignoring case. A
/// blank query matches everything.
#[must_use]
pub fn search_predictions<'a>(rows: &'a [PredictionRow], query: &str) -> Vec<&'a PredictionRow> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return rows.iter().collect();
    }

    rows.iter()
        .filter(|row| {
            row.county_name.to_lowercase().contains(&needle)
                || row.state_name.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Sorted, de-duplicated `"County, State"` keys.
#[must_use]
pub fn county_options(rows: &[AnalysisRow]) -> Vec<String> {
    let mut keys = rows.iter().map(AnalysisRow::county_key).collect::<Vec<_>>();
    keys.sort();
    keys.dedup();
    keys
}

/// Rows for one `"County, State"` key, in file order.
#[must_use]
pub fn rows_for_county<'a>(rows: &'a [AnalysisRow], county_key: &str) -> Vec<&'a AnalysisRow> {
    rows.iter()
        .filter(|row| row.county_key() == county_key)
        .collect()
}

/// Distinct crops in first-seen order.
#[must_use]
pub fn distinct_crops(rows: &[&AnalysisRow]) -> Vec<String> {
    let mut crops: Vec<String> = Vec::new();
    for row in rows {
        if !crops.contains(&row.crop) {
            crops.push(row.crop.clone());
        }
    }
    crops
}
