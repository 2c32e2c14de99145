//! Collapses per-crop prediction rows into one record per county.

use std::collections::{BTreeMap, BTreeSet};

use yield_risk_dataset_models::PredictionRow;
use yield_risk_geography_models::{CountyAggregate, GeoCode};

/// Builds the geo code for a prediction row, or `None` when its FIPS
/// parts do not fit a five-character code.
#[must_use]
pub fn geo_code(row: &PredictionRow) -> Option<GeoCode> {
    GeoCode::from_parts(row.state_fp, row.county_fp)
}

#[derive(Default)]
struct Accumulator<'a> {
    sum: f64,
    count: usize,
    names: Option<(&'a str, &'a str)>,
    crops: BTreeSet<&'a str>,
}

/// Groups rows by geo code.
///
/// Each aggregate carries the mean of `predicted_cv_change` over the
/// group's finite values, the lexicographically smallest
/// `(county_name, state_name)` pair seen in the group, and the group's
/// distinct crops sorted and joined with `", "`. Groups with no finite
/// value are omitted so they render as "no data". Rows whose FIPS parts
/// overflow a geo code are skipped.
#[must_use]
pub fn aggregate(rows: &[PredictionRow]) -> BTreeMap<GeoCode, CountyAggregate> {
    let mut groups: BTreeMap<GeoCode, Accumulator<'_>> = BTreeMap::new();

    for row in rows {
        let Some(code) = geo_code(row) else {
            log::warn!(
                "Skipping {} {}: FIPS {}/{} out of range",
                row.county_name,
                row.crop,
                row.state_fp,
                row.county_fp
            );
            continue;
        };
        let acc = groups.entry(code).or_default();

        if row.predicted_cv_change.is_finite() {
            acc.sum += row.predicted_cv_change;
            acc.count += 1;
        }

        let names = (row.county_name.as_str(), row.state_name.as_str());
        acc.names = Some(acc.names.map_or(names, |current| current.min(names)));

        let crop = row.crop.trim();
        if !crop.is_empty() {
            acc.crops.insert(crop);
        }
    }

    groups
        .into_iter()
        .filter_map(|(code, acc)| {
            if acc.count == 0 {
                log::debug!("Skipping {code}: no finite predictions");
                return None;
            }
            let (county_name, state_name) = acc.names.unwrap_or_default();
            #[allow(clippy::cast_precision_loss)]
            let mean_change = acc.sum / acc.count as f64;
            let aggregate = CountyAggregate {
                geo_code: code.clone(),
                mean_change,
                county_name: county_name.to_string(),
                state_name: state_name.to_string(),
                crops: acc.crops.into_iter().collect::<Vec<_>>().join(", "),
                observations: acc.count,
            };
            Some((code, aggregate))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(state_fp: u32, county_fp: u32, crop: &str, change: f64, county: &str) -> PredictionRow {
        PredictionRow {
            state_fp,
            county_fp,
            crop: crop.to_string(),
            predicted_cv_change: change,
            predicted_high_risk: change > 5.0,
            county_name: county.to_string(),
            state_name: "Iowa".to_string(),
            yield_cv_change: None,
        }
    }

    #[test]
    fn empty_input_yields_empty_map() {
        assert!(aggregate(&[]).is_empty());
    }

    #[test]
    fn same_county_rows_are_averaged_and_crops_joined() {
        let rows = vec![
            row(19, 1, "soybean", 3.0, "Adair"),
            row(19, 1, "corn", 6.0, "Adair"),
        ];
        let result = aggregate(&rows);

        assert_eq!(result.len(), 1);
        let agg = &result[&GeoCode::from_parts(19, 1).unwrap()];
        assert!((agg.mean_change - 4.5).abs() < f64::EPSILON);
        assert_eq!(agg.crops, "corn, soybean");
        assert_eq!(agg.observations, 2);
    }

    #[test]
    fn duplicate_crops_appear_once() {
        let rows = vec![
            row(19, 1, "corn", 1.0, "Adair"),
            row(19, 1, "corn", 2.0, "Adair"),
        ];
        let result = aggregate(&rows);
        assert_eq!(result[&GeoCode::from_parts(19, 1).unwrap()].crops, "corn");
    }

    #[test]
    fn result_does_not_depend_on_row_order() {
        let forward = vec![
            row(19, 1, "corn", 1.0, "Adair"),
            row(19, 1, "soybean", 2.0, "Adair County"),
            row(6, 1, "corn", -1.0, "Alameda"),
        ];
        let mut backward = forward.clone();
        backward.reverse();

        assert_eq!(aggregate(&forward), aggregate(&backward));
        assert_eq!(
            aggregate(&forward)[&GeoCode::from_parts(19, 1).unwrap()].county_name,
            "Adair"
        );
    }

    #[test]
    fn non_finite_values_are_excluded() {
        let rows = vec![
            row(19, 1, "corn", f64::NAN, "Adair"),
            row(19, 1, "soybean", 2.0, "Adair"),
            row(19, 3, "corn", f64::NAN, "Adams"),
        ];
        let result = aggregate(&rows);

        assert_eq!(result.len(), 1);
        let agg = &result[&GeoCode::from_parts(19, 1).unwrap()];
        assert!((agg.mean_change - 2.0).abs() < f64::EPSILON);
        assert_eq!(agg.observations, 1);
        assert_eq!(agg.crops, "corn, soybean");
    }

    #[test]
    fn out_of_range_fips_rows_are_skipped() {
        let rows = vec![
            row(19, 1, "corn", 2.0, "Adair"),
            row(190, 1, "corn", 9.0, "Bogus"),
            row(19, 1234, "corn", 9.0, "Bogus"),
        ];
        let result = aggregate(&rows);

        assert_eq!(result.len(), 1);
        assert!(result.keys().all(|code| code.as_str().len() == 5));
        let agg = &result[&GeoCode::from_parts(19, 1).unwrap()];
        assert!((agg.mean_change - 2.0).abs() < f64::EPSILON);
        assert_eq!(agg.county_name, "Adair");
    }
}
