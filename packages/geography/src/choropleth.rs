//! Joins county aggregates to boundary polygons and styles each by risk
//! category.

use std::collections::BTreeMap;

use geojson::FeatureCollection;
use yield_risk_geography_models::{
    BoundaryStyle, BoundaryTooltip, ChoroplethMap, CountyAggregate, GeoCode, Legend, LegendEntry,
    StyledBoundary, US_VIEW,
};
use yield_risk_risk_models::{RISK_BANDS, classify};

use crate::boundaries::feature_geo_code;

/// Legend heading.
pub const LEGEND_TITLE: &str = "CV Change Risk Levels";

/// The fixed four-row legend, most severe first.
#[must_use]
pub fn legend() -> Legend {
    Legend {
        title: LEGEND_TITLE.to_string(),
        entries: RISK_BANDS
            .iter()
            .rev()
            .map(|band| LegendEntry {
                category: band.category,
                color: band.color.to_string(),
                range: band.range_label.to_string(),
            })
            .collect(),
    }
}

/// Tooltip content for one county.
#[must_use]
pub fn tooltip(aggregate: &CountyAggregate) -> BoundaryTooltip {
    let category = classify(aggregate.mean_change);
    BoundaryTooltip {
        title: format!("{}, {}", aggregate.county_name, aggregate.state_name),
        crops: aggregate.crops.clone(),
        value: aggregate.mean_change,
        value_text: format!("{:.2}%", aggregate.mean_change),
        category,
        swatch: category.color().to_string(),
    }
}

fn style_for(
    aggregate: Option<&CountyAggregate>,
) -> (BoundaryStyle, Option<BoundaryTooltip>, Option<BoundaryStyle>) {
    aggregate.map_or_else(
        || (BoundaryStyle::transparent(), None, None),
        |aggregate| {
            let category = classify(aggregate.mean_change);
            (
                BoundaryStyle::filled(category.color()),
                Some(tooltip(aggregate)),
                Some(BoundaryStyle::highlight()),
            )
        },
    )
}

/// Renders one styled boundary per input feature, in input order.
///
/// Features whose geo code has no aggregate are fully transparent and
/// carry neither a tooltip nor a hover style.
#[must_use]
pub fn render(
    aggregates: &BTreeMap<GeoCode, CountyAggregate>,
    boundaries: &FeatureCollection,
) -> ChoroplethMap {
    let mut matched = 0;

    let styled = boundaries
        .features
        .iter()
        .map(|feature| {
            let geo_code = feature_geo_code(feature);
            let aggregate = geo_code.as_ref().and_then(|code| aggregates.get(code));
            if aggregate.is_some() {
                matched += 1;
            }
            let (style, tooltip, highlight) = style_for(aggregate);
            StyledBoundary {
                geo_code,
                geometry: feature.geometry.clone(),
                style,
                tooltip,
                highlight,
            }
        })
        .collect::<Vec<_>>();

    log::debug!(
        "Rendered {} boundaries, {matched} with data ({} aggregates)",
        styled.len(),
        aggregates.len()
    );

    ChoroplethMap {
        view: US_VIEW,
        boundaries: styled,
        legend: legend(),
        matched,
    }
}
