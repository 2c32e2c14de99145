#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! County geo codes, aggregates, and choropleth descriptor types.
//!
//! A [`GeoCode`] is the five-character state + county FIPS identifier that
//! joins tabular predictions to county boundary geometry. The choropleth
//! types describe a fully styled map layer; drawing it is the front end's
//! job.

use serde::{Deserialize, Serialize};
use yield_risk_risk_models::RiskCategory;

/// Five-character county identifier: two-digit state FIPS followed by
/// three-digit county FIPS, both zero-padded (e.g. `"06001"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeoCode(String);

/// Length of a county geo code.
pub const GEO_CODE_LEN: usize = 5;

/// Largest two-digit state FIPS code.
pub const MAX_STATE_FP: u32 = 99;

/// Largest three-digit county FIPS code.
pub const MAX_COUNTY_FP: u32 = 999;

impl GeoCode {
    /// Builds a code from numeric state and county FIPS codes.
    ///
    /// Returns `None` when either part overflows its width, since the
    /// padded result would no longer be five characters.
    #[must_use]
    pub fn from_parts(state_fp: u32, county_fp: u32) -> Option<Self> {
        if state_fp > MAX_STATE_FP || county_fp > MAX_COUNTY_FP {
            return None;
        }
        Some(Self(format!("{state_fp:02}{county_fp:03}")))
    }

    /// Parses a boundary feature identifier.
    ///
    /// Identifiers shorter than five digits are left-padded with zeros,
    /// since numeric ids lose their leading zero (`1001` is `"01001"`).
    /// Returns `None` for anything that is not one to five ASCII digits.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() || raw.len() > GEO_CODE_LEN || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(Self(format!("{raw:0>width$}", width = GEO_CODE_LEN)))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Two-digit state portion.
    #[must_use]
    pub fn state_code(&self) -> &str {
        &self.0[..2]
    }

    /// Three-digit county portion.
    #[must_use]
    pub fn county_code(&self) -> &str {
        &self.0[2..]
    }
}

impl std::fmt::Display for GeoCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// All observations for one county collapsed into a single record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountyAggregate {
    /// County identifier.
    pub geo_code: GeoCode,
    /// Arithmetic mean of the predicted volatility change across the
    /// county's observations.
    pub mean_change: f64,
    /// County display name.
    pub county_name: String,
    /// State display name.
    pub state_name: String,
    /// Distinct crop labels, sorted and joined with `", "`.
    pub crops: String,
    /// Number of observations that contributed to the mean.
    pub observations: usize,
}

/// Visual style of one boundary polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryStyle {
    /// Fill color, or `None` when the polygon is not filled.
    pub fill_color: Option<String>,
    /// Fill opacity in `[0, 1]`.
    pub fill_opacity: f64,
    /// Border color.
    pub color: String,
    /// Border width in pixels.
    pub weight: f64,
    /// Border opacity in `[0, 1]`.
    pub opacity: f64,
}

/// Fill opacity of counties with data.
pub const FILLED_OPACITY: f64 = 0.7;

impl BoundaryStyle {
    /// Style for a county with data: category fill and a thin translucent
    /// white border.
    #[must_use]
    pub fn filled(fill_color: &str) -> Self {
        Self {
            fill_color: Some(fill_color.to_string()),
            fill_opacity: FILLED_OPACITY,
            color: "white".to_string(),
            weight: 0.3,
            opacity: 0.3,
        }
    }

    /// Style for a county without data: fully invisible.
    #[must_use]
    pub fn transparent() -> Self {
        Self {
            fill_color: None,
            fill_opacity: 0.0,
            color: "transparent".to_string(),
            weight: 0.0,
            opacity: 0.0,
        }
    }

    /// Style applied on pointer hover.
    #[must_use]
    pub fn highlight() -> Self {
        Self {
            fill_color: None,
            fill_opacity: 0.8,
            color: "black".to_string(),
            weight: 1.5,
            opacity: 1.0,
        }
    }
}

/// Hover tooltip content for a county with data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryTooltip {
    /// `"County, State"`.
    pub title: String,
    /// Crop list.
    pub crops: String,
    /// Mean predicted change.
    pub value: f64,
    /// Value formatted to two decimals with a percent sign.
    pub value_text: String,
    /// Risk category of the mean.
    pub category: RiskCategory,
    /// Swatch color for the category.
    pub swatch: String,
}

/// One boundary feature ready for drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyledBoundary {
    /// County identifier, if the feature carried a usable id.
    pub geo_code: Option<GeoCode>,
    /// Polygon geometry, passed through from the source.
    pub geometry: Option<geojson::Geometry>,
    /// Resting style.
    pub style: BoundaryStyle,
    /// Tooltip, present only for counties with data.
    pub tooltip: Option<BoundaryTooltip>,
    /// Hover style, present only for counties with data.
    pub highlight: Option<BoundaryStyle>,
}

/// One legend row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendEntry {
    /// Category this row describes.
    pub category: RiskCategory,
    /// Swatch color.
    pub color: String,
    /// Value range, e.g. `"2-5%"`.
    pub range: String,
}

/// Static legend attached to every map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Legend {
    /// Legend heading.
    pub title: String,
    /// Rows, most severe first.
    pub entries: Vec<LegendEntry>,
}

/// Initial map viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapView {
    /// Center latitude.
    pub latitude: f64,
    /// Center longitude.
    pub longitude: f64,
    /// Initial zoom level.
    pub zoom: u8,
}

/// Contiguous United States, zoomed out.
pub const US_VIEW: MapView = MapView {
    latitude: 39.8283,
    longitude: -98.5795,
    zoom: 4,
};

/// A complete choropleth layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoroplethMap {
    /// Initial viewport.
    pub view: MapView,
    /// One entry per input boundary feature, in input order.
    pub boundaries: Vec<StyledBoundary>,
    /// Category legend.
    pub legend: Legend,
    /// Number of boundaries that matched an aggregate.
    pub matched: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geo_code_pads_state_and_county() {
        assert_eq!(GeoCode::from_parts(6, 1).unwrap().as_str(), "06001");
        assert_eq!(GeoCode::from_parts(48, 453).unwrap().as_str(), "48453");
    }

    #[test]
    fn geo_code_rejects_overflowing_parts() {
        assert_eq!(GeoCode::from_parts(100, 1), None);
        assert_eq!(GeoCode::from_parts(6, 1000), None);
        assert_eq!(
            GeoCode::from_parts(MAX_STATE_FP, MAX_COUNTY_FP).unwrap().as_str(),
            "99999"
        );
    }

    #[test]
    fn geo_code_parts_split_at_two() {
        let code = GeoCode::from_parts(48, 453).unwrap();
        assert_eq!(code.state_code(), "48");
        assert_eq!(code.county_code(), "453");
    }

    #[test]
    fn parse_restores_leading_zero() {
        assert_eq!(GeoCode::parse("1001"), Some(GeoCode::from_parts(1, 1).unwrap()));
        assert_eq!(GeoCode::parse("06001"), Some(GeoCode::from_parts(6, 1).unwrap()));
        assert_eq!(GeoCode::parse("060010"), None);
        assert_eq!(GeoCode::parse("06-01"), None);
        assert_eq!(GeoCode::parse(""), None);
    }

    #[test]
    fn geo_code_serializes_as_plain_string() {
        let json = serde_json::to_string(&GeoCode::from_parts(6, 1).unwrap()).unwrap();
        assert_eq!(json, "\"06001\"");
    }

    #[test]
    fn transparent_style_hides_everything() {
        let style = BoundaryStyle::transparent();
        assert!(style.fill_color.is_none());
        assert!(style.fill_opacity.abs() < f64::EPSILON);
        assert!(style.opacity.abs() < f64::EPSILON);
        assert!(style.weight.abs() < f64::EPSILON);
    }
}
