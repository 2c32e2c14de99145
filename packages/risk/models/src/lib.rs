#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Risk category taxonomy and classification breakpoints.
//!
//! Two independent schemes live here:
//!
//! * [`RiskCategory`] buckets a predicted volatility change into four
//!   ordered bands with breakpoints `{0, 2, 5}`. The bands, their colors and
//!   their legend labels are all read from the single [`RISK_BANDS`] table so
//!   classification and map rendering cannot drift apart.
//! * [`ScenarioRisk`] buckets a what-if prediction into three bands with
//!   breakpoints `{5, 10}`. It is used only by the impact modeler.
//!
//! The analysis table also carries its own precomputed category strings,
//! which [`AnalysisRiskLabel`] recognizes for chart coloring.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Four-way risk category for a predicted volatility change, ordered from
/// least to most severe.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum RiskCategory {
    /// Volatility is decreasing (change below 0%).
    #[serde(rename = "Improving")]
    #[strum(serialize = "Improving")]
    Improving,
    /// Change in `[0%, 2%)`.
    #[serde(rename = "Low Risk")]
    #[strum(serialize = "Low Risk")]
    LowRisk,
    /// Change in `[2%, 5%)`.
    #[serde(rename = "Medium Risk")]
    #[strum(serialize = "Medium Risk")]
    MediumRisk,
    /// Change of 5% or more.
    #[serde(rename = "High Risk")]
    #[strum(serialize = "High Risk")]
    HighRisk,
}

/// One row of the shared classification table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskBand {
    /// Category assigned to values in this band.
    pub category: RiskCategory,
    /// Inclusive lower bound. The band extends up to the next band's
    /// lower bound (exclusive).
    pub lower_bound: f64,
    /// Fill color used on the choropleth and legend.
    pub color: &'static str,
    /// Human-readable value range shown in the legend.
    pub range_label: &'static str,
}

/// The single source of truth for four-band classification and coloring.
///
/// Ordered by ascending `lower_bound`.
pub static RISK_BANDS: [RiskBand; 4] = [
    RiskBand {
        category: RiskCategory::Improving,
        lower_bound: f64::NEG_INFINITY,
        color: "#27ae60",
        range_label: "< 0%",
    },
    RiskBand {
        category: RiskCategory::LowRisk,
        lower_bound: 0.0,
        color: "#FFD700",
        range_label: "0-2%",
    },
    RiskBand {
        category: RiskCategory::MediumRisk,
        lower_bound: 2.0,
        color: "#FF8C00",
        range_label: "2-5%",
    },
    RiskBand {
        category: RiskCategory::HighRisk,
        lower_bound: 5.0,
        color: "#8B0000",
        range_label: "> 5%",
    },
];

/// Returns the band containing `value`.
///
/// NaN fails every lower-bound comparison and lands in the first band.
#[must_use]
pub fn band_for(value: f64) -> &'static RiskBand {
    RISK_BANDS
        .iter()
        .rev()
        .find(|band| value >= band.lower_bound)
        .unwrap_or(&RISK_BANDS[0])
}

/// Classifies a predicted volatility change (in percent).
#[must_use]
pub fn classify(value: f64) -> RiskCategory {
    band_for(value).category
}

/// Like [`classify`] but returns `None` for NaN.
#[must_use]
pub fn try_classify(value: f64) -> Option<RiskCategory> {
    if value.is_nan() {
        None
    } else {
        Some(classify(value))
    }
}

impl RiskCategory {
    /// Zero-based severity rank (`Improving` = 0, `HighRisk` = 3).
    #[must_use]
    pub const fn rank(self) -> u8 {
        self as u8
    }

    /// Returns this category's row in [`RISK_BANDS`].
    #[must_use]
    pub fn band(self) -> &'static RiskBand {
        &RISK_BANDS[self as usize]
    }

    /// Fill color for this category.
    #[must_use]
    pub fn color(self) -> &'static str {
        self.band().color
    }

    /// Returns all variants in ascending severity.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Improving, Self::LowRisk, Self::MediumRisk, Self::HighRisk]
    }
}

/// Three-way risk level for a single what-if prediction.
///
/// Breakpoints are 5 and 10, deliberately distinct from [`RiskCategory`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ScenarioRisk {
    /// Prediction below 5%.
    Low,
    /// Prediction in `[5%, 10%)`.
    Medium,
    /// Prediction of 10% or more.
    High,
}

/// Lower breakpoint between [`ScenarioRisk::Low`] and [`ScenarioRisk::Medium`].
pub const SCENARIO_MEDIUM_THRESHOLD: f64 = 5.0;
/// Lower breakpoint between [`ScenarioRisk::Medium`] and [`ScenarioRisk::High`].
pub const SCENARIO_HIGH_THRESHOLD: f64 = 10.0;

impl ScenarioRisk {
    /// Classifies a what-if prediction.
    #[must_use]
    pub fn classify(value: f64) -> Self {
        if value >= SCENARIO_HIGH_THRESHOLD {
            Self::High
        } else if value >= SCENARIO_MEDIUM_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Headline label, e.g. `"MEDIUM RISK"`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "LOW RISK",
            Self::Medium => "MEDIUM RISK",
            Self::High => "HIGH RISK",
        }
    }

    /// One-line description of the impact.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Low => "Minimal impact on yield stability",
            Self::Medium => "Moderate increase in yield variability",
            Self::High => "Significant threat to yield stability",
        }
    }

    /// Display color, matching the gauge steps.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Low => "#27ae60",
            Self::Medium => "#f39c12",
            Self::High => "#e74c3c",
        }
    }
}

/// Recognized values of the analysis table's `risk_category` column.
///
/// The column holds labels such as `"High Risk (Increasing)"`. Matching is
/// by leading phrase so the short forms (`"High Risk"`) are accepted too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisRiskLabel {
    /// `"High Risk (Increasing)"`
    High,
    /// `"Medium Risk (Slight Increase)"`
    Medium,
    /// `"Low Risk (Stable)"`
    Low,
    /// `"Improving (Decreasing)"`
    Improving,
    /// `"Insufficient Data"`
    InsufficientData,
    /// Anything else.
    Unrecognized,
}

/// Color for labels without a known mapping.
pub const UNKNOWN_LABEL_COLOR: &str = "#95a5a6";

impl AnalysisRiskLabel {
    /// Recognizes a raw `risk_category` string.
    #[must_use]
    pub fn parse(label: &str) -> Self {
        let label = label.trim();
        if label.starts_with("High Risk") {
            Self::High
        } else if label.starts_with("Medium Risk") {
            Self::Medium
        } else if label.starts_with("Low Risk") {
            Self::Low
        } else if label.starts_with("Improving") {
            Self::Improving
        } else if label.starts_with("Insufficient Data") {
            Self::InsufficientData
        } else {
            Self::Unrecognized
        }
    }

    /// Chart color used for the risk distribution pie.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::High => "#d62728",
            Self::Medium => "#ff9800",
            Self::Low => "#1f77b4",
            Self::Improving => "#2ca02c",
            Self::InsufficientData | Self::Unrecognized => UNKNOWN_LABEL_COLOR,
        }
    }

    /// Status marker shown next to the category on the county page.
    #[must_use]
    pub const fn marker(self) -> &'static str {
        match self {
            Self::High => "🔴",
            Self::Medium => "🟠",
            Self::Low => "🔵",
            Self::Improving => "🟢",
            Self::InsufficientData | Self::Unrecognized => "⚪",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_values_classify_into_expected_bands() {
        assert_eq!(classify(-0.0001), RiskCategory::Improving);
        assert_eq!(classify(0.0), RiskCategory::LowRisk);
        assert_eq!(classify(1.999), RiskCategory::LowRisk);
        assert_eq!(classify(2.0), RiskCategory::MediumRisk);
        assert_eq!(classify(4.999), RiskCategory::MediumRisk);
        assert_eq!(classify(5.0), RiskCategory::HighRisk);
        assert_eq!(classify(7.5), RiskCategory::HighRisk);
    }

    #[test]
    fn negative_zero_is_low_risk() {
        assert_eq!(classify(-0.0), RiskCategory::LowRisk);
    }

    #[test]
    fn classification_is_monotonic() {
        let mut previous = classify(-1000.0).rank();
        let mut v = -1000.0;
        while v < 1000.0 {
            let rank = classify(v).rank();
            assert!(rank >= previous, "rank dropped at {v}");
            previous = rank;
            v += 0.125;
        }
        assert_eq!(classify(f64::MAX), RiskCategory::HighRisk);
        assert_eq!(classify(f64::MIN), RiskCategory::Improving);
        assert_eq!(classify(f64::INFINITY), RiskCategory::HighRisk);
    }

    #[test]
    fn band_table_is_ordered_and_indexed_by_rank() {
        for (i, band) in RISK_BANDS.iter().enumerate() {
            assert_eq!(band.category.rank() as usize, i);
            assert_eq!(band.category.band(), band);
        }
        for pair in RISK_BANDS.windows(2) {
            assert!(pair[0].lower_bound < pair[1].lower_bound);
        }
    }

    #[test]
    fn nan_is_not_classified() {
        assert_eq!(try_classify(f64::NAN), None);
        assert_eq!(try_classify(3.0), Some(RiskCategory::MediumRisk));
    }

    #[test]
    fn category_labels_round_trip_through_strum() {
        for cat in RiskCategory::all() {
            let parsed: RiskCategory = cat.to_string().parse().unwrap();
            assert_eq!(parsed, *cat);
        }
        assert_eq!(RiskCategory::HighRisk.to_string(), "High Risk");
    }

    #[test]
    fn scenario_risk_uses_its_own_breakpoints() {
        assert_eq!(ScenarioRisk::classify(4.99), ScenarioRisk::Low);
        assert_eq!(ScenarioRisk::classify(5.0), ScenarioRisk::Medium);
        assert_eq!(ScenarioRisk::classify(8.5), ScenarioRisk::Medium);
        assert_eq!(ScenarioRisk::classify(10.0), ScenarioRisk::High);
        // 3.0 is Medium in the four-band scheme but Low here.
        assert_eq!(classify(3.0), RiskCategory::MediumRisk);
        assert_eq!(ScenarioRisk::classify(3.0), ScenarioRisk::Low);
    }

    #[test]
    fn analysis_labels_match_long_and_short_forms() {
        assert_eq!(
            AnalysisRiskLabel::parse("High Risk (Increasing)"),
            AnalysisRiskLabel::High
        );
        assert_eq!(
            AnalysisRiskLabel::parse("Medium Risk"),
            AnalysisRiskLabel::Medium
        );
        assert_eq!(
            AnalysisRiskLabel::parse("Improving (Decreasing)"),
            AnalysisRiskLabel::Improving
        );
        assert_eq!(
            AnalysisRiskLabel::parse("something else"),
            AnalysisRiskLabel::Unrecognized
        );
        assert_eq!(
            AnalysisRiskLabel::parse("Insufficient Data").color(),
            UNKNOWN_LABEL_COLOR
        );
    }
}
