#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Render descriptors for dashboard pages.
//!
//! A page handler produces a [`PageRender`]: an ordered list of
//! [`Section`]s that a front end draws top to bottom. Charts carry their
//! data points already computed; nothing here knows how to draw.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use yield_risk_geography_models::ChoroplethMap;

/// Dashboard pages.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum PageId {
    /// Landing page with headline metrics.
    Overview,
    /// County choropleth and state summaries.
    RiskMap,
    /// Single county deep dive.
    CountyExplorer,
    /// What-if scenario prediction.
    ImpactModeler,
    /// Drivers and geographic patterns.
    Analytics,
    /// Model comparison.
    ModelPerformance,
}

impl PageId {
    /// Page heading.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Overview => "Crop Yield Volatility Risk Assessment",
            Self::RiskMap => "Geographic Risk Distribution",
            Self::CountyExplorer => "County-Level Deep Dive",
            Self::ImpactModeler => "Volatility Impact Modeler",
            Self::Analytics => "Analysis & Insights",
            Self::ModelPerformance => "Model Performance",
        }
    }

    /// All pages in navigation order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Overview,
            Self::RiskMap,
            Self::CountyExplorer,
            Self::ImpactModeler,
            Self::Analytics,
            Self::ModelPerformance,
        ]
    }
}

/// A fully computed page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRender {
    /// Which page this is.
    pub page: PageId,
    /// Page heading.
    pub title: String,
    /// Whether rendering stopped early because required data was missing.
    pub halted: bool,
    /// Content, top to bottom.
    pub sections: Vec<Section>,
}

impl PageRender {
    /// Empty page with its standard title.
    #[must_use]
    pub fn new(page: PageId) -> Self {
        Self {
            page,
            title: page.title().to_string(),
            halted: false,
            sections: Vec::new(),
        }
    }

    /// Appends a section.
    pub fn push(&mut self, section: impl Into<Section>) {
        self.sections.push(section.into());
    }

    /// Appends an error notice and marks the page halted. Callers return
    /// immediately afterwards.
    #[must_use]
    pub fn halt(mut self, message: impl Into<String>) -> Self {
        self.push(Notice::error(message));
        self.halted = true;
        self
    }

    /// All notices on the page, in order.
    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.sections.iter().filter_map(|section| match section {
            Section::Notice(notice) => Some(notice),
            _ => None,
        })
    }

    /// All charts on the page, in order.
    pub fn charts(&self) -> impl Iterator<Item = &Chart> {
        self.sections.iter().filter_map(|section| match section {
            Section::Chart(chart) => Some(chart),
            _ => None,
        })
    }

    /// All tables on the page, in order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.sections.iter().filter_map(|section| match section {
            Section::Table(table) => Some(table),
            _ => None,
        })
    }

    /// All metric cards on the page, in order.
    pub fn metrics(&self) -> impl Iterator<Item = &MetricCard> {
        self.sections
            .iter()
            .filter_map(|section| match section {
                Section::Metrics { cards } => Some(cards.iter()),
                _ => None,
            })
            .flatten()
    }
}

/// One block of page content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Section {
    /// Section heading.
    Heading {
        /// Heading text.
        text: String,
        /// Nesting level, 2 and up.
        level: u8,
    },
    /// Free-form Markdown.
    Markdown {
        /// Markdown source.
        text: String,
    },
    /// Row of metric cards.
    Metrics {
        /// Cards, left to right.
        cards: Vec<MetricCard>,
    },
    /// Status message.
    Notice(Notice),
    /// Chart.
    Chart(Chart),
    /// Speedometer-style single value display.
    Gauge(Gauge),
    /// Table.
    Table(Table),
    /// County map.
    Choropleth(Box<ChoroplethMap>),
    /// Horizontal rule.
    Divider,
}

impl Section {
    /// Heading at `level`.
    #[must_use]
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Self::Heading {
            text: text.into(),
            level,
        }
    }

    /// Markdown block.
    #[must_use]
    pub fn markdown(text: impl Into<String>) -> Self {
        Self::Markdown { text: text.into() }
    }

    /// Row of metric cards.
    #[must_use]
    pub const fn metrics(cards: Vec<MetricCard>) -> Self {
        Self::Metrics { cards }
    }
}

impl From<Notice> for Section {
    fn from(value: Notice) -> Self {
        Self::Notice(value)
    }
}

impl From<Chart> for Section {
    fn from(value: Chart) -> Self {
        Self::Chart(value)
    }
}

impl From<Gauge> for Section {
    fn from(value: Gauge) -> Self {
        Self::Gauge(value)
    }
}

impl From<Table> for Section {
    fn from(value: Table) -> Self {
        Self::Table(value)
    }
}

impl From<ChoroplethMap> for Section {
    fn from(value: ChoroplethMap) -> Self {
        Self::Choropleth(Box::new(value))
    }
}

/// Severity of a [`Notice`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NoticeLevel {
    /// Neutral information.
    Info,
    /// Positive outcome.
    Success,
    /// Degraded but usable.
    Warning,
    /// Something required is missing.
    Error,
}

/// Status message shown inline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Markdown message.
    pub message: String,
}

impl Notice {
    fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    /// Info notice.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    /// Success notice.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    /// Warning notice.
    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    /// Error notice.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }
}

/// Headline number with an optional caption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricCard {
    /// Label above the value.
    pub label: String,
    /// Formatted value.
    pub value: String,
    /// Caption below the value.
    pub delta: Option<String>,
    /// Accent color.
    pub color: Option<String>,
}

impl MetricCard {
    /// Card with no caption.
    #[must_use]
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            delta: None,
            color: None,
        }
    }

    /// Sets the caption.
    #[must_use]
    pub fn with_delta(mut self, delta: impl Into<String>) -> Self {
        self.delta = Some(delta.into());
        self
    }

    /// Sets the accent color.
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// How a chart's series are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ChartKind {
    /// Vertical bars, one series.
    Bar,
    /// Horizontal bars, one series. Points are listed bottom to top.
    HorizontalBar,
    /// Vertical bars, one group per category and one bar per series.
    GroupedBar,
    /// Donut chart. `x` is the slice label.
    Pie,
    /// Connected points.
    Line,
    /// Unconnected points. Series with [`Series::trend`] set are fitted
    /// lines drawn on top.
    Scatter,
    /// Pre-binned counts. `x` is the bin start.
    Histogram,
}

/// Point position along the horizontal axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AxisValue {
    /// Numeric position.
    Number(f64),
    /// Categorical label.
    Category(String),
}

impl From<f64> for AxisValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for AxisValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<String> for AxisValue {
    fn from(value: String) -> Self {
        Self::Category(value)
    }
}

impl From<&str> for AxisValue {
    fn from(value: &str) -> Self {
        Self::Category(value.to_string())
    }
}

/// One data point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Point {
    /// Horizontal position (or slice/bar label).
    pub x: AxisValue,
    /// Vertical value. `None` for an undefined value, drawn as a gap.
    pub y: Option<f64>,
    /// Per-point color, overriding the series color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Marker size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    /// Text shown on or next to the point.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Hover text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hover: Option<String>,
}

impl Point {
    /// Point with no decoration.
    #[must_use]
    pub fn new(x: impl Into<AxisValue>, y: f64) -> Self {
        Self {
            x: x.into(),
            y: if y.is_finite() { Some(y) } else { None },
            color: None,
            size: None,
            text: None,
            hover: None,
        }
    }

    /// Point whose value may be undefined.
    #[must_use]
    pub fn maybe(x: impl Into<AxisValue>, y: Option<f64>) -> Self {
        Self::new(x, y.unwrap_or(f64::NAN))
    }

    /// Sets the color.
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Sets the marker size.
    #[must_use]
    pub const fn with_size(mut self, size: f64) -> Self {
        self.size = Some(size);
        self
    }

    /// Sets the label text.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Sets the hover text.
    #[must_use]
    pub fn with_hover(mut self, hover: impl Into<String>) -> Self {
        self.hover = Some(hover.into());
        self
    }
}

/// A named sequence of points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    /// Legend label.
    pub name: String,
    /// Series color.
    pub color: Option<String>,
    /// Whether this series is a fitted trend line.
    pub trend: bool,
    /// Points in drawing order.
    pub points: Vec<Point>,
}

impl Series {
    /// Series with no color.
    #[must_use]
    pub fn new(name: impl Into<String>, points: Vec<Point>) -> Self {
        Self {
            name: name.into(),
            color: None,
            trend: false,
            points,
        }
    }

    /// Sets the color.
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Marks the series as a trend line.
    #[must_use]
    pub const fn as_trend(mut self) -> Self {
        self.trend = true;
        self
    }
}

/// Horizontal reference line across a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceLine {
    /// Vertical position.
    pub y: f64,
    /// Label.
    pub label: String,
    /// Line color.
    pub color: String,
}

/// A chart with its data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chart {
    /// Chart title.
    pub title: String,
    /// How to draw it.
    pub kind: ChartKind,
    /// Horizontal axis label.
    pub x_label: Option<String>,
    /// Vertical axis label.
    pub y_label: Option<String>,
    /// Data series.
    pub series: Vec<Series>,
    /// Reference lines.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reference_lines: Vec<ReferenceLine>,
    /// Text annotations, e.g. a correlation coefficient.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<String>,
}

impl Chart {
    /// Chart with no axis labels.
    #[must_use]
    pub fn new(kind: ChartKind, title: impl Into<String>, series: Vec<Series>) -> Self {
        Self {
            title: title.into(),
            kind,
            x_label: None,
            y_label: None,
            series,
            reference_lines: Vec::new(),
            annotations: Vec::new(),
        }
    }

    /// Sets both axis labels.
    #[must_use]
    pub fn with_axes(mut self, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        self.x_label = Some(x_label.into());
        self.y_label = Some(y_label.into());
        self
    }

    /// Adds a reference line.
    #[must_use]
    pub fn with_reference_line(mut self, line: ReferenceLine) -> Self {
        self.reference_lines.push(line);
        self
    }

    /// Adds an annotation.
    #[must_use]
    pub fn with_annotation(mut self, text: impl Into<String>) -> Self {
        self.annotations.push(text.into());
        self
    }
}

/// One colored band on a [`Gauge`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GaugeBand {
    /// Band start.
    pub from: f64,
    /// Band end.
    pub to: f64,
    /// Band color.
    pub color: String,
}

/// Single value on a banded dial, with a delta against a reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gauge {
    /// Gauge title.
    pub title: String,
    /// Displayed value.
    pub value: f64,
    /// Value the delta is measured from.
    pub reference: f64,
    /// `value - reference`.
    pub delta: f64,
    /// Axis maximum.
    pub max: f64,
    /// Colored bands.
    pub bands: Vec<GaugeBand>,
}

/// One table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// Number, displayed as is.
    Number(f64),
    /// Text.
    Text(String),
    /// Missing value.
    Empty,
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        if value.is_nan() {
            Self::Empty
        } else {
            Self::Number(value)
        }
    }
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Empty, Self::from)
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Tabular data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    /// Optional caption.
    pub title: Option<String>,
    /// Column headers.
    pub columns: Vec<String>,
    /// Rows, each with one cell per column.
    pub rows: Vec<Vec<Cell>>,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use super::*;

    #[test]
    fn page_ids_use_kebab_case() {
        assert_eq!(PageId::RiskMap.to_string(), "risk-map");
        assert_eq!(
            PageId::from_str("model-performance").unwrap(),
            PageId::ModelPerformance
        );
        assert_eq!(
            serde_json::to_string(&PageId::CountyExplorer).unwrap(),
            "\"county-explorer\""
        );
    }

    #[test]
    fn halt_appends_error_and_sets_flag() {
        let page = PageRender::new(PageId::Overview).halt("Data files not found!");

        assert!(page.halted);
        assert_eq!(page.sections.len(), 1);
        let notice = page.notices().next().unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
    }

    #[test]
    fn sections_are_tagged_by_type() {
        let json = serde_json::to_value(Section::from(Notice::info("hello"))).unwrap();
        assert_eq!(json["type"], "notice");
        assert_eq!(json["level"], "info");

        let json = serde_json::to_value(Section::Divider).unwrap();
        assert_eq!(json["type"], "divider");
    }

    #[test]
    fn undefined_values_serialize_as_null() {
        let point = Point::maybe(2019, None);
        let json = serde_json::to_value(&point).unwrap();
        assert!(json["y"].is_null());
        assert_eq!(json["x"], 2019.0);

        assert_eq!(Cell::from(f64::NAN), Cell::Empty);
        assert!(serde_json::to_value(Cell::Empty).unwrap().is_null());
    }
}
