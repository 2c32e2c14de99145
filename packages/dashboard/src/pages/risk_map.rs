//! County choropleth, state summaries, and a searchable county table.

use std::collections::BTreeMap;

use geojson::FeatureCollection;
use yield_risk_dashboard_models::{
    Cell, Chart, ChartKind, MetricCard, Notice, PageId, PageRender, Point, Section, Series, Table,
};
use yield_risk_dataset_models::PredictionRow;
use yield_risk_geography::{GeographyError, aggregate::aggregate, choropleth};
use yield_risk_risk_models::{RiskCategory, try_classify};

use super::load_failure;
use crate::DashboardContext;
use crate::filters::search_predictions;
use crate::format::percent;
use crate::stats::{mean, summarize_by};

/// Rows shown in the county table.
pub const TABLE_LIMIT: usize = 50;

/// Bars in each state summary chart.
const STATE_LIMIT: usize = 10;

const MAP_KEY: &str = "\
- **Dark Red**: High risk (CV change > 5%)
- **Red/Orange**: Medium risk (2-5% increase)
- **Yellow**: Low risk (0-2% increase)
- **Green**: Improving (volatility decreasing)";

/// Category colors for the charts drawn when the map is unavailable.
const fn fallback_color(category: RiskCategory) -> &'static str {
    match category {
        RiskCategory::HighRisk => "#e74c3c",
        RiskCategory::MediumRisk => "#f39c12",
        RiskCategory::LowRisk => "#3498db",
        RiskCategory::Improving => "#27ae60",
    }
}

/// Renders the risk map page.
///
/// `boundaries` is the outcome of fetching county polygons. On failure the
/// map is replaced by a per-state scatter and a category pie.
#[must_use]
pub fn render(
    ctx: &DashboardContext,
    search: Option<&str>,
    boundaries: Result<&FeatureCollection, &GeographyError>,
) -> PageRender {
    let mut page = PageRender::new(PageId::RiskMap);

    let predictions = match ctx.store().predictions() {
        Ok(rows) => rows,
        Err(e) => {
            log::error!("Risk map: {e}");
            return page.halt(load_failure(&e));
        }
    };

    page.push(summary_metrics(&predictions));
    page.push(Section::Divider);
    page.push(Section::heading(3, "Predicted County Risk Choropleth Map"));

    match boundaries {
        Ok(collection) => {
            page.push(choropleth::render(&aggregate(&predictions), collection));
            page.push(Notice::info(MAP_KEY));
        }
        Err(e) => {
            log::warn!("Risk map: boundaries unavailable: {e}");
            page.push(Notice::warning(format!(
                "Could not load map data ({e}). Showing alternative visualization..."
            )));
            page.push(fallback_scatter(&predictions));
            page.push(fallback_pie(&predictions));
        }
    }

    page.push(Section::Divider);
    page.push(Section::heading(3, "State-Level Risk Summary"));
    push_state_summaries(&mut page, &predictions);

    page.push(Section::Divider);
    page.push(Section::heading(3, "County-Level Details"));
    push_county_table(&mut page, &predictions, search.unwrap_or_default());

    page
}

fn summary_metrics(rows: &[PredictionRow]) -> Section {
    let high = rows.iter().filter(|r| r.predicted_high_risk).count();
    let medium = rows
        .iter()
        .filter(|r| (2.0..=5.0).contains(&r.predicted_cv_change))
        .count();
    let low = rows.iter().filter(|r| r.predicted_cv_change < 2.0).count();
    let average = mean(rows.iter().map(|r| r.predicted_cv_change)).unwrap_or(f64::NAN);

    Section::metrics(vec![
        MetricCard::new("High-Risk Counties", high.to_string()),
        MetricCard::new("Medium Risk (2-5%)", medium.to_string()),
        MetricCard::new("Low Risk (<2%)", low.to_string()),
        MetricCard::new("Avg CV Change", percent(average, 2)),
    ])
}

fn fallback_scatter(rows: &[PredictionRow]) -> Chart {
    let series = RiskCategory::all()
        .iter()
        .rev()
        .map(|&category| {
            let points = rows
                .iter()
                .filter(|r| try_classify(r.predicted_cv_change) == Some(category))
                .map(|r| {
                    let historical = r
                        .yield_cv_change
                        .map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"));
                    Point::new(r.state_name.as_str(), r.predicted_cv_change)
                        .with_size(r.predicted_cv_change.abs() + 1.0)
                        .with_hover(format!(
                            "{} ({}), historical change {historical}",
                            r.county_name, r.crop
                        ))
                })
                .collect();
            Series::new(category.to_string(), points).with_color(fallback_color(category))
        })
        .collect();

    Chart::new(ChartKind::Scatter, "Risk Distribution by State", series)
        .with_axes("State", "Predicted Volatility Change (%)")
}

fn fallback_pie(rows: &[PredictionRow]) -> Chart {
    let mut counts: BTreeMap<RiskCategory, usize> = BTreeMap::new();
    for category in rows.iter().filter_map(|r| try_classify(r.predicted_cv_change)) {
        *counts.entry(category).or_default() += 1;
    }
    let mut slices = counts.into_iter().collect::<Vec<_>>();
    slices.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));

    #[allow(clippy::cast_precision_loss)]
    let points = slices
        .into_iter()
        .map(|(category, count)| {
            Point::new(category.to_string(), count as f64).with_color(fallback_color(category))
        })
        .collect();

    Chart::new(
        ChartKind::Pie,
        "Risk Distribution",
        vec![Series::new("Risk Level", points)],
    )
}

fn push_state_summaries(page: &mut PageRender, rows: &[PredictionRow]) {
    let high = summarize_by(
        rows.iter().filter(|r| r.predicted_cv_change > 5.0),
        |r| r.state_name.clone(),
        |r| r.predicted_cv_change,
    );
    let mut high = high.into_iter().collect::<Vec<_>>();
    high.sort_by(|a, b| b.1.count.cmp(&a.1.count));
    high.truncate(STATE_LIMIT);

    if high.is_empty() {
        page.push(Notice::info("No high-risk counties with current filters"));
    } else {
        #[allow(clippy::cast_precision_loss)]
        let points = high
            .into_iter()
            .map(|(state, summary)| Point::new(state, summary.count as f64))
            .collect();
        page.push(
            Chart::new(
                ChartKind::HorizontalBar,
                "Top High-Risk States",
                vec![Series::new("High-Risk Counties", points)],
            )
            .with_axes("Number of High-Risk Counties", "State"),
        );
    }

    let mut averages = summarize_by(
        rows.iter(),
        |r| r.state_name.clone(),
        |r| r.predicted_cv_change,
    )
    .into_iter()
    .filter(|(_, summary)| !summary.mean.is_nan())
    .collect::<Vec<_>>();
    averages.sort_by(|a, b| b.1.mean.total_cmp(&a.1.mean));
    averages.truncate(STATE_LIMIT);

    let points = averages
        .into_iter()
        .map(|(state, summary)| Point::new(state, summary.mean))
        .collect();
    page.push(
        Chart::new(
            ChartKind::HorizontalBar,
            "Average Risk by State",
            vec![Series::new("Avg Predicted CV Change (%)", points)],
        )
        .with_axes("Avg Predicted CV Change (%)", "State"),
    );
}

fn push_county_table(page: &mut PageRender, rows: &[PredictionRow], search: &str) {
    let mut matches = search_predictions(rows, search);
    if matches.is_empty() {
        page.push(Notice::info(format!("No counties match \"{}\"", search.trim())));
        return;
    }

    // Descending, missing values last.
    matches.sort_by(|a, b| {
        let (a, b) = (a.predicted_cv_change, b.predicted_cv_change);
        a.is_nan().cmp(&b.is_nan()).then_with(|| b.total_cmp(&a))
    });
    matches.truncate(TABLE_LIMIT);

    let rows = matches
        .into_iter()
        .map(|r| {
            vec![
                Cell::from(r.county_name.as_str()),
                Cell::from(r.state_name.as_str()),
                Cell::from(r.crop.as_str()),
                Cell::from(r.predicted_cv_change),
                Cell::from(r.yield_cv_change),
                try_classify(r.predicted_cv_change)
                    .map_or(Cell::Empty, |c| Cell::from(c.to_string())),
            ]
        })
        .collect();

    page.push(Table {
        title: None,
        columns: [
            "county_name",
            "state_name",
            "crop",
            "predicted_cv_change",
            "yield_cv_change",
            "risk_level",
        ]
        .map(str::to_string)
        .to_vec(),
        rows,
    });
}

#[cfg(test)]
mod tests {
    use yield_risk_dashboard_models::{AxisValue, NoticeLevel, Section};
    use yield_risk_geography::boundaries::parse_boundaries;

    use super::*;
    use crate::pages::fixtures;

    const BOUNDARIES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "id": "19169", "properties": {},
             "geometry": {"type": "Point", "coordinates": [-93.5, 42.0]}},
            {"type": "Feature", "id": "01001", "properties": {},
             "geometry": {"type": "Point", "coordinates": [-86.6, 32.5]}}
        ]
    }"#;

    fn offline() -> GeographyError {
        GeographyError::Conversion {
            message: "offline".to_string(),
        }
    }

    #[test]
    fn metrics_use_fixed_thresholds() {
        let dir = fixtures::full("risk_map_metrics");
        let page = render(&fixtures::context(&dir), None, Err(&offline()));

        let cards = page.metrics().collect::<Vec<_>>();
        assert_eq!(cards[0].value, "2");
        assert_eq!(cards[1].value, "1");
        assert_eq!(cards[2].value, "2");
        assert_eq!(cards[3].value, "3.30%");
    }

    #[test]
    fn map_is_drawn_when_boundaries_load() {
        let dir = fixtures::full("risk_map_map");
        let collection = parse_boundaries(BOUNDARIES).unwrap();
        let page = render(&fixtures::context(&dir), None, Ok(&collection));

        let map = page
            .sections
            .iter()
            .find_map(|s| match s {
                Section::Choropleth(map) => Some(map),
                _ => None,
            })
            .unwrap();
        assert_eq!(map.matched, 1);
        let story = &map.boundaries[0];
        assert_eq!(story.tooltip.as_ref().unwrap().crops, "corn, soybean");
        assert_eq!(story.style.fill_color.as_deref(), Some("#FF8C00"));
        assert!(page.notices().all(|n| n.level != NoticeLevel::Warning));
    }

    #[test]
    fn boundary_failure_falls_back_to_charts() {
        let dir = fixtures::full("risk_map_fallback");
        let page = render(&fixtures::context(&dir), None, Err(&offline()));

        assert!(!page.halted);
        assert!(page.notices().any(|n| n.level == NoticeLevel::Warning));
        let scatter = page.charts().find(|c| c.kind == ChartKind::Scatter).unwrap();
        let high = scatter.series.iter().find(|s| s.name == "High Risk").unwrap();
        assert_eq!(high.points.len(), 2);
        assert_eq!(high.points[0].size, Some(8.5));
        assert!(page.charts().any(|c| c.kind == ChartKind::Pie));
        assert!(!page.sections.iter().any(|s| matches!(s, Section::Choropleth(_))));
    }

    #[test]
    fn state_summaries_rank_states() {
        let dir = fixtures::full("risk_map_states");
        let page = render(&fixtures::context(&dir), None, Err(&offline()));

        let high = page.charts().find(|c| c.title == "Top High-Risk States").unwrap();
        assert_eq!(high.series[0].points.len(), 2);

        let average = page.charts().find(|c| c.title == "Average Risk by State").unwrap();
        let states = average.series[0]
            .points
            .iter()
            .map(|p| p.x.clone())
            .collect::<Vec<_>>();
        assert_eq!(
            states,
            ["California", "Iowa", "Texas"].map(AxisValue::from).to_vec()
        );
    }

    #[test]
    fn search_filters_and_sorts_table() {
        let dir = fixtures::full("risk_map_search");
        let page = render(&fixtures::context(&dir), Some("iowa"), Err(&offline()));

        let table = page.tables().next().unwrap();
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[0][4], Cell::Number(6.1));
        assert_eq!(table.rows[0][5], Cell::Text("High Risk".to_string()));
        assert_eq!(table.rows[2][0], Cell::Text("Story".to_string()));
    }

    #[test]
    fn unmatched_search_shows_notice_instead_of_table() {
        let dir = fixtures::full("risk_map_nomatch");
        let page = render(&fixtures::context(&dir), Some("zzz"), Err(&offline()));

        assert!(page.tables().next().is_none());
        assert!(
            page.notices()
                .any(|n| n.level == NoticeLevel::Info && n.message.contains("zzz"))
        );
    }

    #[test]
    fn missing_predictions_halt() {
        let dir = fixtures::dir("risk_map_missing");
        let page = render(&fixtures::context(&dir), None, Err(&offline()));

        assert!(page.halted);
        assert_eq!(page.sections.len(), 1);
    }
}
