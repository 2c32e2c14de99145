//! Volatility drivers, climate relationships, and geographic patterns.

use yield_risk_dashboard_models::{
    Chart, ChartKind, Notice, PageId, PageRender, Point, Section, Series,
};
use yield_risk_dataset_models::{AnalysisRow, FeatureImportanceRow};

use super::load_failure;
use crate::DashboardContext;
use crate::format::{feature_label, fixed};
use crate::stats::{
    GroupSummary, histogram, largest_by, linear_fit, pearson, smallest_by, summarize_by,
};

/// Features shown in the importance chart.
pub const TOP_FEATURES: usize = 15;

/// States need at least this many rows to be ranked.
pub const MIN_STATE_ROWS: usize = 3;

/// Bins per indicator histogram.
pub const HISTOGRAM_BINS: usize = 20;

const STATE_LIMIT: usize = 10;

const KEY_FINDINGS: &str = "\
**Key Findings:**
- Temperature variability (not just warming) is the #1 driver of yield volatility
- Counties with CV increases above 5% are flagged as high-risk
- Geographic heterogeneity: impacts concentrated in marginal agricultural regions";

const KEY_TAKEAWAYS: &str = "\
### Key Takeaways

**1. Baseline Matters Most**
- Counties that were volatile stay volatile

**2. Temperature Variability**
- Erratic weather > gradual warming

**3. Extreme Events**
- Heat waves, frost events

**4. Vegetation Response**
- NDVI variability captures stress";

const CROP_COLORS: [&str; 4] = ["#1f77b4", "#ff7f0e", "#2ca02c", "#9467bd"];

type Indicator = (&'static str, fn(&AnalysisRow) -> f64);

const INDICATORS: [Indicator; 6] = [
    ("Temp Change", |r| r.t2m_mean_change),
    ("Temp Variability", |r| r.t2m_std_change),
    ("Extreme Heat Days", |r| r.extreme_heat_days_change),
    ("NDVI Change", |r| r.ndvi_mean_change),
    ("NDVI Variability", |r| r.ndvi_std_change),
    ("Humidity Change", |r| r.rh2m_mean_change),
];

/// Renders the analytics page.
#[must_use]
pub fn render(ctx: &DashboardContext) -> PageRender {
    let mut page = PageRender::new(PageId::Analytics);

    let analysis = match ctx.store().analysis() {
        Ok(rows) => rows,
        Err(e) => {
            log::error!("Analytics: {e}");
            return page.halt(load_failure(&e));
        }
    };
    let importance = match ctx.store().feature_importance() {
        Ok(rows) => rows,
        Err(e) => {
            log::error!("Analytics: {e}");
            return page.halt(load_failure(&e));
        }
    };

    page.push(Notice::info(KEY_FINDINGS));
    page.push(Section::Divider);

    page.push(Section::heading(2, "What Drives Yield Volatility?"));
    if importance.is_empty() {
        page.push(Notice::warning("Feature importance data not available"));
    } else {
        page.push(importance_chart(&importance));
    }
    page.push(Section::markdown(KEY_TAKEAWAYS));
    page.push(Section::Divider);

    page.push(Section::heading(3, "Climate-Volatility Relationships"));
    page.push(relationship(
        &analysis,
        "Temperature Variability vs Yield Volatility",
        "Temperature Variability Change (°C)",
        |r| r.t2m_std_change,
    ));
    page.push(relationship(
        &analysis,
        "Extreme Heat Days vs Yield Volatility",
        "Change in Extreme Heat Days",
        |r| r.extreme_heat_days_change,
    ));
    page.push(Section::Divider);

    page.push(Section::heading(2, "Geographic Patterns"));
    push_state_rankings(&mut page, &analysis);
    page.push(Section::Divider);

    page.push(Section::heading(
        2,
        "Climate Change Indicators Across All Counties",
    ));
    for (title, value) in INDICATORS {
        let values = analysis.iter().map(value).collect::<Vec<_>>();
        #[allow(clippy::cast_precision_loss)]
        let points = histogram(&values, HISTOGRAM_BINS)
            .into_iter()
            .map(|bin| {
                Point::new(bin.start, bin.count as f64)
                    .with_hover(format!("{:.3} to {:.3}", bin.start, bin.end))
            })
            .collect();
        page.push(Chart::new(
            ChartKind::Histogram,
            title,
            vec![Series::new(title, points)],
        ));
    }

    page
}

/// Top features, least important first so the most important draws on top.
fn importance_chart(rows: &[FeatureImportanceRow]) -> Chart {
    let points = rows
        .iter()
        .take(TOP_FEATURES)
        .rev()
        .map(|row| Point::new(feature_label(&row.feature), row.importance))
        .collect();

    Chart::new(
        ChartKind::HorizontalBar,
        "Top 15 Feature Importance (Random Forest)",
        vec![Series::new("Importance Score", points)],
    )
    .with_axes("Importance Score", "Feature")
}

/// Scatter of `x` against `yield_cv_change`, one series per crop, each with
/// a fitted trend line, annotated with the overall correlation.
fn relationship(
    rows: &[AnalysisRow],
    title: &str,
    x_label: &str,
    x: fn(&AnalysisRow) -> f64,
) -> Chart {
    let mut crops: Vec<&str> = Vec::new();
    for row in rows {
        if !crops.contains(&row.crop.as_str()) {
            crops.push(&row.crop);
        }
    }

    let mut series = Vec::new();
    for (i, crop) in crops.iter().enumerate() {
        let color = CROP_COLORS[i % CROP_COLORS.len()];
        let members = rows.iter().filter(|r| r.crop == *crop).collect::<Vec<_>>();

        let points = members
            .iter()
            .map(|r| {
                Point::new(x(r), r.yield_cv_change)
                    .with_hover(format!("{}, {}", r.county_name, r.state_name))
            })
            .collect();
        series.push(Series::new(*crop, points).with_color(color));

        let pairs = members
            .iter()
            .map(|r| (x(r), r.yield_cv_change))
            .collect::<Vec<_>>();
        if let Some(fit) = linear_fit(&pairs) {
            let xs = pairs.iter().map(|p| p.0).filter(|v| v.is_finite());
            let lo = xs.clone().fold(f64::INFINITY, f64::min);
            let hi = xs.fold(f64::NEG_INFINITY, f64::max);
            series.push(
                Series::new(
                    format!("{crop} trend"),
                    vec![Point::new(lo, fit.at(lo)), Point::new(hi, fit.at(hi))],
                )
                .with_color(color)
                .as_trend(),
            );
        }
    }

    let pairs = rows
        .iter()
        .map(|r| (x(r), r.yield_cv_change))
        .collect::<Vec<_>>();
    let correlation = pearson(&pairs).map_or_else(|| "n/a".to_string(), |r| fixed(r, 3));

    Chart::new(ChartKind::Scatter, title, series)
        .with_axes(x_label, "Yield Volatility Change (%)")
        .with_annotation(format!("Correlation: {correlation}"))
}

fn push_state_rankings(page: &mut PageRender, rows: &[AnalysisRow]) {
    let eligible = summarize_by(rows.iter(), |r| r.state_name.clone(), |r| r.yield_cv_change)
        .into_iter()
        .filter(|(_, summary)| summary.count >= MIN_STATE_ROWS)
        .collect::<Vec<_>>();

    if eligible.is_empty() {
        page.push(Notice::info(format!(
            "No state has at least {MIN_STATE_ROWS} counties to compare"
        )));
        return;
    }

    page.push(Section::heading(3, "Most Vulnerable States"));
    let mut vulnerable = largest_by(eligible.iter(), STATE_LIMIT, |entry| entry.1.mean);
    vulnerable.reverse();
    page.push(state_chart(
        "Top 10 States with Highest Volatility Increase",
        &vulnerable,
    ));

    page.push(Section::heading(3, "Most Resilient States"));
    let mut resilient = smallest_by(eligible.iter(), STATE_LIMIT, |entry| entry.1.mean);
    resilient.reverse();
    page.push(state_chart(
        "Top 10 States with Lowest Volatility Change",
        &resilient,
    ));
}

fn state_chart(title: &str, states: &[&(String, GroupSummary)]) -> Chart {
    let points = states
        .iter()
        .map(|(state, summary)| {
            Point::new(state.as_str(), summary.mean)
                .with_hover(format!("{} counties", summary.count))
        })
        .collect();

    Chart::new(
        ChartKind::HorizontalBar,
        title,
        vec![Series::new("Avg CV Change", points)],
    )
    .with_axes("Avg CV Change", "State")
}

#[cfg(test)]
mod tests {
    use yield_risk_dashboard_models::AxisValue;
    use yield_risk_dataset_models::AnalysisRow;

    use super::*;
    use crate::pages::fixtures;

    #[test]
    fn importance_chart_puts_most_important_on_top() {
        let dir = fixtures::full("analytics_importance");
        let page = render(&fixtures::context(&dir));

        let chart = page
            .charts()
            .find(|c| c.title.starts_with("Top 15 Feature Importance"))
            .unwrap();
        let points = &chart.series[0].points;
        assert_eq!(points.len(), 4);
        assert_eq!(points[3].x, AxisValue::from("Early Yield Cv"));
        assert_eq!(points[0].x, AxisValue::from("Extreme Heat Days Change"));
    }

    #[test]
    fn scatters_are_split_by_crop_with_correlation() {
        let dir = fixtures::full("analytics_scatter");
        let page = render(&fixtures::context(&dir));

        let chart = page
            .charts()
            .find(|c| c.title == "Temperature Variability vs Yield Volatility")
            .unwrap();
        let names = chart.series.iter().map(|s| s.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["corn", "corn trend", "soybean", "soybean trend"]);
        assert!(chart.annotations[0].starts_with("Correlation: 0."));
    }

    #[test]
    fn only_states_with_three_rows_are_ranked() {
        let dir = fixtures::full("analytics_states");
        let page = render(&fixtures::context(&dir));

        let vulnerable = page
            .charts()
            .find(|c| c.title == "Top 10 States with Highest Volatility Increase")
            .unwrap();
        assert_eq!(vulnerable.series[0].points.len(), 1);
        assert_eq!(vulnerable.series[0].points[0].x, AxisValue::from("Iowa"));
        // Iowa: 6, 1, 3, -2
        assert_eq!(vulnerable.series[0].points[0].y, Some(2.0));
    }

    #[test]
    fn six_indicator_histograms_cover_every_row() {
        let dir = fixtures::full("analytics_histograms");
        let page = render(&fixtures::context(&dir));

        let histograms = page
            .charts()
            .filter(|c| c.kind == ChartKind::Histogram)
            .collect::<Vec<_>>();
        assert_eq!(histograms.len(), 6);
        for chart in histograms {
            let total: f64 = chart.series[0].points.iter().filter_map(|p| p.y).sum();
            assert!((total - 6.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn missing_feature_importance_halts() {
        let dir = fixtures::dir("analytics_missing");
        fixtures::write::<AnalysisRow>(&dir, &fixtures::analysis());
        let page = render(&fixtures::context(&dir));

        assert!(page.halted);
        assert_eq!(page.sections.len(), 1);
        assert!(page.notices().next().unwrap().message.starts_with("Data file not found!"));
    }
}
