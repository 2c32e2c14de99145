//! Landing page: headline counts, the analysis category mix, and the most
//! volatile county/crop pairs.

use std::collections::{BTreeMap, BTreeSet};

use yield_risk_dashboard_models::{
    Chart, ChartKind, MetricCard, PageId, PageRender, Point, Section, Series,
};
use yield_risk_risk_models::AnalysisRiskLabel;

use super::load_failure;
use crate::DashboardContext;
use crate::format::fixed;
use crate::stats::{largest_by, round_to};

/// Test R² shown when no metrics table is available.
const PUBLISHED_R2: f64 = 0.566;

const INTRODUCTION: &str = "\
### Understanding Agricultural Vulnerability to Climate Change

This dashboard presents an analysis of crop yield volatility across US \
agricultural counties from 2005-2023, examining how climate change is \
affecting the stability and predictability of corn and soybean production.

#### What is Yield Volatility?

Yield volatility measures how much crop production fluctuates year-to-year. \
High volatility means unpredictable farm income, higher insurance costs, \
food security risks, and economic instability in agricultural communities.";

/// Renders the overview page.
#[must_use]
pub fn render(ctx: &DashboardContext) -> PageRender {
    let mut page = PageRender::new(PageId::Overview);
    page.push(Section::markdown(
        "Climate Change Impact on US Agriculture (2005-2023)",
    ));

    let predictions = match ctx.store().predictions() {
        Ok(rows) => rows,
        Err(e) => {
            log::error!("Overview: {e}");
            return page.halt(load_failure(&e));
        }
    };
    let analysis = match ctx.store().analysis() {
        Ok(rows) => rows,
        Err(e) => {
            log::error!("Overview: {e}");
            return page.halt(load_failure(&e));
        }
    };

    let high_risk = predictions.iter().filter(|r| r.predicted_high_risk).count();
    let counties = predictions
        .iter()
        .map(|r| r.county_fp)
        .collect::<BTreeSet<_>>()
        .len();
    let (r2, r2_caption) = best_test_r2(ctx);

    page.push(Section::metrics(vec![
        MetricCard::new("High-Risk Counties", high_risk.to_string())
            .with_delta("Predicted by Model"),
        MetricCard::new("Total Counties", counties.to_string()).with_delta("Analyzed Across US"),
        MetricCard::new("Model R² Score", fixed(r2, 3)).with_delta(r2_caption),
    ]));
    page.push(Section::Divider);
    page.push(Section::heading(2, "Project Overview"));
    page.push(Section::markdown(INTRODUCTION));
    page.push(Section::Divider);

    page.push(Section::heading(
        2,
        "Risk Distribution Analysis (based on actual historical data)",
    ));
    page.push(Section::heading(3, "Counties by Risk Category"));

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for row in analysis.iter() {
        *counts.entry(row.risk_category.as_str()).or_default() += 1;
    }
    let mut slices = counts.into_iter().collect::<Vec<_>>();
    slices.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    #[allow(clippy::cast_precision_loss)]
    let pie_points = slices
        .iter()
        .map(|&(label, count)| {
            Point::new(label, count as f64)
                .with_color(AnalysisRiskLabel::parse(label).color())
        })
        .collect();
    page.push(Chart::new(
        ChartKind::Pie,
        "Risk Distribution",
        vec![Series::new("Risk Category", pie_points)],
    ));

    let badge = |label: AnalysisRiskLabel, title: &str| {
        let count: usize = slices
            .iter()
            .filter(|(name, _)| AnalysisRiskLabel::parse(name) == label)
            .map(|(_, count)| count)
            .sum();
        MetricCard::new(title, count.to_string())
            .with_delta("counties")
            .with_color(label.color())
    };
    page.push(Section::metrics(vec![
        badge(AnalysisRiskLabel::High, "High Risk"),
        badge(AnalysisRiskLabel::Medium, "Medium Risk"),
        badge(AnalysisRiskLabel::Low, "Low Risk"),
    ]));

    page.push(Section::heading(3, "Top 10 Highest Risk Counties"));
    let top = largest_by(analysis.iter(), 10, |row| row.yield_cv_change);
    let bars = top
        .iter()
        .rev()
        .map(|row| {
            let value = round_to(row.yield_cv_change, 2);
            Point::new(
                format!("{}, {} ({})", row.county_name, row.state_name, row.crop),
                value,
            )
            .with_text(format!("{value:.1}%"))
        })
        .collect();
    page.push(
        Chart::new(
            ChartKind::HorizontalBar,
            "Top 10 Highest Risk Counties",
            vec![Series::new("CV Change (%)", bars)],
        )
        .with_axes("Coefficient of Variation Change (%)", "County"),
    );

    page
}

/// Best test R² from the metrics table, or the published figure.
fn best_test_r2(ctx: &DashboardContext) -> (f64, String) {
    let best = ctx.store().model_metrics().ok().and_then(|rows| {
        rows.iter()
            .filter(|row| row.test_r2.is_finite())
            .max_by(|a, b| a.test_r2.total_cmp(&b.test_r2))
            .map(|row| (row.test_r2, format!("{} Performance", row.model)))
    });

    best.unwrap_or_else(|| (PUBLISHED_R2, "XGBoost Performance".to_string()))
}

#[cfg(test)]
mod tests {
    use yield_risk_dashboard_models::{NoticeLevel, Section};
    use yield_risk_dataset_models::{AnalysisRow, PredictionRow};

    use super::*;
    use crate::pages::fixtures;

    #[test]
    fn headline_metrics_count_flags_and_counties() {
        let dir = fixtures::full("overview");
        let page = render(&fixtures::context(&dir));

        assert!(!page.halted);
        let cards = page.metrics().collect::<Vec<_>>();
        assert_eq!(cards[0].value, "2");
        assert_eq!(cards[1].value, "4");
        assert_eq!(cards[2].value, "0.570");
        assert_eq!(cards[2].delta.as_deref(), Some("XGBoost Performance"));
    }

    #[test]
    fn badges_count_analysis_categories() {
        let dir = fixtures::full("overview_badges");
        let page = render(&fixtures::context(&dir));

        let cards = page.metrics().collect::<Vec<_>>();
        assert_eq!(cards[3].label, "High Risk");
        assert_eq!(cards[3].value, "2");
        assert_eq!(cards[4].value, "1");
        assert_eq!(cards[5].value, "1");
    }

    #[test]
    fn top_counties_listed_with_largest_at_top() {
        let dir = fixtures::full("overview_top");
        let page = render(&fixtures::context(&dir));

        let bar = page
            .charts()
            .find(|c| c.kind == ChartKind::HorizontalBar)
            .unwrap();
        let points = &bar.series[0].points;
        assert_eq!(points.len(), 6);
        assert_eq!(points.last().unwrap().y, Some(6.0));
        assert_eq!(points.last().unwrap().text.as_deref(), Some("6.0%"));
    }

    #[test]
    fn missing_analysis_halts() {
        let dir = fixtures::dir("overview_missing");
        fixtures::write::<PredictionRow>(&dir, fixtures::PREDICTIONS);
        let page = render(&fixtures::context(&dir));

        assert!(page.halted);
        let last = page.sections.last().unwrap();
        assert!(matches!(last, Section::Notice(n) if n.level == NoticeLevel::Error));
        assert!(page.charts().next().is_none());
    }

    #[test]
    fn falls_back_to_published_r2() {
        let dir = fixtures::dir("overview_r2");
        fixtures::write::<PredictionRow>(&dir, fixtures::PREDICTIONS);
        fixtures::write::<AnalysisRow>(&dir, &fixtures::analysis());
        let page = render(&fixtures::context(&dir));

        assert_eq!(page.metrics().nth(2).unwrap().value, "0.566");
    }
}
