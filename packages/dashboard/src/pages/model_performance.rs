//! Model comparison page.

use yield_risk_dashboard_models::{
    Chart, ChartKind, Notice, PageId, PageRender, Point, Section, Series,
};
use yield_risk_dataset_models::ModelMetricsRow;

use super::load_failure;
use crate::DashboardContext;
use crate::format::fixed;
use crate::stats::{largest_by, smallest_by};

const APPROACHES: &str = "\
**Three modeling approaches tested:**
- **Linear Regression**: Baseline, maximum interpretability
- **Random Forest**: Primary model, balance of performance and interpretability
- **XGBoost**: Advanced model, best performance";

/// Renders the model performance page. Falls back to the published
/// metrics when the metrics table cannot be loaded.
#[must_use]
pub fn render(ctx: &DashboardContext) -> PageRender {
    let mut page = PageRender::new(PageId::ModelPerformance);

    let table = ctx.store().model_metrics_or_published();
    if let Some(reason) = &table.fallback_reason {
        page.push(Notice::error(load_failure(reason)));
    }
    let rows = table.rows.as_slice();

    page.push(Section::heading(2, "Model Comparison"));
    page.push(Notice::info(APPROACHES));

    page.push(metric_chart(
        rows,
        "Model R² Score Comparison",
        "R² Score",
        |r| r.test_r2,
        3,
    ));
    if let Some(best) = largest_by(rows.iter(), 1, |r| r.test_r2).first() {
        page.push(Notice::success(format!(
            "Best model: **{}** with R² = {:.4}",
            best.model, best.test_r2
        )));
    }

    page.push(metric_chart(
        rows,
        "Model RMSE Comparison (Lower is Better)",
        "RMSE",
        |r| r.test_rmse,
        2,
    ));
    if let Some(best) = smallest_by(rows.iter(), 1, |r| r.test_rmse).first() {
        page.push(Notice::success(format!(
            "Best model: **{}** with RMSE = {:.2}%",
            best.model, best.test_rmse
        )));
    }
    page.push(Section::Divider);

    page.push(Section::heading(2, "Cross-Validation Results"));
    page.push(cross_validation_chart(rows));

    page
}

fn metric_chart(
    rows: &[ModelMetricsRow],
    title: &str,
    y_label: &str,
    value: fn(&ModelMetricsRow) -> f64,
    decimals: usize,
) -> Chart {
    let points = rows
        .iter()
        .map(|r| Point::new(r.model.as_str(), value(r)).with_text(fixed(value(r), decimals)))
        .collect();

    Chart::new(ChartKind::Bar, title, vec![Series::new(y_label, points)])
        .with_axes("Model", y_label)
}

fn cross_validation_chart(rows: &[ModelMetricsRow]) -> Chart {
    Chart::new(
        ChartKind::GroupedBar,
        "Cross-Validation vs Test Performance",
        vec![
            model_series(rows, "CV R² Mean", |r| r.cv_r2_mean).with_color("#3498db"),
            model_series(rows, "Test R²", |r| r.test_r2).with_color("#e74c3c"),
        ],
    )
    .with_axes("Model", "R² Score")
}

fn model_series(rows: &[ModelMetricsRow], name: &str, value: fn(&ModelMetricsRow) -> f64) -> Series {
    let points = rows
        .iter()
        .map(|r| Point::new(r.model.as_str(), value(r)))
        .collect();
    Series::new(name, points)
}
