//! What-if scenario prediction.

use yield_risk_dashboard_models::{
    Cell, Chart, ChartKind, Gauge, GaugeBand, MetricCard, Notice, PageId, PageRender, Point,
    Section, Series, Table,
};
use yield_risk_model::ScenarioParams;
use yield_risk_model::scenario::{
    GAUGE_MAX, GAUGE_REFERENCE, confidence, drivers, gauge_steps, projected_volatility,
};

use crate::DashboardContext;

/// Renders the impact modeler for `params`. Out-of-range inputs are
/// clamped before scoring.
#[must_use]
pub fn render(ctx: &DashboardContext, params: &ScenarioParams) -> PageRender {
    let mut page = PageRender::new(PageId::ImpactModeler);
    let adapter = ctx.adapter();
    let params = params.clamped();

    if !adapter.is_available() {
        page.push(Notice::warning("Model not loaded. Showing demo predictions."));
    }

    let prediction = adapter.predict(&params);
    if adapter.is_available() && prediction.is_fallback() {
        page.push(Notice::warning(
            "Prediction error. Showing demo/fallback estimate instead.",
        ));
    }

    page.push(Section::Divider);
    page.push(inputs_table(&params));

    page.push(Section::heading(3, "Predicted Outcome"));
    page.push(Section::heading(4, "Predicted Volatility Change"));
    page.push(Gauge {
        title: "CV Change (%)".to_string(),
        value: prediction.value,
        reference: GAUGE_REFERENCE,
        delta: prediction.value - GAUGE_REFERENCE,
        max: GAUGE_MAX,
        bands: gauge_steps()
            .iter()
            .map(|step| GaugeBand {
                from: step.from,
                to: step.to,
                color: step.color.to_string(),
            })
            .collect(),
    });

    let risk = prediction.risk;
    let source = if prediction.is_fallback() {
        "Demo/fallback estimate"
    } else {
        "Trained model"
    };
    page.push(Section::metrics(vec![
        MetricCard::new("Risk Level", risk.label())
            .with_delta(risk.description())
            .with_color(risk.color()),
    ]));
    page.push(Section::Divider);
    page.push(Section::metrics(vec![
        MetricCard::new(
            "Projected Volatility",
            format!("{:.1}%", projected_volatility(&params, prediction.value)),
        )
        .with_delta(format!("+{:.1}% from baseline", prediction.value)),
        MetricCard::new(
            "Model Confidence",
            format!("{:.0}%", confidence(prediction.value)),
        )
        .with_delta("Based on similar scenarios"),
        MetricCard::new("Prediction Source", source),
    ]));

    page.push(Section::Divider);
    page.push(Section::heading(4, "Key Drivers in This Scenario"));
    let points = drivers(&params)
        .into_iter()
        .map(|driver| Point::new(driver.factor, driver.contribution))
        .collect();
    page.push(
        Chart::new(
            ChartKind::HorizontalBar,
            "Relative Contribution to Predicted Change",
            vec![Series::new("Contribution", points)],
        )
        .with_axes("Contribution", "Factor"),
    );

    page
}

fn inputs_table(params: &ScenarioParams) -> Table {
    let row = |name: &str, value: f64| vec![Cell::from(name), Cell::from(value)];
    Table {
        title: Some("Climate Parameters".to_string()),
        columns: vec!["Parameter".to_string(), "Value".to_string()],
        rows: vec![
            row("Average Temperature Change (°C)", params.temp_mean_change),
            row("Temperature Variability Change (°C)", params.temp_std_change),
            row("Maximum Temperature Change (°C)", params.temp_max_change),
            row("Extreme Heat Days Change", params.extreme_heat_days_change),
            row("NDVI Change", params.ndvi_mean_change),
            row("NDVI Variability Change", params.ndvi_std_change),
            row("Humidity Change (%)", params.humidity_change),
            row("Historical Average Yield (bu/acre)", params.early_yield_mean),
            row("Historical Volatility (CV %)", params.early_yield_cv),
            vec![Cell::from("Crop Type"), Cell::from(params.crop.to_string())],
        ],
    }
}
