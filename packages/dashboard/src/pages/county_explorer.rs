//! Single county deep dive: metrics, yield history, climate indicators,
//! and comparison with the state average.

use yield_risk_dashboard_models::{
    Chart, ChartKind, MetricCard, Notice, PageId, PageRender, Point, ReferenceLine, Section,
    Series,
};
use yield_risk_dataset_models::{AnalysisRow, HistoricalRow};
use yield_risk_risk_models::AnalysisRiskLabel;

use super::load_failure;
use crate::DashboardContext;
use crate::filters::{county_options, distinct_crops, rows_for_county};
use crate::format::{capitalize, fixed, percent};
use crate::stats::{mean, rolling_std};

/// Trailing window for the rolling volatility chart, in years.
pub const ROLLING_WINDOW: usize = 3;

/// Renders the county explorer.
///
/// `county` is a `"County, State"` key and defaults to the first county in
/// sorted order. `crop` defaults to the first crop listed for the county.
#[must_use]
pub fn render(ctx: &DashboardContext, county: Option<&str>, crop: Option<&str>) -> PageRender {
    let mut page = PageRender::new(PageId::CountyExplorer);

    let analysis = match ctx.store().analysis() {
        Ok(rows) => rows,
        Err(e) => {
            log::error!("County explorer: {e}");
            return page.halt(load_failure(&e));
        }
    };
    let history = match ctx.store().historical() {
        Ok(rows) => rows,
        Err(e) => {
            log::error!("County explorer: {e}");
            return page.halt(load_failure(&e));
        }
    };

    let options = county_options(&analysis);
    let Some(selected) = county
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .or_else(|| options.first().map(String::as_str))
    else {
        page.push(Notice::info("No counties available"));
        return page;
    };

    let county_rows = rows_for_county(&analysis, selected);
    if county_rows.is_empty() {
        page.push(Notice::info(format!("County \"{selected}\" not found")));
        return page;
    }

    let crops = distinct_crops(&county_rows);
    let selected_crop = match crop.map(str::trim).filter(|c| !c.is_empty()) {
        Some(requested) => crops.iter().find(|c| c.eq_ignore_ascii_case(requested)),
        None => crops.first(),
    };
    let Some(record) = selected_crop.and_then(|c| county_rows.iter().find(|r| &r.crop == c)) else {
        page.push(Notice::info(format!(
            "No {} data for {selected}",
            crop.unwrap_or("crop")
        )));
        return page;
    };

    page.push(Section::markdown(format!(
        "**County:** {selected}  \n**Crop:** {}  \n**Available crops:** {}",
        record.crop,
        crops.join(", ")
    )));
    page.push(Section::metrics(headline_cards(record)));
    page.push(Section::Divider);

    push_history(&mut page, &history, record);

    page.push(Section::Divider);
    push_climate(&mut page, record);
    page.push(Section::Divider);
    page.push(risk_factors(record));
    page.push(Section::Divider);
    push_state_comparison(&mut page, &analysis, record);

    page
}

fn headline_cards(record: &AnalysisRow) -> Vec<MetricCard> {
    let label = AnalysisRiskLabel::parse(&record.risk_category);
    let change = record.yield_cv_change;
    let arrow = if change > 0.0 { '↑' } else { '↓' };

    let mut cards = vec![
        MetricCard::new("Risk Category", record.risk_category.clone())
            .with_delta(label.marker())
            .with_color(label.color()),
        MetricCard::new("Volatility Change", percent(change, 2))
            .with_delta(format!("{arrow} from baseline")),
    ];
    if let Some(predicted) = record.predicted_cv_change {
        cards.push(
            MetricCard::new("Predicted Change", percent(predicted, 2)).with_delta("Model prediction"),
        );
    }
    cards.push(
        MetricCard::new("Current Volatility", percent(record.late_yield_cv, 2)).with_delta(format!(
            "{} vs 2005-2014",
            percent(record.late_yield_cv - record.early_yield_cv, 2)
        )),
    );
    cards
}

fn push_history(page: &mut PageRender, history: &[HistoricalRow], record: &AnalysisRow) {
    let mut rows = history
        .iter()
        .filter(|r| {
            r.county_name == record.county_name
                && r.state_name == record.state_name
                && r.crop == record.crop
        })
        .collect::<Vec<_>>();
    if rows.is_empty() {
        page.push(Notice::info("No historical yield records for this county and crop"));
        return;
    }
    rows.sort_by_key(|r| r.year);

    page.push(Section::heading(3, "Historical Yield Trends"));

    let yields = rows.iter().map(|r| r.yield_value).collect::<Vec<_>>();
    let trend = rows
        .iter()
        .map(|r| Point::new(r.year, r.yield_value))
        .collect();
    let mut chart = Chart::new(
        ChartKind::Line,
        format!("{} Yield Trend (2005-2023)", capitalize(&record.crop)),
        vec![Series::new("Yield", trend)],
    )
    .with_axes("Year", "Yield (bu/acre)");
    if let Some(average) = mean(yields.iter().copied()) {
        chart = chart.with_reference_line(ReferenceLine {
            y: average,
            label: "Average".to_string(),
            color: "red".to_string(),
        });
    }
    page.push(chart);

    let rolling = rows
        .iter()
        .zip(rolling_std(&yields, ROLLING_WINDOW))
        .map(|(r, std)| Point::maybe(r.year, std))
        .collect();
    page.push(
        Chart::new(
            ChartKind::Line,
            "3-Year Rolling Volatility",
            vec![Series::new("Rolling Std", rolling).with_color("#e74c3c")],
        )
        .with_axes("Year", "Standard Deviation (bu/acre)"),
    );
}

fn push_climate(page: &mut PageRender, record: &AnalysisRow) {
    page.push(Section::heading(3, "Climate Change Indicators"));

    page.push(Section::heading(4, "Temperature"));
    page.push(Section::metrics(vec![
        MetricCard::new("Avg Temperature Change", format!("{}°C", fixed(record.t2m_mean_change, 2))),
        MetricCard::new("Temperature Variability", format!("{}°C", fixed(record.t2m_std_change, 2))),
        MetricCard::new(
            "Extreme Heat Days",
            format!("+{} days", fixed(record.extreme_heat_days_change, 1)),
        ),
    ]));

    page.push(Section::heading(4, "Vegetation Health"));
    page.push(Section::metrics(vec![
        MetricCard::new("NDVI Change", fixed(record.ndvi_mean_change, 3)),
        MetricCard::new("NDVI Variability", fixed(record.ndvi_std_change, 3)),
        MetricCard::new("EVI Change", fixed(record.evi_mean_change, 3)),
    ]));

    page.push(Section::heading(4, "Other Factors"));
    page.push(Section::metrics(vec![
        MetricCard::new("Humidity Change", percent(record.rh2m_mean_change, 2)),
        MetricCard::new("Solar Radiation", fixed(record.solar_radiation_change, 2)),
        MetricCard::new("Water Stress (NDWI)", fixed(record.ndwi_mean_change, 3)),
    ]));
}

fn factor_color(value: f64) -> &'static str {
    if value > 0.0 {
        "#e74c3c"
    } else if value < 0.0 {
        "#27ae60"
    } else {
        "#f39c12"
    }
}

/// Scaled risk factors, smallest magnitude first.
fn risk_factors(record: &AnalysisRow) -> Chart {
    let mut factors = [
        ("Temperature Variability", record.t2m_std_change),
        ("Extreme Heat Days", record.extreme_heat_days_change),
        ("NDVI Variability", record.ndvi_std_change * 10.0),
        ("Avg Temperature", record.t2m_mean_change),
        ("Baseline Volatility", record.early_yield_cv / 10.0),
    ];
    factors.sort_by(|a, b| a.1.abs().total_cmp(&b.1.abs()));

    let points = factors
        .into_iter()
        .map(|(factor, change)| Point::new(factor, change).with_color(factor_color(change)))
        .collect();

    Chart::new(
        ChartKind::HorizontalBar,
        "Relative Changes in Key Risk Factors",
        vec![Series::new("Change", points)],
    )
    .with_axes("Change", "Factor")
}

fn push_state_comparison(page: &mut PageRender, analysis: &[AnalysisRow], record: &AnalysisRow) {
    page.push(Section::heading(
        3,
        format!(
            "How Does {} Compare to {}?",
            record.county_name, record.state_name
        ),
    ));

    let state_average = mean(
        analysis
            .iter()
            .filter(|r| r.state_name == record.state_name && r.crop == record.crop)
            .map(|r| r.yield_cv_change),
    );
    let change = record.yield_cv_change;

    let Some(state_average) = state_average.filter(|_| change.is_finite()) else {
        page.push(Notice::info("Not enough data to compare with the state average"));
        return;
    };

    let points = vec![
        Point::new(record.county_name.as_str(), change),
        Point::new(format!("{} Average", record.state_name), state_average),
    ];
    page.push(
        Chart::new(
            ChartKind::Bar,
            format!("Volatility Change Comparison - {}", capitalize(&record.crop)),
            vec![Series::new("Volatility Change", points)],
        )
        .with_axes("Location", "Volatility Change"),
    );

    if change > state_average {
        page.push(Notice::warning(format!(
            "This county is experiencing **{:.2}% more** volatility increase than the state average",
            change - state_average
        )));
    } else {
        page.push(Notice::success(format!(
            "This county is performing **{:.2}% better** than the state average",
            state_average - change
        )));
    }
}

#[cfg(test)]
mod tests {
    use yield_risk_dashboard_models::{AxisValue, NoticeLevel};

    use super::*;
    use crate::pages::fixtures;

    #[test]
    fn defaults_to_first_county_and_crop() {
        let dir = fixtures::full("explorer_default");
        let page = render(&fixtures::context(&dir), None, None);

        assert!(!page.halted);
        let heading = page.sections.iter().find_map(|s| match s {
            Section::Heading { text, .. } if text.starts_with("How Does") => Some(text.clone()),
            _ => None,
        });
        assert_eq!(heading.as_deref(), Some("How Does Adair Compare to Iowa?"));
    }

    #[test]
    fn history_sorted_with_rolling_volatility() {
        let dir = fixtures::full("explorer_history");
        let page = render(&fixtures::context(&dir), Some("Story, Iowa"), Some("corn"));

        let trend = page.charts().find(|c| c.title == "Corn Yield Trend (2005-2023)").unwrap();
        let years = trend.series[0].points.iter().map(|p| p.x.clone()).collect::<Vec<_>>();
        assert_eq!(years, [2005_i32, 2006, 2007].map(AxisValue::from).to_vec());
        assert!((trend.reference_lines[0].y - 170.0).abs() < 1e-9);

        let rolling = page.charts().find(|c| c.title == "3-Year Rolling Volatility").unwrap();
        let values = rolling.series[0].points.iter().map(|p| p.y).collect::<Vec<_>>();
        assert_eq!(values[0], None);
        assert!((values[1].unwrap() - 200.0_f64.sqrt()).abs() < 1e-9);
        assert!((values[2].unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn compares_against_state_average_for_same_crop() {
        let dir = fixtures::full("explorer_compare");
        let page = render(&fixtures::context(&dir), Some("Story, Iowa"), Some("Corn"));

        // Iowa corn: 6.0, 3.0, -2.0 -> mean 2.333
        let notice = page.notices().last().unwrap();
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert!(notice.message.contains("3.67% more"));
    }

    #[test]
    fn risk_factors_sorted_by_magnitude() {
        let dir = fixtures::full("explorer_factors");
        let page = render(&fixtures::context(&dir), Some("Story, Iowa"), Some("corn"));

        let chart = page
            .charts()
            .find(|c| c.title == "Relative Changes in Key Risk Factors")
            .unwrap();
        let magnitudes = chart.series[0]
            .points
            .iter()
            .map(|p| p.y.unwrap().abs())
            .collect::<Vec<_>>();
        assert!(magnitudes.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(chart.series[0].points.last().unwrap().x, AxisValue::from("Extreme Heat Days"));
    }

    #[test]
    fn missing_history_halts() {
        let dir = fixtures::dir("explorer_no_history");
        fixtures::write::<AnalysisRow>(&dir, &fixtures::analysis());
        let page = render(&fixtures::context(&dir), Some("Story, Iowa"), None);

        assert!(page.halted);
        assert_eq!(page.sections.len(), 1);
        assert!(page.charts().next().is_none());
        let notice = page.notices().next().unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.message.starts_with("Data file not found!"));
    }

    #[test]
    fn unknown_county_shows_info() {
        let dir = fixtures::full("explorer_unknown");
        let page = render(&fixtures::context(&dir), Some("Nowhere, Utopia"), None);

        assert!(!page.halted);
        assert!(page.charts().next().is_none());
        assert_eq!(page.notices().next().unwrap().level, NoticeLevel::Info);
    }

    #[test]
    fn missing_analysis_halts() {
        let dir = fixtures::dir("explorer_missing");
        let page = render(&fixtures::context(&dir), None, None);
        assert!(page.halted);
    }
}
