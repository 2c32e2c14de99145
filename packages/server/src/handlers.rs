//! HTTP handler functions for the yield risk API.

use actix_web::{HttpResponse, web};
use yield_risk_dashboard::pages;
use yield_risk_dashboard_models::PageRender;
use yield_risk_model::ScenarioParams;
use yield_risk_server_models::{
    ApiClassification, ApiError, ApiHealth, ClassifyQuery, CountyExplorerQuery,
    ImpactModelerQuery, RiskMapQuery,
};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/classify`
///
/// Assigns the four-band risk category to a single value.
pub async fn classify(query: web::Query<ClassifyQuery>) -> HttpResponse {
    ApiClassification::new(query.value).map_or_else(
        || {
            HttpResponse::BadRequest().json(ApiError {
                error: "value must be a number".to_string(),
            })
        },
        |classification| HttpResponse::Ok().json(classification),
    )
}

/// `GET /api/pages/overview`
pub async fn overview(state: web::Data<AppState>) -> HttpResponse {
    render_blocking(move || pages::overview::render(&state.dashboard)).await
}

/// `GET /api/pages/risk-map`
///
/// Fetches county boundaries on first use. A failed fetch is handed to the
/// page, which falls back to a per-state scatter.
pub async fn risk_map(
    state: web::Data<AppState>,
    query: web::Query<RiskMapQuery>,
) -> HttpResponse {
    let boundaries = state.boundaries.boundaries().await;
    if let Err(e) = &boundaries {
        log::warn!(
            "Failed to load boundaries from {}: {e}",
            state.boundaries.url()
        );
    }
    let RiskMapQuery { search } = query.into_inner();

    render_blocking(move || {
        pages::risk_map::render(&state.dashboard, search.as_deref(), boundaries.as_deref())
    })
    .await
}

/// `GET /api/pages/county-explorer`
pub async fn county_explorer(
    state: web::Data<AppState>,
    query: web::Query<CountyExplorerQuery>,
) -> HttpResponse {
    let CountyExplorerQuery { county, crop } = query.into_inner();

    render_blocking(move || {
        pages::county_explorer::render(&state.dashboard, county.as_deref(), crop.as_deref())
    })
    .await
}

/// `GET /api/pages/impact-modeler`
///
/// Parameters left out of the query take their slider defaults.
pub async fn impact_modeler(
    state: web::Data<AppState>,
    query: web::Query<ImpactModelerQuery>,
) -> HttpResponse {
    let params = ScenarioParams::from(query.into_inner());

    render_blocking(move || pages::impact_modeler::render(&state.dashboard, &params)).await
}

/// `GET /api/pages/analytics`
pub async fn analytics(state: web::Data<AppState>) -> HttpResponse {
    render_blocking(move || pages::analytics::render(&state.dashboard)).await
}

/// `GET /api/pages/model-performance`
pub async fn model_performance(state: web::Data<AppState>) -> HttpResponse {
    render_blocking(move || pages::model_performance::render(&state.dashboard)).await
}

/// Runs a page handler on the blocking pool, since pages may read CSV
/// files on a cold cache.
async fn render_blocking(
    render: impl FnOnce() -> PageRender + Send + 'static,
) -> HttpResponse {
    match web::block(render).await {
        Ok(page) => HttpResponse::Ok().json(page),
        Err(e) => {
            log::error!("Page render failed: {e}");
            HttpResponse::InternalServerError().json(ApiError {
                error: "Failed to render page".to_string(),
            })
        }
    }
}
