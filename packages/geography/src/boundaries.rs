//! County boundary polygons from a remote `GeoJSON` endpoint.
//!
//! The collection is fetched on first use and kept for the life of the
//! process. A failed fetch is not cached; the next caller tries again.

use std::sync::Arc;
use std::time::Duration;

use geojson::{Feature, FeatureCollection, feature::Id};
use tokio::sync::OnceCell;
use yield_risk_geography_models::GeoCode;

use crate::GeographyError;

/// Public county boundary collection keyed by five-digit FIPS id.
pub const DEFAULT_BOUNDARIES_URL: &str =
    "https://raw.githubusercontent.com/plotly/datasets/master/geojson-counties-fips.json";

const USER_AGENT: &str = "yield-risk/0.1 (+https://github.com)";

/// Time allowed to establish the connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Time allowed for the whole request, body included.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Lazily fetched, process-wide boundary collection.
pub struct BoundaryService {
    client: reqwest::Client,
    url: String,
    cache: OnceCell<Arc<FeatureCollection>>,
}

impl BoundaryService {
    /// Creates a service that will fetch from `url` on first use.
    ///
    /// # Errors
    ///
    /// Returns [`GeographyError`] if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>) -> Result<Self, GeographyError> {
        Self::with_timeouts(url, CONNECT_TIMEOUT, REQUEST_TIMEOUT)
    }

    /// Creates a service with explicit connect and overall request
    /// timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`GeographyError`] if the HTTP client cannot be built.
    pub fn with_timeouts(
        url: impl Into<String>,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, GeographyError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
            cache: OnceCell::new(),
        })
    }

    /// Creates a service that already holds `collection` and never fetches.
    ///
    /// # Errors
    ///
    /// Returns [`GeographyError`] if the HTTP client cannot be built.
    pub fn preloaded(collection: FeatureCollection) -> Result<Self, GeographyError> {
        let mut service = Self::new(String::new())?;
        service.cache = OnceCell::new_with(Some(Arc::new(collection)));
        Ok(service)
    }

    /// Source URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the boundary collection, fetching it if this is the first
    /// successful call.
    ///
    /// # Errors
    ///
    /// Returns [`GeographyError`] if the download or parse fails.
    pub async fn boundaries(&self) -> Result<Arc<FeatureCollection>, GeographyError> {
        let collection = self
            .cache
            .get_or_try_init(|| async {
                let collection = fetch(&self.client, &self.url).await?;
                log::info!(
                    "Loaded {} boundary features from {}",
                    collection.features.len(),
                    self.url
                );
                Ok::<_, GeographyError>(Arc::new(collection))
            })
            .await?;

        Ok(Arc::clone(collection))
    }
}

/// Downloads and parses a `FeatureCollection`.
///
/// # Errors
///
/// Returns [`GeographyError`] on transport failure, a non-success status,
/// or an unparseable body.
pub async fn fetch(
    client: &reqwest::Client,
    url: &str,
) -> Result<FeatureCollection, GeographyError> {
    log::debug!("Fetching boundaries from {url}");
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        log::warn!("Boundary fetch returned HTTP {status}: {body:.200}");
        return Err(GeographyError::Conversion {
            message: format!("HTTP {status} from {url}"),
        });
    }

    let body = response.text().await?;
    parse_boundaries(&body)
}

/// Parses a `GeoJSON` `FeatureCollection` from a string.
///
/// # Errors
///
/// Returns [`GeographyError::GeoJson`] if `body` is not a
/// `FeatureCollection`.
pub fn parse_boundaries(body: &str) -> Result<FeatureCollection, GeographyError> {
    Ok(body.parse::<FeatureCollection>()?)
}

/// Extracts the county geo code from a boundary feature.
///
/// Uses the feature `id` when present (string or number). Otherwise falls
/// back to the `STATE` and `COUNTY` properties.
#[must_use]
pub fn feature_geo_code(feature: &Feature) -> Option<GeoCode> {
    match &feature.id {
        Some(Id::String(id)) => GeoCode::parse(id),
        Some(Id::Number(id)) => id.as_u64().and_then(|n| GeoCode::parse(&n.to_string())),
        None => {
            let state = feature.property("STATE")?.as_str()?;
            let county = feature.property("COUNTY")?.as_str()?;
            if state.len() != 2 || county.len() != 3 {
                return None;
            }
            GeoCode::parse(&format!("{state}{county}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLLECTION: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "id": "06001", "properties": {},
             "geometry": {"type": "Point", "coordinates": [-122.0, 37.6]}},
            {"type": "Feature", "id": 1001, "properties": {},
             "geometry": {"type": "Point", "coordinates": [-86.6, 32.5]}},
            {"type": "Feature", "properties": {"STATE": "48", "COUNTY": "453"},
             "geometry": {"type": "Point", "coordinates": [-97.7, 30.3]}},
            {"type": "Feature", "properties": {"NAME": "nowhere"}, "geometry": null}
        ]
    }"#;

    #[test]
    fn parses_collection_and_reads_ids() {
        let collection = parse_boundaries(COLLECTION).unwrap();
        let codes: Vec<_> = collection.features.iter().map(feature_geo_code).collect();

        assert_eq!(
            codes,
            vec![
                Some(GeoCode::from_parts(6, 1).unwrap()),
                Some(GeoCode::from_parts(1, 1).unwrap()),
                Some(GeoCode::from_parts(48, 453).unwrap()),
                None,
            ]
        );
    }

    #[test]
    fn rejects_non_collections() {
        assert!(parse_boundaries("{\"type\": \"Point\", \"coordinates\": [0, 0]}").is_err());
        assert!(parse_boundaries("not json").is_err());
    }

    #[tokio::test]
    async fn preloaded_service_does_not_fetch() {
        let collection = parse_boundaries(COLLECTION).unwrap();
        let service = BoundaryService::preloaded(collection).unwrap();

        let first = service.boundaries().await.unwrap();
        let second = service.boundaries().await.unwrap();
        assert_eq!(first.features.len(), 4);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn failed_fetch_is_not_cached() {
        let service = BoundaryService::new("http://127.0.0.1:9/counties.json").unwrap();
        assert!(service.boundaries().await.is_err());
        assert!(service.cache.get().is_none());
    }

    #[test]
    fn default_timeouts_stay_short() {
        assert!(CONNECT_TIMEOUT <= REQUEST_TIMEOUT);
        assert!(REQUEST_TIMEOUT <= Duration::from_secs(15));
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        // Never accepted, so the request is sent but never answered.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/counties.json", listener.local_addr().unwrap());
        let service =
            BoundaryService::with_timeouts(url, CONNECT_TIMEOUT, Duration::from_millis(200))
                .unwrap();

        let started = std::time::Instant::now();
        let result = service.boundaries().await;

        assert!(matches!(result, Err(GeographyError::Http(ref e)) if e.is_timeout()));
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(service.cache.get().is_none());
        drop(listener);
    }
}
