//! Integration tests for `OpenMeteoSource::fetch`.
//!
//! Uses `wiremock` to stand up a local HTTP server for each test so no real
//! network traffic is made. Covers the happy path plus every error variant
//! the client can produce.

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use skysync_core::{Location, SecondarySources, WeatherFeature};
use skysync_sources::{OpenMeteoSource, SourceError, WeatherSource};

fn berlin() -> Location {
    Location {
        formatted_id: "berlin".to_string(),
        display_name: "Berlin".to_string(),
        latitude: 52.52,
        longitude: 13.405,
        is_current_position: false,
        weather_source: "openmeteo".to_string(),
        secondary_sources: SecondarySources::default(),
        weather: None,
    }
}

/// Client with a 5-second timeout, descriptive UA, and no retries.
fn test_source(server: &MockServer) -> OpenMeteoSource {
    OpenMeteoSource::new(5, "skysync-test/0.1", 0, 0)
        .expect("failed to build test OpenMeteoSource")
        .with_base_url(server.uri())
}

fn forecast_json() -> serde_json::Value {
    json!({
        "current": {
            "time": 1_700_000_000,
            "temperature_2m": 18.4,
            "relative_humidity_2m": 55.0,
            "surface_pressure": 1009.2,
            "wind_speed_10m": 4.1,
            "weather_code": 2
        },
        "hourly": {
            "time": [1_700_000_000i64, 1_700_003_600i64],
            "temperature_2m": [18.0, 17.2],
            "precipitation": [0.0, 0.1],
            "wind_speed_10m": [4.0, 4.5]
        },
        "daily": {
            "time": [1_700_000_000i64],
            "temperature_2m_min": [11.0],
            "temperature_2m_max": [19.0],
            "precipitation_sum": [0.3]
        }
    })
}

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_returns_weather_snapshot_on_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("latitude", "52.5200"))
        .and(query_param("longitude", "13.4050"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&forecast_json()))
        .mount(&server)
        .await;

    let source = test_source(&server);
    let result = source.fetch(&berlin(), &[]).await;

    let weather = result.expect("expected Ok snapshot");
    let current = weather.current.expect("expected current conditions");
    assert!((current.temperature_c - 18.4).abs() < 1e-9);
    assert_eq!(current.condition.as_deref(), Some("partly cloudy"));
    assert_eq!(weather.hourly.len(), 2);
    assert_eq!(weather.daily.len(), 1);
}

#[tokio::test]
async fn fetch_requests_minutely_only_when_feature_asked() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("minutely_15", "precipitation"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
            "minutely_15": {
                "time": [1_700_000_000i64],
                "precipitation": [0.2]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let source = test_source(&server);
    let weather = source
        .fetch(&berlin(), &[WeatherFeature::Minutely])
        .await
        .expect("expected Ok snapshot");
    assert_eq!(weather.minutely.len(), 1);
    assert_eq!(weather.minutely[0].precipitation_mm, Some(0.2));
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

#[tokio::test]
async fn http_429_maps_to_rate_limited_with_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "120"))
        .mount(&server)
        .await;

    let source = test_source(&server);
    let result = source.fetch(&berlin(), &[]).await;

    assert!(
        matches!(
            result,
            Err(SourceError::RateLimited {
                retry_after_secs: Some(120)
            })
        ),
        "expected RateLimited, got: {result:?}"
    );
}

#[tokio::test]
async fn http_401_maps_to_status_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&server)
        .await;

    let source = test_source(&server);
    let result = source.fetch(&berlin(), &[]).await;

    assert!(
        matches!(result, Err(SourceError::Status { status: 401, .. })),
        "expected Status(401), got: {result:?}"
    );
}

#[tokio::test]
async fn http_400_maps_to_invalid_location_with_api_reason() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(400).set_body_json(&json!({
            "error": true,
            "reason": "Latitude must be in range of -90 to 90"
        })))
        .mount(&server)
        .await;

    let source = test_source(&server);
    let result = source.fetch(&berlin(), &[]).await;

    assert!(
        matches!(
            result,
            Err(SourceError::InvalidLocation { ref reason }) if reason.contains("Latitude")
        ),
        "expected InvalidLocation, got: {result:?}"
    );
}

#[tokio::test]
async fn malformed_body_maps_to_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let source = test_source(&server);
    let result = source.fetch(&berlin(), &[]).await;

    assert!(
        matches!(result, Err(SourceError::Deserialize { .. })),
        "expected Deserialize, got: {result:?}"
    );
}

#[tokio::test]
async fn unusable_coordinates_fail_without_touching_the_network() {
    let server = MockServer::start().await;
    // No mock mounted: any request would 404 and fail the Status assertion.

    let mut location = berlin();
    location.latitude = 0.0;
    location.longitude = 0.0;

    let source = test_source(&server);
    let result = source.fetch(&location, &[]).await;

    assert!(
        matches!(result, Err(SourceError::InvalidLocation { .. })),
        "expected InvalidLocation, got: {result:?}"
    );
}

// ---------------------------------------------------------------------------
// Retry behavior
// ---------------------------------------------------------------------------

#[tokio::test]
async fn transient_5xx_is_retried_then_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&forecast_json()))
        .expect(1)
        .mount(&server)
        .await;

    let source = OpenMeteoSource::new(5, "skysync-test/0.1", 2, 0)
        .expect("failed to build test OpenMeteoSource")
        .with_base_url(server.uri());

    let result = source.fetch(&berlin(), &[]).await;
    assert!(result.is_ok(), "expected Ok after retry, got: {result:?}");
}

#[tokio::test]
async fn client_4xx_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let source = OpenMeteoSource::new(5, "skysync-test/0.1", 3, 0)
        .expect("failed to build test OpenMeteoSource")
        .with_base_url(server.uri());

    let result = source.fetch(&berlin(), &[]).await;
    assert!(
        matches!(result, Err(SourceError::Status { status: 403, .. })),
        "expected Status(403), got: {result:?}"
    );
}
