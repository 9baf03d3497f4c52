//! Integration tests for the API client.
//!
//! These tests use wiremock to simulate the dashboard backend and verify
//! request shape, decoding and error mapping.

use aqi_dashboard::{
    api::{ApiError, DashboardApiClient},
    config::NetworkConfig,
    prediction::PresetCatalog,
};
use chrono::NaiveDate;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

const HISTORICAL_BODY: &str = r#"{
    "stats": {
        "aqi": {"mean": 72.4, "max": 130.0, "min": 20.0},
        "pm25": {"mean": 35.1, "max": 88.2, "min": 8.0},
        "total_points": 3,
        "missing_ratio": 0.05,
        "outlier_ratio": 0.01
    },
    "timestamps": ["2024-03-01 00:00:00", "2024-03-01 01:00:00", "2024-03-01 02:00:00"],
    "aqi_values": [20.0, 45.0, 130.0],
    "pm25_values": [8.0, 20.5, 88.2]
}"#;

const PREDICTION_BODY: &str = r#"{
    "timestamps": ["2024-03-01 10:00:00", "2024-03-01 11:00:00"],
    "actual": [40, 45],
    "predicted": [42, 48],
    "confidence": [[38, 46], [44, 52]]
}"#;

fn network() -> NetworkConfig {
    NetworkConfig {
        request_timeout_secs: 10,
        connect_timeout_secs: 5,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Test the historical query string and a successful decode.
#[tokio::test]
async fn test_fetch_historical_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/historical_data"))
        .and(query_param("start_date", "2024-03-01"))
        .and(query_param("end_date", "2024-03-31"))
        .respond_with(ResponseTemplate::new(200).set_body_string(HISTORICAL_BODY))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = DashboardApiClient::new(&mock_server.uri(), &network())
        .expect("Client creation should succeed");

    let series = client
        .fetch_historical(date(2024, 3, 1), date(2024, 3, 31))
        .await
        .expect("Fetch should succeed");

    assert_eq!(series.readings.len(), 3);
    assert_eq!(series.readings[1].aqi, 45.0);
    assert_eq!(series.readings[2].pm25, 88.2);
    assert_eq!(series.stats.total_points, 3);
    assert_eq!(series.stats.aqi.max, 130.0);
}

/// Test the range preset is passed through as-is.
#[tokio::test]
async fn test_fetch_predictions_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/predictions"))
        .and(query_param("range", "48h"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PREDICTION_BODY))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = DashboardApiClient::new(&mock_server.uri(), &network()).unwrap();
    let preset = PresetCatalog::default().get("48h").unwrap();

    let series = client.fetch_predictions(&preset).await.unwrap();

    assert_eq!(series.len(), 2);
    assert_eq!(series.latest_actual(), Some(45.0));
    let first = series.first().unwrap();
    assert_eq!(first.predicted, 42.0);
    assert_eq!(first.confidence.display_text(), "38-46");
}

/// Test a base URL with a path prefix keeps the prefix.
#[tokio::test]
async fn test_base_url_path_prefix() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/dashboard/api/predictions"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PREDICTION_BODY))
        .expect(1)
        .mount(&mock_server)
        .await;

    let base = format!("{}/dashboard", mock_server.uri());
    let client = DashboardApiClient::new(&base, &network()).unwrap();
    let preset = PresetCatalog::default().get("24h").unwrap();

    assert!(client.fetch_predictions(&preset).await.is_ok());
}

/// Test handling of HTTP error statuses.
#[tokio::test]
async fn test_fetch_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/historical_data"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let client = DashboardApiClient::new(&mock_server.uri(), &network()).unwrap();
    let result = client
        .fetch_historical(date(2024, 3, 1), date(2024, 3, 2))
        .await;

    assert_eq!(result, Err(ApiError::Status(500)));
}

#[tokio::test]
async fn test_fetch_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/predictions"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = DashboardApiClient::new(&mock_server.uri(), &network()).unwrap();
    let preset = PresetCatalog::default().get("24h").unwrap();

    assert_eq!(
        client.fetch_predictions(&preset).await,
        Err(ApiError::Status(404))
    );
}

/// Test handling of invalid JSON.
#[tokio::test]
async fn test_fetch_invalid_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/predictions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let client = DashboardApiClient::new(&mock_server.uri(), &network()).unwrap();
    let preset = PresetCatalog::default().get("24h").unwrap();

    let result = client.fetch_predictions(&preset).await;
    assert!(matches!(result, Err(ApiError::Malformed(_))));
}

/// Test handling of a response missing required fields.
#[tokio::test]
async fn test_fetch_missing_fields() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/historical_data"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"timestamps": [], "aqi_values": []}"#),
        )
        .mount(&mock_server)
        .await;

    let client = DashboardApiClient::new(&mock_server.uri(), &network()).unwrap();
    let result = client
        .fetch_historical(date(2024, 3, 1), date(2024, 3, 2))
        .await;

    assert!(matches!(result, Err(ApiError::Malformed(_))));
}

/// Test misaligned arrays are rejected rather than truncated.
#[tokio::test]
async fn test_fetch_misaligned_arrays() {
    let mock_server = MockServer::start().await;

    let body = r#"{
        "timestamps": ["2024-03-01 10:00:00", "2024-03-01 11:00:00"],
        "actual": [40, null],
        "predicted": [42],
        "confidence": [[38, 46], [44, 52]]
    }"#;

    Mock::given(method("GET"))
        .and(path("/api/predictions"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&mock_server)
        .await;

    let client = DashboardApiClient::new(&mock_server.uri(), &network()).unwrap();
    let preset = PresetCatalog::default().get("24h").unwrap();

    match client.fetch_predictions(&preset).await {
        Err(ApiError::Malformed(msg)) => assert!(msg.contains("predicted")),
        other => panic!("expected malformed response, got {other:?}"),
    }
}

/// Test an unreachable backend maps to a network error.
#[tokio::test]
async fn test_fetch_connection_refused() {
    let mock_server = MockServer::start().await;
    let uri = mock_server.uri();
    drop(mock_server);

    let client = DashboardApiClient::new(&uri, &network()).unwrap();
    let result = client
        .fetch_historical(date(2024, 3, 1), date(2024, 3, 2))
        .await;

    assert!(matches!(result, Err(ApiError::Network(_))));
}

#[test]
fn test_invalid_base_url_rejected() {
    assert!(DashboardApiClient::new("not a url", &network()).is_err());
}

/// Test a slow backend trips the request timeout.
#[tokio::test]
async fn test_fetch_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/predictions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(PREDICTION_BODY)
                .set_delay(std::time::Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let config = NetworkConfig {
        request_timeout_secs: 1,
        connect_timeout_secs: 1,
    };
    let client = DashboardApiClient::new(&mock_server.uri(), &config).unwrap();
    let preset = PresetCatalog::default().get("24h").unwrap();

    let result = client.fetch_predictions(&preset).await;
    assert!(matches!(result, Err(ApiError::Network(_))));
}
