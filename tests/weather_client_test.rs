// Weather client tests
// Uses mockito for HTTP mocking

use std::time::Duration;

use farm_tracker_service::fetch_error::WeatherError;
use farm_tracker_service::weather::WeatherClient;
use mockito::{Matcher, Server};

const CURRENT_BODY: &str = r#"{
    "main": {"temp": 27.4, "humidity": 81, "temp_min": 25.0, "temp_max": 29.0},
    "rain": {"1h": 1.2},
    "name": "Londrina"
}"#;

const FORECAST_BODY: &str = r#"{
    "cod": "200",
    "list": [
        {"dt_txt": "2025-03-01 12:00:00", "main": {"temp": 28.0, "humidity": 60, "temp_min": 26.0, "temp_max": 30.0}},
        {"dt_txt": "2025-03-01 15:00:00", "main": {"temp": 30.0, "humidity": 55}},
        {"dt_txt": "not a time", "main": {"temp": 20.0, "humidity": 90}}
    ]
}"#;

fn client(server: &Server) -> WeatherClient {
    WeatherClient::new(server.url(), "test-key", Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_fetch_current_and_forecast() {
    let mut server = Server::new_async().await;

    let current = server
        .mock("GET", "/weather")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("q".into(), "Londrina".into()),
            Matcher::UrlEncoded("appid".into(), "test-key".into()),
            Matcher::UrlEncoded("units".into(), "metric".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(CURRENT_BODY)
        .create_async()
        .await;
    let forecast = server
        .mock("GET", "/forecast")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(FORECAST_BODY)
        .create_async()
        .await;

    let report = client(&server).fetch("Londrina").await.unwrap();

    assert_eq!(report.city, "Londrina");
    assert_eq!(report.current.temperature_c, 27.4);
    assert_eq!(report.current.humidity_pct, 81.0);
    assert_eq!(report.current.rainfall_mm, 1.2);

    assert_eq!(report.forecast.len(), 2);
    assert_eq!(report.forecast[0].mean_c, 28.0);
    assert_eq!(report.forecast[0].max_c, 30.0);
    // min/max absent: both fall back to temp
    assert_eq!(report.forecast[1].min_c, 30.0);
    assert_eq!(report.forecast[1].mean_c, 30.0);

    current.assert_async().await;
    forecast.assert_async().await;
}

#[tokio::test]
async fn test_missing_rain_block_reads_as_zero() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/weather")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"main": {"temp": 18.0, "humidity": 40}}"#)
        .create_async()
        .await;

    let current = client(&server).fetch_current("Curitiba").await.unwrap();
    assert_eq!(current.rainfall_mm, 0.0);
    assert_eq!(current.temperature_c, 18.0);
}

#[tokio::test]
async fn test_server_error_gives_none() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/weather")
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;

    let weather = client(&server);
    assert!(weather.fetch("Londrina").await.is_none());

    match weather.fetch_current("Londrina").await {
        Err(WeatherError::Status(code)) => assert_eq!(code, 500),
        other => panic!("Expected status error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/weather")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;

    let result = client(&server).fetch_current("Londrina").await;
    assert!(matches!(result, Err(WeatherError::Parse(_))));
}

#[tokio::test]
async fn test_forecast_with_error_code_is_empty() {
    let mut server = Server::new_async().await;
    let _current = server
        .mock("GET", "/weather")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(CURRENT_BODY)
        .create_async()
        .await;
    let _forecast = server
        .mock("GET", "/forecast")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"cod": "404", "message": "city not found"}"#)
        .create_async()
        .await;

    let report = client(&server).fetch("Londrina").await.unwrap();
    assert!(report.forecast.is_empty());
    assert_eq!(report.current.humidity_pct, 81.0);
}

#[tokio::test]
async fn test_forecast_http_error_keeps_current_conditions() {
    let mut server = Server::new_async().await;
    let _current = server
        .mock("GET", "/weather")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"main": {"temp": 27.4, "humidity": 81}}"#)
        .create_async()
        .await;
    let _forecast = server
        .mock("GET", "/forecast")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body(r#"{"cod": "404", "message": "city not found"}"#)
        .create_async()
        .await;

    let weather = client(&server);
    assert!(weather.fetch_forecast("Londrina").await.unwrap().is_empty());

    let report = weather.fetch("Londrina").await.unwrap();
    assert!(report.forecast.is_empty());
    assert_eq!(report.current.temperature_c, 27.4);
    assert_eq!(report.current.rainfall_mm, 0.0);
}
