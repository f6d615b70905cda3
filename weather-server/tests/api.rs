//! Router-level tests against an in-memory history and a scripted provider.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use tower::ServiceExt;
use weather_core::{
    HistoryStore, NewHistoryEntry, PostalAddress, PostalLookup, ProviderFailure, SqliteStore,
    WeatherError, WeatherProvider, WeatherService,
};
use weather_server::{AppState, create_router};

#[derive(Debug, Default)]
struct ScriptedProvider {
    payloads: HashMap<String, Value>,
}

#[async_trait]
impl WeatherProvider for ScriptedProvider {
    async fn fetch(&self, city: &str) -> Result<Value, ProviderFailure> {
        self.payloads
            .get(city)
            .cloned()
            .ok_or_else(|| ProviderFailure::Upstream("Your API request failed.".into()))
    }
}

#[derive(Debug)]
struct ScriptedPostal;

#[async_trait]
impl PostalLookup for ScriptedPostal {
    async fn lookup(&self, code: &str) -> Result<PostalAddress, WeatherError> {
        let code = weather_core::postal::normalize_postal_code(code)?;
        if code == "01001000" {
            Ok(PostalAddress { postal_code: code, city: "São Paulo".into(), state: Some("SP".into()) })
        } else {
            Err(WeatherError::NotFound(format!("Postal code {code} not found.")))
        }
    }
}

fn payload(city: &str, temperature: f64, humidity: i64, wind_speed: f64) -> Value {
    json!({
        "location": { "name": city, "country": "Brazil", "region": "", "localtime": "2026-10-19 10:00" },
        "current": {
            "temperature": temperature,
            "humidity": humidity,
            "wind_speed": wind_speed,
            "feelslike": temperature,
            "weather_descriptions": ["Sunny"],
            "weather_icons": ["https://cdn.example/sunny.png"],
            "wind_dir": "NE",
            "pressure": 1012
        }
    })
}

fn app() -> (Router, Arc<SqliteStore>) {
    let store = Arc::new(SqliteStore::in_memory().expect("in-memory store"));
    let provider = ScriptedProvider {
        payloads: HashMap::from([
            ("Natal".to_string(), payload("Natal", 22.0, 50, 5.0)),
            ("Cuiaba".to_string(), payload("Cuiabá", 30.0, 80, 20.0)),
        ]),
    };
    let service = WeatherService::new(store.clone(), Arc::new(provider), Arc::new(ScriptedPostal));
    (create_router(AppState::new(Arc::new(service))), store)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _) = app();
    let (status, body) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn get_weather_returns_normalized_fields() {
    let (app, store) = app();
    let (status, body) = send(&app, "GET", "/weather/Natal", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["city"], "Natal");
    assert_eq!(body["temperature"], 22.0);
    assert_eq!(body["humidity"], 50);
    assert_eq!(body["description"], "Sunny");
    assert_eq!(body["raw_data"]["current"]["wind_dir"], "NE");
    assert!(store.list_all().unwrap().is_empty());
}

#[tokio::test]
async fn get_weather_failure_is_400_with_message() {
    let (app, _) = app();
    let (status, body) = send(&app, "GET", "/weather/Nowhereland", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("Nowhereland"));
}

#[tokio::test]
async fn compare_returns_deltas_and_winner() {
    let (app, _) = app();
    let (status, body) =
        send(&app, "POST", "/weather/compare", Some(json!({ "city1": "Natal", "city2": "Cuiaba" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["city1"]["city"], "Natal");
    assert_eq!(body["city2"]["city"], "Cuiabá");
    assert_eq!(body["comparison"]["temperature_diff"], -8.0);
    assert_eq!(body["comparison"]["humidity_diff"], -30);
    assert_eq!(body["comparison"]["wind_speed_diff"], -15.0);
    assert_eq!(body["winner"], "city1");
}

#[tokio::test]
async fn compare_names_the_failing_city() {
    let (app, _) = app();
    let (status, body) =
        send(&app, "POST", "/weather/compare", Some(json!({ "city1": "Natal", "city2": "Atlantis" }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("Atlantis"));
}

#[tokio::test]
async fn compare_rejects_same_or_missing_city() {
    let (app, _) = app();

    let (status, _) =
        send(&app, "POST", "/weather/compare", Some(json!({ "city1": "Natal", "city2": "Natal" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "POST", "/weather/compare", Some(json!({ "city1": "Natal" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["message"].as_str().unwrap().contains("city2"));
}

#[tokio::test]
async fn compare_uses_fresh_history_without_provider() {
    let (app, store) = app();
    for (city, temperature) in [("Gramado", 12.0), ("Ilheus", 27.0)] {
        store
            .append(NewHistoryEntry {
                city: city.into(),
                temperature_c: Some(temperature),
                humidity_pct: Some(60),
                wind_speed_kmh: Some(10.0),
                ..Default::default()
            })
            .unwrap();
    }

    let (status, body) =
        send(&app, "POST", "/weather/compare", Some(json!({ "city1": "gramado", "city2": "ilheus" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["city1"]["source"], "cache");
    assert_eq!(body["city2"]["source"], "cache");
    assert_eq!(body["comparison"]["temperature_diff"], -15.0);
}

#[tokio::test]
async fn history_round_trip() {
    let (app, _) = app();

    let (status, created) = send(
        &app,
        "POST",
        "/history",
        Some(json!({ "city": "Natal", "cep": "59000000", "temperature": 29.5, "humidity": 70 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["postal_code"], "59000000");

    send(&app, "POST", "/history", Some(json!({ "city": "Recife", "temperature": 30 }))).await;

    let (status, listed) = send(&app, "GET", "/history", None).await;
    assert_eq!(status, StatusCode::OK);
    let cities: Vec<_> = listed.as_array().unwrap().iter().map(|e| e["city"].clone()).collect();
    assert_eq!(cities, vec![json!("Recife"), json!("Natal")]);
    assert!(listed[0].get("raw_data").is_none());
    assert_eq!(listed[1]["postal_code"], "59000000");
}

#[tokio::test]
async fn history_null_city_keeps_error_shape() {
    let (app, store) = app();
    let (status, body) = send(&app, "POST", "/history", Some(json!({ "city": null, "temperature": 20 }))).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, json!({ "success": false, "message": "The city field is required." }));
    assert!(store.list_all().unwrap().is_empty());
}

#[tokio::test]
async fn history_accepts_fractional_humidity() {
    let (app, _) = app();
    let (status, body) =
        send(&app, "POST", "/history", Some(json!({ "city": "Natal", "humidity": 55.5 }))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["humidity"], 56);
}

#[tokio::test]
async fn malformed_json_keeps_error_shape() {
    let (app, _) = app();
    for uri in ["/history", "/weather/compare", "/weather"] {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "{uri}");

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false, "{uri}");
        assert!(!body["message"].as_str().unwrap().is_empty());
    }
}

#[tokio::test]
async fn compare_trims_city_names() {
    let (app, _) = app();
    let (status, body) =
        send(&app, "POST", "/weather/compare", Some(json!({ "city1": " Natal ", "city2": "Cuiaba" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["city1"]["city"], "Natal");
}

#[tokio::test]
async fn history_requires_city() {
    let (app, store) = app();
    let (status, body) = send(&app, "POST", "/history", Some(json!({ "temperature": 20 }))).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert!(store.list_all().unwrap().is_empty());
}

#[tokio::test]
async fn weather_records_are_stored_without_validation() {
    let (app, _) = app();

    let (status, _) = send(&app, "POST", "/weather", Some(json!({}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(&app, "POST", "/weather", Some(json!({ "city": "Belo Horizonte" }))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, records) = send(&app, "GET", "/weather", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(records[0]["city"], "Belo Horizonte");
    assert_eq!(records.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn postal_lookup_statuses() {
    let (app, _) = app();

    let (status, body) = send(&app, "GET", "/postal/01001-000", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["city"], "São Paulo");

    let (status, _) = send(&app, "GET", "/postal/99999999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", "/postal/123", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
