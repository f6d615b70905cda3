//! HTTP handlers for the REST API.
//!
//! Each handler validates its input and delegates to [`weather_core::WeatherService`].
//! JSON bodies are taken as `Result<Json<_>, JsonRejection>` so decode failures
//! keep the `{success, message}` error shape.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use weather_core::{WeatherError, WeatherService};

use super::dto::{
    CompareRequest, CompareResponse, HealthResponse, HistoryEntry, HistoryListItem, NewHistoryEntry,
    NewWeatherRecord, PostalAddress, WeatherRecord, WeatherResponse,
};
use super::error::AppError;
use super::state::AppState;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Run a synchronous history call off the async worker threads.
async fn blocking<T, F>(state: &AppState, call: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&WeatherService) -> Result<T, WeatherError> + Send + 'static,
{
    let service = Arc::clone(&state.service);
    tokio::task::spawn_blocking(move || call(&service))
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {e}")))?
        .map_err(AppError::from)
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok".to_string(), version: env!("CARGO_PKG_VERSION").to_string() })
}

/// GET /weather/{city}
///
/// Live provider lookup; history is neither consulted nor written.
pub async fn get_weather(
    State(state): State<AppState>,
    Path(city): Path<String>,
) -> HandlerResult<WeatherResponse> {
    let snapshot = state.service.live(&city).await?;
    Ok(Json(snapshot.into()))
}

/// POST /weather/compare
pub async fn compare_cities(
    State(state): State<AppState>,
    payload: Result<Json<CompareRequest>, JsonRejection>,
) -> HandlerResult<CompareResponse> {
    let Json(request) = payload?;
    let city1 = required(request.city1, "city1")?;
    let city2 = required(request.city2, "city2")?;

    let result = state.service.compare(&city1, &city2).await?;
    tracing::info!(%city1, %city2, winner = ?result.winner, "cities compared");
    Ok(Json(result.into()))
}

/// GET /history
///
/// Entries are listed without their raw provider payload.
pub async fn list_history(State(state): State<AppState>) -> HandlerResult<Vec<HistoryListItem>> {
    let entries = blocking(&state, |service| service.history()).await?;
    Ok(Json(entries.into_iter().map(HistoryListItem::from).collect()))
}

/// POST /history
pub async fn add_history(
    State(state): State<AppState>,
    payload: Result<Json<NewHistoryEntry>, JsonRejection>,
) -> Result<(StatusCode, Json<HistoryEntry>), AppError> {
    let Json(entry) = payload?;
    let saved = blocking(&state, move |service| service.append_history(entry)).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

/// POST /weather
pub async fn store_record(
    State(state): State<AppState>,
    payload: Result<Json<NewWeatherRecord>, JsonRejection>,
) -> Result<(StatusCode, Json<WeatherRecord>), AppError> {
    let Json(record) = payload?;
    let saved = blocking(&state, move |service| service.add_record(record)).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

/// GET /weather
pub async fn list_records(State(state): State<AppState>) -> HandlerResult<Vec<WeatherRecord>> {
    Ok(Json(blocking(&state, |service| service.records()).await?))
}

/// GET /postal/{code}
pub async fn lookup_postal_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> HandlerResult<PostalAddress> {
    Ok(Json(state.service.resolve_postal_code(&code).await?))
}

fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Unprocessable(format!("The {field} field is required.")))
}
