//! Router configuration for the HTTP API.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // The browser client is served from another origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/weather", get(handlers::list_records).post(handlers::store_record))
        .route("/weather/compare", post(handlers::compare_cities))
        .route("/weather/{city}", get(handlers::get_weather))
        .route("/history", get(handlers::list_history).post(handlers::add_history))
        .route("/postal/{code}", get(handlers::lookup_postal_code))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
