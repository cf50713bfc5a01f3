pub mod charges;
pub mod users;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::db;
use crate::services::metrics;
use crate::AppState;

/// Liveness plus a database round trip.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "healthy", "database": "up" })),
        ),
        Err(err) => {
            tracing::error!(error = %err, "Database health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unhealthy", "database": "down" })),
            )
        }
    }
}

/// Prometheus scrape endpoint.
pub async fn metrics_handler() -> String {
    metrics::get_metrics()
}
