use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

use crate::server::types::ApiErrorType;
use crate::types::AppState;

/// GET /health
pub async fn get_health(State(s): State<Arc<AppState>>) -> Response {
    info!("GET /health");

    let has_data = s.service.schedule().is_ok();
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "has_data": has_data,
            "feed_url": s.config.feed_url,
        })),
    )
        .into_response()
}

/// POST /refresh
///
/// Runs a fetch cycle and reports what it produced.
pub async fn post_refresh(State(s): State<Arc<AppState>>) -> Response {
    info!("POST /refresh");

    match s.service.refresh().await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(json!({
                "source": outcome.source,
                "fetched_at": outcome.fetched_at,
                "courses": outcome.courses.len(),
                "changes": outcome.changes.len(),
                "invalid_records": outcome.invalid_records,
            })),
        )
            .into_response(),
        Err(e) => {
            error!("Refresh failed: {}", e);
            ApiErrorType::from(e).into_response()
        }
    }
}

/// GET /changes
///
/// Courses whose time slots changed in the last cycle.
pub async fn get_changes(State(s): State<Arc<AppState>>) -> Response {
    info!("GET /changes");

    match s.service.changes() {
        Ok(changes) => (StatusCode::OK, Json(changes)).into_response(),
        Err(e) => ApiErrorType::from(e).into_response(),
    }
}
