use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::server::types::ApiErrorType;
use crate::types::AppState;

#[derive(Debug, Deserialize)]
pub struct ImportBody {
    pub code: String,
}

/// GET /export
///
/// Returns the selection and manual courses as a shareable code.
pub async fn get_export(State(s): State<Arc<AppState>>) -> Response {
    info!("GET /export");

    match s.service.export() {
        Ok(code) => (StatusCode::OK, Json(json!({ "code": code }))).into_response(),
        Err(e) => ApiErrorType::from(e).into_response(),
    }
}

/// POST /import
pub async fn post_import(
    State(s): State<Arc<AppState>>,
    Json(body): Json<ImportBody>,
) -> Response {
    info!("POST /import");

    match s.service.import(&body.code) {
        Ok(selection) => (
            StatusCode::OK,
            Json(json!({
                "selected": selection,
                "manual_courses": s.service.manual_courses().len(),
            })),
        )
            .into_response(),
        Err(e) => {
            warn!("Rejected import: {}", e);
            ApiErrorType::from(e).into_response()
        }
    }
}
