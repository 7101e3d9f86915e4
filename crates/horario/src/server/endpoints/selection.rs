//! Endpoints that change the user's selection and manual courses.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::schedule::{CourseId, ManualCourseRequest};
use crate::server::types::ApiErrorType;
use crate::types::AppState;

fn toggle(s: &AppState, course_id: String, selected: bool) -> Response {
    let id = CourseId::from_raw(course_id);
    match s.service.toggle_selection(id.clone(), selected) {
        Ok(changed) => (
            StatusCode::OK,
            Json(json!({
                "course_id": id,
                "selected": selected,
                "changed": changed,
            })),
        )
            .into_response(),
        Err(e) => ApiErrorType::from(e).into_response(),
    }
}

/// POST /selection/:course_id
pub async fn post_select(
    Path(course_id): Path<String>,
    State(s): State<Arc<AppState>>,
) -> Response {
    info!("POST /selection/{}", course_id);
    toggle(&s, course_id, true)
}

/// DELETE /selection/:course_id
pub async fn delete_select(
    Path(course_id): Path<String>,
    State(s): State<Arc<AppState>>,
) -> Response {
    info!("DELETE /selection/{}", course_id);
    toggle(&s, course_id, false)
}

/// POST /manual
///
/// Adds a manual course and selects it.
pub async fn post_manual_course(
    State(s): State<Arc<AppState>>,
    Json(request): Json<ManualCourseRequest>,
) -> Response {
    info!("POST /manual (code={})", request.code);

    match s.service.add_manual(request) {
        Ok(course) => (StatusCode::CREATED, Json(course)).into_response(),
        Err(e) => {
            warn!("Rejected manual course: {}", e);
            ApiErrorType::from(e).into_response()
        }
    }
}

/// DELETE /manual/:course_id
pub async fn delete_manual_course(
    Path(course_id): Path<String>,
    State(s): State<Arc<AppState>>,
) -> Response {
    info!("DELETE /manual/{}", course_id);

    let id = CourseId::from_raw(course_id);
    match s.service.remove_manual(&id) {
        Ok(0) => ApiErrorType::from((
            StatusCode::NOT_FOUND,
            "No manual course with this id",
            Some(id.to_string()),
        ))
        .into_response(),
        Ok(removed) => (
            StatusCode::OK,
            Json(json!({ "course_id": id, "removed": removed })),
        )
            .into_response(),
        Err(e) => ApiErrorType::from(e).into_response(),
    }
}
