use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::schedule::{
    classes_for_day, current_weekday, day_name, week_view, CatalogQuery, ScheduleError,
};
use crate::server::types::ApiErrorType;
use crate::types::AppState;

/// Query parameters for `GET /schedule/today`.
#[derive(Debug, Deserialize)]
pub struct DayQueryParams {
    /// Weekday to show (0 = Sunday); defaults to the local weekday
    #[serde(default)]
    pub day: Option<u8>,
}

/// GET /courses
///
/// Query parameters:
/// - `search` (optional): Case-insensitive text to look for
/// - `selected_only` (optional): Only list selected courses
pub async fn get_courses(
    State(s): State<Arc<AppState>>,
    Query(query): Query<CatalogQuery>,
) -> Response {
    info!(
        "GET /courses (search={:?}, selected_only={})",
        query.search, query.selected_only
    );

    match s.service.catalog(&query) {
        Ok(catalog) => (StatusCode::OK, Json(catalog)).into_response(),
        Err(e) => ApiErrorType::from(e).into_response(),
    }
}

/// GET /schedule
///
/// Returns every course as `{ node: Course }` together with the selection.
pub async fn get_schedule(State(s): State<Arc<AppState>>) -> Response {
    info!("GET /schedule");

    match s.service.schedule() {
        Ok(schedule) => (StatusCode::OK, Json(schedule)).into_response(),
        Err(e) => ApiErrorType::from(e).into_response(),
    }
}

/// GET /schedule/today
pub async fn get_today(
    State(s): State<Arc<AppState>>,
    Query(params): Query<DayQueryParams>,
) -> Response {
    let day = params.day.unwrap_or_else(current_weekday);
    info!("GET /schedule/today (day={})", day);

    if day > 6 {
        return ApiErrorType::from(ScheduleError::InvalidCourse {
            message: format!("day {day} is out of range"),
        })
        .into_response();
    }

    match s.service.courses() {
        Ok(courses) => {
            let classes = classes_for_day(&courses, &s.service.selection(), day);
            (
                StatusCode::OK,
                Json(json!({
                    "day": day,
                    "name": day_name(day),
                    "classes": classes,
                })),
            )
                .into_response()
        }
        Err(e) => ApiErrorType::from(e).into_response(),
    }
}

/// GET /schedule/week
///
/// One entry per configured display day.
pub async fn get_week(State(s): State<Arc<AppState>>) -> Response {
    info!("GET /schedule/week");

    match s.service.courses() {
        Ok(courses) => {
            let week = week_view(
                &courses,
                &s.service.selection(),
                &s.config.days_to_display,
            );
            (StatusCode::OK, Json(week)).into_response()
        }
        Err(e) => ApiErrorType::from(e).into_response(),
    }
}
