use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::schedule::ScheduleError;

/// An error returned to API clients as `{ error, details }`.
#[derive(Debug, Serialize)]
pub struct ApiErrorType {
    #[serde(skip)]
    status: StatusCode,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl ApiErrorType {
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<(StatusCode, &str, Option<String>)> for ApiErrorType {
    fn from((status, error, details): (StatusCode, &str, Option<String>)) -> Self {
        Self {
            status,
            error: error.to_string(),
            details,
        }
    }
}

impl From<ScheduleError> for ApiErrorType {
    fn from(error: ScheduleError) -> Self {
        let (status, message) = match &error {
            ScheduleError::NoData { .. } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "No course data available yet, retry with POST /refresh",
            ),
            ScheduleError::InvalidImport { .. } => {
                (StatusCode::BAD_REQUEST, "The import code is not valid")
            }
            ScheduleError::InvalidCourse { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "The course is not valid")
            }
            ScheduleError::Store { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read or write local data",
            ),
            e if e.is_feed_failure() => {
                (StatusCode::BAD_GATEWAY, "The course feed is unavailable")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "Unexpected error"),
        };

        Self::from((status, message, Some(error.to_string())))
    }
}

impl IntoResponse for ApiErrorType {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}
