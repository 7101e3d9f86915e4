use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;

use crate::server::endpoints::{schedule, selection, status, transfer};
use crate::types::AppState;

mod endpoints;
mod types;

pub use types::ApiErrorType;

/// Creates a router that can be used by `axum`.
///
/// # Parameters
/// - `app_state`: The app server state.
///
/// # Returns
/// The router.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let schedule_router = Router::new()
        .route("/courses", get(schedule::get_courses))
        .route("/schedule", get(schedule::get_schedule))
        .route("/schedule/today", get(schedule::get_today))
        .route("/schedule/week", get(schedule::get_week))
        .route("/changes", get(status::get_changes));

    let user_router = Router::new()
        .route(
            "/selection/:course_id",
            post(selection::post_select).delete(selection::delete_select),
        )
        .route("/manual", post(selection::post_manual_course))
        .route("/manual/:course_id", delete(selection::delete_manual_course))
        .route("/export", get(transfer::get_export))
        .route("/import", post(transfer::post_import));

    Router::new()
        .route("/health", get(status::get_health))
        .route("/refresh", post(status::post_refresh))
        .merge(schedule_router)
        .merge(user_router)
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::db::MemoryStore;
    use crate::schedule::{FeedClient, ScheduleService};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    fn feed_body() -> String {
        json!({ "data": { "allSalasUdps": { "edges": [
            { "node": { "code": "CIT1337", "course": "Redes", "day": 1,
                        "start": "8:30", "finish": "10:00", "place": "A1", "teacher": "Pérez" } },
            { "node": { "code": "CIT1337", "course": "Redes", "day": 3,
                        "start": "10:00", "finish": "11:30", "place": "B2", "teacher": "Pérez" } },
            { "node": { "code": "MAT100", "section": 2, "course": "Cálculo", "day": 2,
                        "start": "09:00", "finish": "10:30", "place": "C3" } }
        ] } } })
        .to_string()
    }

    fn app(feed_url: &str) -> Router {
        let config = AppConfig {
            feed_url: feed_url.to_string(),
            ..AppConfig::default()
        };
        let feed = FeedClient::with_url(feed_url, Duration::from_secs(5)).unwrap();
        let service = ScheduleService::new(Arc::new(MemoryStore::new()), feed);
        create_router(Arc::new(AppState { service, config }))
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn live_app() -> (mockito::ServerGuard, Router) {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/data.json")
            .with_status(200)
            .with_body(feed_body())
            .create_async()
            .await;
        let app = app(&format!("{}/data.json", server.url()));
        (server, app)
    }

    #[tokio::test]
    async fn test_health() {
        let app = app("http://127.0.0.1:9/data.json");
        let (status, body) = call(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["has_data"], false);
    }

    #[tokio::test]
    async fn test_schedule_before_any_data_is_unavailable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/data.json")
            .with_status(500)
            .create_async()
            .await;
        let app = app(&format!("{}/data.json", server.url()));

        let (status, _) = call(&app, "POST", "/refresh", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, body) = call(&app, "GET", "/schedule", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].as_str().unwrap().contains("/refresh"));
    }

    #[tokio::test]
    async fn test_refresh_then_schedule() {
        let (_server, app) = live_app().await;

        let (status, body) = call(&app, "POST", "/refresh", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "live");
        assert_eq!(body["courses"], 2);

        let (status, body) = call(&app, "GET", "/schedule", None).await;
        assert_eq!(status, StatusCode::OK);
        let courses = body["courses"].as_array().unwrap();
        assert_eq!(courses.len(), 2);
        assert!(courses[0]["node"]["timeSlots"].is_array());
    }

    #[tokio::test]
    async fn test_selection_drives_views() {
        let (_server, app) = live_app().await;
        call(&app, "POST", "/refresh", None).await;

        let (status, body) = call(&app, "POST", "/selection/CIT1337-1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["changed"], true);

        let (_, today) = call(&app, "GET", "/schedule/today?day=1", None).await;
        assert_eq!(today["name"], "Lunes");
        assert_eq!(today["classes"][0]["start"], "08:30");

        let (_, week) = call(&app, "GET", "/schedule/week", None).await;
        let week = week.as_array().unwrap();
        assert_eq!(week.len(), 5);
        assert_eq!(week[1]["classes"].as_array().unwrap().len(), 0);
        assert_eq!(week[2]["classes"].as_array().unwrap().len(), 1);

        let (_, catalog) = call(&app, "GET", "/courses?selected_only=true", None).await;
        assert_eq!(catalog["selected_count"], 1);
        assert_eq!(catalog["entries"].as_array().unwrap().len(), 1);

        let (_, body) = call(&app, "DELETE", "/selection/CIT1337-1", None).await;
        assert_eq!(body["changed"], true);
    }

    #[tokio::test]
    async fn test_manual_course_endpoints() {
        let (_server, app) = live_app().await;
        call(&app, "POST", "/refresh", None).await;

        let (status, _) = call(
            &app,
            "POST",
            "/manual",
            Some(json!({ "code": "ELE300", "course": "Electivo",
                         "start": "16:00", "finish": "14:30", "days": [2] })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, body) = call(
            &app,
            "POST",
            "/manual",
            Some(json!({ "code": "ELE300", "course": "Electivo",
                         "start": "14:30", "finish": "16:00", "days": [2, 4] })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["isManual"], true);

        let (_, catalog) = call(&app, "GET", "/courses?search=electivo", None).await;
        assert_eq!(catalog["entries"][0]["selected"], true);

        let (status, _) = call(&app, "DELETE", "/manual/ELE300-1", None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = call(&app, "DELETE", "/manual/ELE300-1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_export_and_import() {
        let app = app("http://127.0.0.1:9/data.json");
        call(&app, "POST", "/selection/MAT100-2", None).await;

        let (status, body) = call(&app, "GET", "/export", None).await;
        assert_eq!(status, StatusCode::OK);
        let code = body["code"].as_str().unwrap().to_string();

        let (status, body) = call(&app, "POST", "/import", Some(json!({ "code": code }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["selected"], json!(["MAT100-2"]));

        let (status, body) = call(&app, "POST", "/import", Some(json!({ "code": "%%%" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"].is_string());
    }
}
