//! Admin mutation endpoints
//!
//! Every successful write publishes one change event to connected displays:
//! settings, theme and attract-mode writes publish `config_updated`; menu and
//! page writes publish `menu_updated`. Authentication is handled in front of
//! this server.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{post, put},
    Router,
};
use kiosk_core::models::{
    AttractConfig, ChangeEvent, KioskConfig, MenuNode, Page, SettingsUpdate, Theme, ThemeUpdate,
};
use serde::{Deserialize, Serialize};

use crate::http::{AppError, AppResult, AppState};

pub fn create_admin_router() -> Router<AppState> {
    Router::new()
        .route("/admin/settings", put(update_settings))
        .route("/admin/theme", put(update_theme))
        .route("/admin/screensaver", put(update_screensaver))
        .route("/admin/menu", put(replace_menu))
        .route("/admin/pages/{slug}", put(upsert_page).delete(delete_page))
        .route("/admin/notify", post(notify))
}

pub async fn update_settings(
    State(state): State<AppState>,
    Json(update): Json<SettingsUpdate>,
) -> Json<KioskConfig> {
    Json(state.content.update_settings(update))
}

pub async fn update_theme(
    State(state): State<AppState>,
    Json(update): Json<ThemeUpdate>,
) -> Json<Theme> {
    Json(state.content.update_theme(update))
}

pub async fn update_screensaver(
    State(state): State<AppState>,
    Json(attract): Json<AttractConfig>,
) -> Json<AttractConfig> {
    Json(state.content.update_attract(attract))
}

pub async fn replace_menu(
    State(state): State<AppState>,
    Json(menu): Json<Vec<MenuNode>>,
) -> AppResult<Json<Vec<MenuNode>>> {
    Ok(Json(state.content.replace_menu(menu)?))
}

/// Create or replace the page at `slug`; a conflicting body slug is rejected
pub async fn upsert_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(mut page): Json<Page>,
) -> AppResult<Json<Page>> {
    if !page.slug.is_empty() && page.slug != slug {
        return Err(AppError::bad_request(format!(
            "Body slug '{}' does not match path slug '{slug}'",
            page.slug
        )));
    }
    page.slug = slug;
    Ok(Json(state.content.upsert_page(page)?))
}

pub async fn delete_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<StatusCode> {
    state.content.delete_page(&slug)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NotifyResponse {
    pub delivered: usize,
}

/// Push an arbitrary change event, e.g. after an out-of-band content import
pub async fn notify(
    State(state): State<AppState>,
    Json(event): Json<ChangeEvent>,
) -> Json<NotifyResponse> {
    Json(NotifyResponse {
        delivered: state.content.notify(event),
    })
}

#[cfg(test)]
mod tests {
    use crate::http::test_support::{json_body, test_router};
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use kiosk_core::ChangeKind;
    use std::time::Duration;
    use tower::ServiceExt;

    fn json_request(method: Method, uri: &str, body: &serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_settings_write_publishes_config_updated() {
        let (router, content, _dir) = test_router(Duration::from_secs(30));
        let mut sub = content.broadcaster().subscribe();

        let response = router
            .oneshot(json_request(
                Method::PUT,
                "/admin/settings",
                &serde_json::json!({"org_name": "City Library", "show_weather": true}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["org_name"], "City Library");

        assert_eq!(sub.recv().await.unwrap().kind, ChangeKind::ConfigUpdated);
        assert!(content.config().show_weather);
    }

    #[tokio::test]
    async fn test_screensaver_write_is_normalized() {
        let (router, content, _dir) = test_router(Duration::from_secs(30));
        let mut sub = content.broadcaster().subscribe();

        let response = router
            .oneshot(json_request(
                Method::PUT,
                "/admin/screensaver",
                &serde_json::json!({"path": "  ", "timeout": -10}),
            ))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert!(body["path"].is_null());
        assert_eq!(body["timeout"], 0);
        assert_eq!(sub.recv().await.unwrap().kind, ChangeKind::ConfigUpdated);
        assert!(!content.config().attract().is_enabled());
    }

    #[tokio::test]
    async fn test_page_writes_publish_menu_updated() {
        let (router, content, _dir) = test_router(Duration::from_secs(30));
        let mut sub = content.broadcaster().subscribe();

        let response = router
            .clone()
            .oneshot(json_request(
                Method::PUT,
                "/admin/pages/events",
                &serde_json::json!({"id": 7, "slug": "", "title": "Events"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["slug"], "events");
        assert_eq!(sub.recv().await.unwrap().kind, ChangeKind::MenuUpdated);

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::DELETE)
                    .uri("/admin/pages/events")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(sub.recv().await.unwrap().kind, ChangeKind::MenuUpdated);

        let response = router
            .oneshot(
                Request::builder()
                    .method(Method::DELETE)
                    .uri("/admin/pages/events")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_mismatched_page_slug_is_rejected() {
        let (router, content, _dir) = test_router(Duration::from_secs(30));
        let mut sub = content.broadcaster().subscribe();

        let response = router
            .oneshot(json_request(
                Method::PUT,
                "/admin/pages/events",
                &serde_json::json!({"id": 7, "slug": "news", "title": "News"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(sub.recv_timeout(Duration::from_millis(20)).await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_menu_is_rejected() {
        let (router, _content, _dir) = test_router(Duration::from_secs(30));

        let response = router
            .oneshot(json_request(
                Method::PUT,
                "/admin/menu",
                &serde_json::json!([{"kind": "button", "id": 1, "title": "Map", "target_slug": " "}]),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_notify_reports_delivery_count() {
        let (router, content, _dir) = test_router(Duration::from_secs(30));
        let _a = content.broadcaster().subscribe();
        let _b = content.broadcaster().subscribe();

        let response = router
            .oneshot(json_request(
                Method::POST,
                "/admin/notify",
                &serde_json::json!({"type": "menu_updated"}),
            ))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["delivered"], 2);
    }
}
