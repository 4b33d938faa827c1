// Module: http
// HTTP surface of the content server

pub mod admin;
pub mod error;
pub mod events;
pub mod health;
pub mod public;

use axum::Router;
use kiosk_core::config::ServerConfig;
use kiosk_core::service::ContentService;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use error::{AppError, AppResult};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub content: ContentService,
    /// Idle interval before the change stream sends a keep-alive comment
    pub keepalive: Duration,
}

/// Create the HTTP router with all routes
pub fn create_router(content: ContentService, config: &ServerConfig) -> Router {
    let state = AppState {
        content,
        keepalive: Duration::from_secs(config.keepalive_seconds.max(1)),
    };

    Router::new()
        // Health check endpoints (for monitoring probes)
        .merge(health::create_health_router())
        // Change stream for displays
        .merge(events::create_events_router())
        // Content reads
        .merge(public::create_public_router())
        // Admin mutations
        .merge(admin::create_admin_router())
        // Uploaded media files
        .nest_service("/media", ServeDir::new(&config.media_dir))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}


#[cfg(test)]
mod tests {
    use super::test_support::test_router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::time::Duration;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health() {
        let (router, _content, _dir) = test_router(Duration::from_secs(30));

        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 64).await.unwrap();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn test_media_files_are_served() {
        let (router, _content, _dir) = test_router(Duration::from_secs(30));

        let response = router
            .clone()
            .oneshot(Request::builder().uri("/media/poster.txt").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 64).await.unwrap();
        assert_eq!(&body[..], b"poster");

        let response = router
            .oneshot(Request::builder().uri("/media/missing.png").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
