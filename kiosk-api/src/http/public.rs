//! Content read endpoints polled by displays

use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};
use kiosk_core::models::{KioskConfig, MenuNode, Page};

use crate::http::{AppResult, AppState};

pub fn create_public_router() -> Router<AppState> {
    Router::new()
        .route("/config", get(get_config))
        .route("/home/menu", get(get_menu))
        .route("/pages/{slug}", get(get_page))
}

/// Branding, theme, attract-mode and weather settings
pub async fn get_config(State(state): State<AppState>) -> Json<KioskConfig> {
    Json(state.content.config())
}

/// Home screen navigation tree, ordered
pub async fn get_menu(State(state): State<AppState>) -> Json<Vec<MenuNode>> {
    Json(state.content.menu())
}

pub async fn get_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<Page>> {
    Ok(Json(state.content.page(&slug)?))
}
