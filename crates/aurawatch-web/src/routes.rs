//! API 라우트 정의.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::AppState;

/// 탐지 루프 제어 라우트 (`/api/macro` 하위)
pub fn macro_routes() -> Router<AppState> {
    Router::new()
        .route("/start", post(handlers::macro_control::start))
        .route("/stop", post(handlers::macro_control::stop))
        .route("/stats", post(handlers::macro_control::stats))
        .route("/screenshot", post(handlers::macro_control::screenshot))
        .route("/status", get(handlers::macro_control::status))
}
