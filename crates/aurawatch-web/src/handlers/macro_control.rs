//! 탐지 루프 제어 핸들러.
//!
//! 모든 명령은 `X-User-Id` 헤더가 설정된 사용자 ID와 일치해야 실행된다.
//! 거부된 요청은 상태를 바꾸지 않는다.

use aurawatch_core::models::detection::DeliveryOutcome;
use aurawatch_core::models::stats::StatsSnapshot;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::AppState;

/// 호출자 식별 헤더
pub const USER_ID_HEADER: &str = "x-user-id";

/// 명령 응답
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub message: String,
}

impl CommandResponse {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

/// 스크린샷 명령 응답
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenshotResponse {
    pub message: String,
    pub outcome: DeliveryOutcome,
}

/// 호출자 검증
fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    if state.authorized_user_id.is_empty() {
        return Err(ApiError::Unauthorized(
            "No User ID is configured. Please set your User ID in the settings to use commands."
                .to_string(),
        ));
    }

    let caller = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim);

    if caller != Some(state.authorized_user_id.as_str()) {
        warn!("권한 없는 제어 요청: {:?}", caller);
        return Err(ApiError::Forbidden(
            "You do not have permission to use this command. Ensure the correct User ID is set."
                .to_string(),
        ));
    }

    Ok(())
}

pub async fn start(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CommandResponse>, ApiError> {
    authorize(&state, &headers)?;
    state.control.start().await?;
    info!("제어 API: 탐지 루프 시작");
    Ok(CommandResponse::new("Macro started."))
}

pub async fn stop(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CommandResponse>, ApiError> {
    authorize(&state, &headers)?;
    state.control.stop().await?;
    info!("제어 API: 탐지 루프 중지");
    Ok(CommandResponse::new("Macro stopped."))
}

pub async fn stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CommandResponse>, ApiError> {
    authorize(&state, &headers)?;
    state.control.request_stats();
    Ok(CommandResponse::new(
        "Player stats update has been scheduled for the end of the current cycle.",
    ))
}

pub async fn screenshot(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ScreenshotResponse>, ApiError> {
    authorize(&state, &headers)?;
    let outcome = state.control.capture_and_send().await?;
    let message = match &outcome {
        DeliveryOutcome::Delivered { .. } => "Screenshot sent successfully.".to_string(),
        DeliveryOutcome::Skipped { reason } => format!("Screenshot saved but not sent: {reason}"),
    };
    Ok(Json(ScreenshotResponse { message, outcome }))
}

pub async fn status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<StatsSnapshot>, ApiError> {
    authorize(&state, &headers)?;
    Ok(Json(state.control.status()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use aurawatch_core::error::CoreError;
    use aurawatch_core::ports::control::MacroControl;
    use axum::http::{HeaderValue, StatusCode};
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// 호출 기록용 제어기
    #[derive(Default)]
    struct RecordingControl {
        running: Mutex<bool>,
        stats_requests: Mutex<u32>,
        screenshots: Mutex<u32>,
    }

    #[async_trait]
    impl MacroControl for RecordingControl {
        async fn start(&self) -> Result<(), CoreError> {
            let mut running = self.running.lock();
            if *running {
                return Err(CoreError::InvalidState("이미 실행 중".to_string()));
            }
            *running = true;
            Ok(())
        }

        async fn stop(&self) -> Result<(), CoreError> {
            let mut running = self.running.lock();
            if !*running {
                return Err(CoreError::InvalidState("실행 중 아님".to_string()));
            }
            *running = false;
            Ok(())
        }

        fn request_stats(&self) {
            *self.stats_requests.lock() += 1;
        }

        async fn capture_and_send(&self) -> Result<DeliveryOutcome, CoreError> {
            *self.screenshots.lock() += 1;
            Ok(DeliveryOutcome::Delivered { status: 204 })
        }

        fn status(&self) -> StatsSnapshot {
            StatsSnapshot {
                running: *self.running.lock(),
                ..Default::default()
            }
        }
    }

    fn make_state(user_id: &str) -> (AppState, Arc<RecordingControl>) {
        let control = Arc::new(RecordingControl::default());
        let state = AppState {
            control: control.clone(),
            authorized_user_id: user_id.to_string(),
        };
        (state, control)
    }

    fn headers(user_id: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_str(user_id).unwrap());
        headers
    }

    #[tokio::test]
    async fn start_and_stop_with_authorized_user() {
        let (state, control) = make_state("42");

        let response = start(State(state.clone()), headers("42")).await.unwrap();
        assert_eq!(response.0.message, "Macro started.");
        assert!(*control.running.lock());

        let response = stop(State(state), headers("42")).await.unwrap();
        assert_eq!(response.0.message, "Macro stopped.");
        assert!(!*control.running.lock());
    }

    #[tokio::test]
    async fn unconfigured_user_id_rejects_everything() {
        let (state, control) = make_state("");

        let err = start(State(state.clone()), headers("42")).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        let err = stats(State(state), HeaderMap::new()).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        assert!(!*control.running.lock());
        assert_eq!(*control.stats_requests.lock(), 0);
    }

    #[tokio::test]
    async fn mismatched_user_is_forbidden_without_state_change() {
        let (state, control) = make_state("42");

        let err = start(State(state.clone()), headers("7")).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        let err = screenshot(State(state.clone()), HeaderMap::new())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        assert!(!*control.running.lock());
        assert_eq!(*control.screenshots.lock(), 0);
    }

    #[tokio::test]
    async fn double_start_is_conflict() {
        let (state, _control) = make_state("42");
        start(State(state.clone()), headers("42")).await.unwrap();
        let err = start(State(state), headers("42")).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn stats_is_scheduled() {
        let (state, control) = make_state("42");
        let response = stats(State(state), headers("42")).await.unwrap();
        assert!(response.0.message.contains("end of the current cycle"));
        assert_eq!(*control.stats_requests.lock(), 1);
    }

    #[tokio::test]
    async fn screenshot_reports_delivery() {
        let (state, control) = make_state("42");
        let response = screenshot(State(state), headers(" 42 ")).await.unwrap();
        assert_eq!(response.0.message, "Screenshot sent successfully.");
        assert!(response.0.outcome.is_delivered());
        assert_eq!(*control.screenshots.lock(), 1);
    }

    #[tokio::test]
    async fn status_reflects_control() {
        let (state, control) = make_state("42");
        *control.running.lock() = true;
        let response = status(State(state), headers("42")).await.unwrap();
        assert!(response.0.running);
    }
}
