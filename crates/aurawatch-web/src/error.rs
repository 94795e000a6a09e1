//! API 에러 처리.

use aurawatch_core::error::CoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// API 에러
#[derive(Debug, Error)]
pub enum ApiError {
    /// 내부 서버 오류
    #[error("내부 서버 오류: {0}")]
    Internal(String),

    /// 명령 권한 사용자가 설정되지 않음
    #[error("인증 불가: {0}")]
    Unauthorized(String),

    /// 호출자 불일치
    #[error("권한 없음: {0}")]
    Forbidden(String),

    /// 현재 상태와 충돌 (이미 실행 중 등)
    #[error("상태 충돌: {0}")]
    Conflict(String),

    /// 외부 전송 실패
    #[error("외부 전송 실패: {0}")]
    BadGateway(String),
}

/// 에러 응답 본문
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// 에러 메시지
    pub error: String,
    /// HTTP 상태 코드
    pub status: u16,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            ApiError::Internal(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::Conflict(msg)
            | ApiError::BadGateway(msg) => msg,
        };

        let body = ErrorResponse {
            error: message,
            status: status.as_u16(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidState(msg) => ApiError::Conflict(msg),
            CoreError::Delivery { .. } | CoreError::Network(_) => {
                ApiError::BadGateway(err.to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_status() {
        let conflict: ApiError = CoreError::InvalidState("running".to_string()).into();
        assert_eq!(conflict.status_code(), StatusCode::CONFLICT);

        let gateway: ApiError = CoreError::Delivery {
            status: 500,
            body: String::new(),
        }
        .into();
        assert_eq!(gateway.status_code(), StatusCode::BAD_GATEWAY);

        let internal: ApiError = CoreError::Capture("no monitor".to_string()).into();
        assert_eq!(internal.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn error_response_status() {
        let response = ApiError::Forbidden("mismatch".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
