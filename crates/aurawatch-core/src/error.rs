//! AURAWATCH 핵심 에러 타입.
//!
//! 모든 어댑터 crate는 외부 라이브러리 에러를 `CoreError`로 매핑해서 반환한다.

use thiserror::Error;

/// 코어 레이어 에러.
/// 직렬화, 설정, 캡처, 템플릿, 전송 등 도메인 공통 에러를 정의한다.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패
    #[error("유효성 검증 실패: {field}: {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),

    /// 네트워크 에러 (연결 실패, 타임아웃)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 웹훅이 성공 외 상태 코드를 반환함
    #[error("전송 실패 ({status}): {body}")]
    Delivery {
        /// HTTP 상태 코드
        status: u16,
        /// 응답 본문
        body: String,
    },

    /// 화면/창 캡처 실패
    #[error("캡처 에러: {0}")]
    Capture(String),

    /// 기준 템플릿 이미지 로드 실패
    #[error("템플릿 에러: {0}")]
    Template(String),

    /// 현재 상태에서 수행할 수 없는 요청 (예: 이미 실행 중)
    #[error("잘못된 상태: {0}")]
    InvalidState(String),
}
