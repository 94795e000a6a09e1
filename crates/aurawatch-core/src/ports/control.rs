//! 탐지 루프 제어 포트.
//!
//! 구현: `aurawatch-app` crate (`MacroController`)
//! 사용: `aurawatch-web` 제어 API 핸들러

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::detection::DeliveryOutcome;
use crate::models::stats::StatsSnapshot;

/// 탐지 루프 명령 인터페이스
#[async_trait]
pub trait MacroControl: Send + Sync {
    /// 워커 시작. 이미 실행 중이면 `CoreError::InvalidState`.
    async fn start(&self) -> Result<(), CoreError>;

    /// 워커 중지 요청. 진행 중인 폴링은 끝까지 수행된다.
    /// 실행 중이 아니면 `CoreError::InvalidState`.
    async fn stop(&self) -> Result<(), CoreError>;

    /// 현재 사이클 종료 시점에 통계 보고 예약
    fn request_stats(&self);

    /// 즉시 화면 캡처 → 저장 → 전송
    async fn capture_and_send(&self) -> Result<DeliveryOutcome, CoreError>;

    /// 현재 상태/통계
    fn status(&self) -> StatsSnapshot;
}
