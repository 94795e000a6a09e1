//! 탐지 알림 포트.
//!
//! 구현: `aurawatch-network` crate (reqwest 웹훅)

use std::path::Path;

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::detection::{Detection, DeliveryOutcome};
use crate::models::stats::StatsSnapshot;

/// 외부 알림 전송
#[async_trait]
pub trait AuraNotifier: Send + Sync {
    /// 확정 탐지 알림 (저장된 이미지 첨부).
    ///
    /// 정책상 생략된 경우 `DeliveryOutcome::Skipped`, 전송 실패는 `Err`.
    async fn notify_detection(
        &self,
        detection: &Detection,
        attachment: &Path,
    ) -> Result<DeliveryOutcome, CoreError>;

    /// 즉시 스크린샷 전송
    async fn send_screenshot(&self, attachment: &Path) -> Result<DeliveryOutcome, CoreError>;

    /// 통계 보고 전송
    async fn send_stats(&self, stats: &StatsSnapshot) -> Result<DeliveryOutcome, CoreError>;
}
