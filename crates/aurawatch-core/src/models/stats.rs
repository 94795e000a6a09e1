//! 탐지 루프 통계 스냅샷 (상태 조회/통계 보고용).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 탐지 루프 통계
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// 워커 실행 여부
    pub running: bool,
    /// 워커 시작 시각
    pub started_at: Option<DateTime<Utc>>,
    /// 완료된 폴링 수
    pub polls: u64,
    /// 창을 찾지 못해 건너뛴 폴링 수
    pub skipped_polls: u64,
    /// 확정 탐지 수
    pub detections: u64,
    /// 전송 성공 알림 수
    pub notifications_sent: u64,
    /// 전송 실패 알림 수
    pub notification_failures: u64,
    /// 마지막 탐지 오라 이름
    pub last_detection: Option<String>,
    /// 마지막 탐지 시각
    pub last_detection_at: Option<DateTime<Utc>>,
}
