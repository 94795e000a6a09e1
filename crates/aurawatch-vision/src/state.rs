//! 폴링 간 유지되는 탐지 상태.
//!
//! 탐지 루프 워커가 소유하며 폴링 함수에 `&mut`로 전달된다.

use std::time::{Duration, Instant};

/// 중복/쿨다운/히스테리시스 상태
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectionState {
    previous_aura_name: Option<String>,
    last_detection: Option<Instant>,
    /// 연속으로 배경 검사에 실패한 4각 후보 수
    pub ignored_four_corner_streak: u32,
}

impl DetectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 마지막 확정 탐지 후 `cooldown`이 지나지 않았는지
    pub fn in_cooldown(&self, now: Instant, cooldown: Duration) -> bool {
        self.last_detection
            .is_some_and(|last| now.saturating_duration_since(last) < cooldown)
    }

    /// 직전 확정 탐지와 같은 오라인지
    pub fn is_duplicate(&self, aura_name: &str) -> bool {
        self.previous_aura_name.as_deref() == Some(aura_name)
    }

    /// 확정 탐지 기록 (이름과 시각을 함께 갱신)
    pub fn record(&mut self, aura_name: impl Into<String>, now: Instant) {
        self.previous_aura_name = Some(aura_name.into());
        self.last_detection = Some(now);
    }

    pub fn previous_aura_name(&self) -> Option<&str> {
        self.previous_aura_name.as_deref()
    }

    pub fn last_detection(&self) -> Option<Instant> {
        self.last_detection
    }
}
