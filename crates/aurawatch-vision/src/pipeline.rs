//! 폴링 1회 탐지 파이프라인.
//!
//! 창 조회 → 캡처 → 모서리 샘플 → 쿨다운 → 모양 매칭 → 채택 판정
//! → 재캡처 후 중심 색 분류 → 중복 검사.
//!
//! 저장/알림은 호출자(워커)가 `PollOutcome::Detected`를 받아 수행하고,
//! 그 뒤 `DetectionState::record`로 상태를 갱신한다.

use std::sync::Arc;
use std::time::{Duration, Instant};

use aurawatch_core::catalog::AuraCatalog;
use aurawatch_core::config::DetectionConfig;
use aurawatch_core::error::CoreError;
use aurawatch_core::models::aura::Rgb;
use aurawatch_core::models::detection::{Detection, ShapeMatch};
use aurawatch_core::models::frame::Frame;
use aurawatch_core::ports::capture::ScreenCapturer;
use aurawatch_core::ports::window::WindowLocator;
use chrono::Utc;
use tracing::{debug, trace};

use crate::color::{classify, sample_center};
use crate::corners::CornerReport;
use crate::shape::ShapeMatcher;
use crate::state::DetectionState;

/// 탐지기 설정
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorSettings {
    /// 상단 모서리 샘플링 시 제목 표시줄 보정 (px)
    pub title_bar_offset_px: u32,
    /// 확정 탐지 후 재탐지 대기 시간
    pub cooldown: Duration,
}

impl From<&DetectionConfig> for DetectorSettings {
    fn from(config: &DetectionConfig) -> Self {
        Self {
            title_bar_offset_px: config.title_bar_offset_px,
            cooldown: config.cooldown(),
        }
    }
}

/// 알림 대상 탐지 + 저장할 원본 프레임
#[derive(Debug, Clone)]
pub struct Candidate {
    pub detection: Detection,
    pub frame: Frame,
    /// 폴링 시작 시각. 쿨다운 기준점으로 기록된다.
    pub polled_at: Instant,
}

/// 폴링 결과
#[derive(Debug, Clone)]
pub enum PollOutcome {
    /// 대상 창 없음: 이번 폴링 건너뜀
    WindowMissing,
    /// 쿨다운 중
    CoolingDown,
    /// 모서리/모양 채택 판정 실패
    Rejected {
        black_corners: usize,
        shape: Option<ShapeMatch>,
    },
    /// 모양은 채택됐지만 색상이 어떤 프로파일과도 맞지 않음
    Unclassified {
        shape: ShapeMatch,
        sample: Option<Rgb>,
    },
    /// 직전 탐지와 같은 오라
    Duplicate { name: String },
    /// 새 탐지
    Detected(Box<Candidate>),
}

/// 오라 탐지기
pub struct AuraDetector {
    locator: Arc<dyn WindowLocator>,
    capturer: Arc<dyn ScreenCapturer>,
    matcher: ShapeMatcher,
    catalog: Arc<AuraCatalog>,
    settings: DetectorSettings,
}

impl AuraDetector {
    pub fn new(
        locator: Arc<dyn WindowLocator>,
        capturer: Arc<dyn ScreenCapturer>,
        matcher: ShapeMatcher,
        catalog: Arc<AuraCatalog>,
        settings: DetectorSettings,
    ) -> Self {
        Self {
            locator,
            capturer,
            matcher,
            catalog,
            settings,
        }
    }

    pub fn settings(&self) -> DetectorSettings {
        self.settings
    }

    /// 폴링 1회 수행. 상태는 4각 연속 거부 횟수만 갱신한다.
    pub fn poll(&self, state: &mut DetectionState, now: Instant) -> Result<PollOutcome, CoreError> {
        let Some(window) = self.locator.locate()? else {
            trace!("대상 창 없음");
            return Ok(PollOutcome::WindowMissing);
        };

        let frame = self.capturer.capture()?;
        let corners = CornerReport::sample(&frame, &window, self.settings.title_bar_offset_px);

        if state.in_cooldown(now, self.settings.cooldown) {
            return Ok(PollOutcome::CoolingDown);
        }

        let shape = self
            .matcher
            .detect(&frame, &mut state.ignored_four_corner_streak);
        let black_corners = corners.black_count();
        let accepted = match shape {
            Some(shape) if corners.accepts(true) => shape,
            _ => {
                trace!("채택 실패: 검정 모서리 {black_corners}, 모양 {:?}", shape);
                return Ok(PollOutcome::Rejected {
                    black_corners,
                    shape,
                });
            }
        };

        // 중심 색은 새로 캡처한 화면에서 읽는다
        let fresh = self.capturer.capture()?;
        let Some(sample) = sample_center(&fresh, accepted.bbox.center()) else {
            return Ok(PollOutcome::Unclassified {
                shape: accepted,
                sample: None,
            });
        };

        let bucket = self.catalog.bucket(accepted.kind);
        let Some(found) = classify(sample, bucket) else {
            debug!(
                "색상 미분류: {:?} ({} 버킷 {}개)",
                sample,
                accepted.kind,
                bucket.len()
            );
            return Ok(PollOutcome::Unclassified {
                shape: accepted,
                sample: Some(sample),
            });
        };

        if state.is_duplicate(&found.profile.name) {
            trace!("중복 탐지 무시: {}", found.profile.name);
            return Ok(PollOutcome::Duplicate {
                name: found.profile.name.clone(),
            });
        }

        let detection = Detection {
            profile: found.profile.clone(),
            shape: accepted.kind,
            sample,
            distance: found.hsv_distance,
            detected_at: Utc::now(),
        };
        Ok(PollOutcome::Detected(Box::new(Candidate {
            detection,
            frame,
            polled_at: now,
        })))
    }
}
