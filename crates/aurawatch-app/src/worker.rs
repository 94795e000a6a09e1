//! 탐지 루프 워커.
//!
//! 폴링 1회 → 결과 처리(저장/알림/기록) → 통계 보고 요청 처리 → 대기.
//! 중지 신호는 각 반복 시작과 대기 중에 확인한다. 진행 중인 폴링은
//! 알림까지 끝난 뒤 루프를 빠져나간다.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use aurawatch_core::models::detection::DeliveryOutcome;
use aurawatch_core::models::stats::StatsSnapshot;
use aurawatch_core::ports::archive::DetectionArchive;
use aurawatch_core::ports::notifier::AuraNotifier;
use aurawatch_vision::pipeline::{AuraDetector, Candidate, PollOutcome};
use aurawatch_vision::state::DetectionState;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// 탐지 워커
#[derive(Clone)]
pub struct DetectionWorker {
    detector: Arc<AuraDetector>,
    state: Arc<Mutex<DetectionState>>,
    archive: Arc<dyn DetectionArchive>,
    notifier: Arc<dyn AuraNotifier>,
    stats: Arc<RwLock<StatsSnapshot>>,
    stats_requested: Arc<AtomicBool>,
    poll_interval: Duration,
}

impl DetectionWorker {
    pub fn new(
        detector: Arc<AuraDetector>,
        archive: Arc<dyn DetectionArchive>,
        notifier: Arc<dyn AuraNotifier>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            detector,
            state: Arc::new(Mutex::new(DetectionState::new())),
            archive,
            notifier,
            stats: Arc::new(RwLock::new(StatsSnapshot::default())),
            stats_requested: Arc::new(AtomicBool::new(false)),
            poll_interval,
        }
    }

    /// 다음 반복 끝에 통계 보고
    pub fn request_stats(&self) {
        self.stats_requested.store(true, Ordering::SeqCst);
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.read().clone()
    }

    /// 탐지 상태 복사본
    pub fn state(&self) -> DetectionState {
        self.state.lock().clone()
    }

    pub(crate) fn mark_started(&self) {
        let mut stats = self.stats.write();
        stats.running = true;
        stats.started_at = Some(Utc::now());
    }

    /// 중지 신호까지 폴링 반복
    pub async fn run(self, mut stop_rx: watch::Receiver<bool>) {
        info!("탐지 루프 시작 (주기 {:?})", self.poll_interval);

        loop {
            if *stop_rx.borrow() {
                break;
            }

            self.run_once().await;

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                changed = stop_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        self.stats.write().running = false;
        info!("탐지 루프 종료");
    }

    /// 폴링 1회 + 결과 처리 + 통계 보고 요청 처리
    pub async fn run_once(&self) {
        let detector = self.detector.clone();
        let state = self.state.clone();
        let polled = tokio::task::spawn_blocking(move || {
            let mut state = state.lock();
            detector.poll(&mut state, Instant::now())
        })
        .await;

        self.stats.write().polls += 1;

        match polled {
            Ok(Ok(outcome)) => self.handle_outcome(outcome).await,
            Ok(Err(e)) => warn!("폴링 실패: {e}"),
            Err(e) => error!("폴링 작업 실패: {e}"),
        }

        if self.stats_requested.swap(false, Ordering::SeqCst) {
            self.send_stats().await;
        }
    }

    async fn handle_outcome(&self, outcome: PollOutcome) {
        match outcome {
            PollOutcome::WindowMissing => {
                self.stats.write().skipped_polls += 1;
                debug!("대상 창 없음, 폴링 건너뜀");
            }
            PollOutcome::CoolingDown => debug!("쿨다운 중"),
            PollOutcome::Rejected {
                black_corners,
                shape,
            } => {
                debug!(black_corners, ?shape, "채택 실패");
            }
            PollOutcome::Unclassified { shape, sample } => {
                debug!(kind = %shape.kind, confidence = shape.confidence, ?sample, "색상 미분류");
            }
            PollOutcome::Duplicate { name } => debug!(aura = %name, "중복 탐지 억제"),
            PollOutcome::Detected(candidate) => self.confirm(*candidate).await,
        }
    }

    /// 저장 → 알림 → 상태 기록
    async fn confirm(&self, candidate: Candidate) {
        let Candidate {
            detection,
            frame,
            polled_at,
        } = candidate;
        let name = detection.profile.name.clone();
        info!(aura = %name, kind = %detection.shape, distance = detection.distance, "오라 탐지");

        let path = match self
            .archive
            .save_detection(&frame, &name, detection.shape)
            .await
        {
            Ok(path) => path,
            Err(e) => {
                error!(aura = %name, "탐지 이미지 저장 실패: {e}");
                return;
            }
        };

        match self.notifier.notify_detection(&detection, &path).await {
            Ok(DeliveryOutcome::Delivered { status }) => {
                self.stats.write().notifications_sent += 1;
                info!(aura = %name, status, "탐지 알림 전송 완료");
            }
            Ok(DeliveryOutcome::Skipped { reason }) => {
                info!(aura = %name, "탐지 알림 생략: {reason}");
            }
            Err(e) => {
                self.stats.write().notification_failures += 1;
                warn!(aura = %name, "탐지 알림 실패: {e}");
            }
        }

        // 쿨다운은 저장/알림 지연과 무관하게 폴링 시작 시각부터
        self.state.lock().record(name.clone(), polled_at);

        let mut stats = self.stats.write();
        stats.detections += 1;
        stats.last_detection = Some(name);
        stats.last_detection_at = Some(detection.detected_at);
    }

    async fn send_stats(&self) {
        let snapshot = self.stats.read().clone();
        match self.notifier.send_stats(&snapshot).await {
            Ok(outcome) => debug!("통계 보고 결과: {:?}", outcome),
            Err(e) => warn!("통계 보고 실패: {e}"),
        }
    }
}
