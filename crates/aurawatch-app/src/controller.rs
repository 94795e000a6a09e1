//! 탐지 루프 제어기.
//!
//! `MacroControl` 포트 구현. 워커 태스크는 동시에 하나만 실행된다.

use std::sync::Arc;

use async_trait::async_trait;
use aurawatch_core::error::CoreError;
use aurawatch_core::models::detection::DeliveryOutcome;
use aurawatch_core::models::stats::StatsSnapshot;
use aurawatch_core::ports::archive::DetectionArchive;
use aurawatch_core::ports::capture::ScreenCapturer;
use aurawatch_core::ports::control::MacroControl;
use aurawatch_core::ports::notifier::AuraNotifier;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::worker::DetectionWorker;

/// 실행 중인 워커 핸들
struct RunningWorker {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// 탐지 루프 제어기
pub struct MacroController {
    worker: DetectionWorker,
    capturer: Arc<dyn ScreenCapturer>,
    archive: Arc<dyn DetectionArchive>,
    notifier: Arc<dyn AuraNotifier>,
    running: Mutex<Option<RunningWorker>>,
}

impl MacroController {
    /// `worker`의 탐지 상태와 통계는 재시작해도 유지된다.
    pub fn new(
        worker: DetectionWorker,
        capturer: Arc<dyn ScreenCapturer>,
        archive: Arc<dyn DetectionArchive>,
        notifier: Arc<dyn AuraNotifier>,
    ) -> Self {
        Self {
            worker,
            capturer,
            archive,
            notifier,
            running: Mutex::new(None),
        }
    }
}

#[async_trait]
impl MacroControl for MacroController {
    async fn start(&self) -> Result<(), CoreError> {
        let mut running = self.running.lock().await;
        if running.as_ref().is_some_and(|w| !w.task.is_finished()) {
            return Err(CoreError::InvalidState(
                "탐지 루프가 이미 실행 중입니다".to_string(),
            ));
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        self.worker.mark_started();
        let task = tokio::spawn(self.worker.clone().run(stop_rx));
        *running = Some(RunningWorker { stop_tx, task });

        info!("탐지 루프 시작 요청 처리");
        Ok(())
    }

    async fn stop(&self) -> Result<(), CoreError> {
        let mut running = self.running.lock().await;
        let Some(worker) = running.take() else {
            return Err(CoreError::InvalidState(
                "탐지 루프가 실행 중이 아닙니다".to_string(),
            ));
        };
        if worker.task.is_finished() {
            return Err(CoreError::InvalidState(
                "탐지 루프가 실행 중이 아닙니다".to_string(),
            ));
        }

        let _ = worker.stop_tx.send(true);
        if let Err(e) = worker.task.await {
            warn!("탐지 워커 종료 실패: {e}");
        }

        info!("탐지 루프 중지 완료");
        Ok(())
    }

    fn request_stats(&self) {
        self.worker.request_stats();
        info!("통계 보고 예약");
    }

    async fn capture_and_send(&self) -> Result<DeliveryOutcome, CoreError> {
        let capturer = self.capturer.clone();
        let frame = tokio::task::spawn_blocking(move || capturer.capture())
            .await
            .map_err(|e| CoreError::Internal(format!("캡처 작업 실패: {e}")))??;

        let path = self.archive.save_screenshot(&frame).await?;
        let outcome = self.notifier.send_screenshot(&path).await?;
        info!("스크린샷 전송: {:?}", outcome);
        Ok(outcome)
    }

    fn status(&self) -> StatsSnapshot {
        self.worker.stats()
    }
}
