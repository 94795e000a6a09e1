//! 라이프사이클 관리.
//!
//! OS 시그널 대기 후 종료 순서를 수행한다:
//! 제어 API 서버에 종료 신호 → 탐지 루프 중지 → 서버 태스크 대기.

use std::sync::Arc;

use aurawatch_core::error::CoreError;
use aurawatch_core::ports::control::MacroControl;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// 라이프사이클 관리자
pub struct LifecycleManager {
    shutdown_tx: watch::Sender<bool>,
    control: Arc<dyn MacroControl>,
    server: Option<JoinHandle<()>>,
}

impl LifecycleManager {
    pub fn new(control: Arc<dyn MacroControl>) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            shutdown_tx,
            control,
            server: None,
        }
    }

    /// 종료 수신기 (제어 API 서버용)
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// 종료 시 끝날 때까지 기다릴 서버 태스크 등록
    pub fn attach_server(&mut self, handle: JoinHandle<()>) {
        self.server = Some(handle);
    }

    /// SIGINT/SIGTERM (Windows는 Ctrl+C) 대기 후 종료 순서 수행
    pub async fn run_until_signal(self) {
        wait_for_signal().await;
        self.shutdown().await;
    }

    /// 종료 신호 발송, 실행 중인 탐지 루프 중지, 서버 태스크 대기
    pub async fn shutdown(self) {
        info!("종료 신호 발송");
        self.shutdown_tx.send_replace(true);

        match self.control.stop().await {
            Ok(()) => info!("탐지 루프 중지"),
            Err(CoreError::InvalidState(_)) => debug!("탐지 루프 미실행"),
            Err(e) => warn!("탐지 루프 중지 실패: {e}"),
        }

        if let Some(handle) = self.server {
            if let Err(e) = handle.await {
                warn!("제어 API 서버 태스크 종료 실패: {e}");
            }
        }
    }
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigint = signal(SignalKind::interrupt()).expect("SIGINT 핸들러 등록 실패");
        let mut sigterm = signal(SignalKind::terminate()).expect("SIGTERM 핸들러 등록 실패");

        tokio::select! {
            _ = sigint.recv() => info!("SIGINT 수신"),
            _ = sigterm.recv() => info!("SIGTERM 수신"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("Ctrl+C 핸들러 등록 실패");
        info!("Ctrl+C 수신");
    }
}
