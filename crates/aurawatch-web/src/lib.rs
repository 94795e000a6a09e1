//! # aurawatch-web
//!
//! 로컬 제어 API 서버.
//! Axum 기반 REST API로 탐지 루프를 원격 제어한다.
//!
//! ## 엔드포인트 (`/api/macro`)
//! - `POST /start` 탐지 루프 시작
//! - `POST /stop` 탐지 루프 중지
//! - `POST /stats` 통계 보고 예약
//! - `POST /screenshot` 즉시 스크린샷 전송
//! - `GET /status` 현재 통계 조회

pub mod error;
pub mod handlers;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use aurawatch_core::config::ControlConfig;
use aurawatch_core::ports::control::MacroControl;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

pub use handlers::macro_control::USER_ID_HEADER;

/// 포트 바인드 최대 시도 횟수
const MAX_PORT_ATTEMPTS: u16 = 10;

/// 제어 API 상태
#[derive(Clone)]
pub struct AppState {
    /// 탐지 루프 제어기
    pub control: Arc<dyn MacroControl>,
    /// 명령 실행이 허용된 사용자 ID (빈 문자열이면 모든 명령 거부)
    pub authorized_user_id: String,
}

/// 로컬 제어 API 서버
pub struct ControlServer {
    config: ControlConfig,
    state: AppState,
}

impl ControlServer {
    pub fn new(control: Arc<dyn MacroControl>, config: ControlConfig) -> Self {
        let state = AppState {
            control,
            authorized_user_id: config.authorized_user_id.trim().to_string(),
        };
        Self { config, state }
    }

    /// 라우터 구성
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .nest("/api/macro", routes::macro_routes())
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// 서버 실행
    ///
    /// 설정 포트가 사용 중이면 다음 포트를 순서대로 시도한다.
    /// `shutdown_rx`가 `true`가 되면 진행 중인 요청을 마치고 종료한다.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) -> Result<(), std::io::Error> {
        let host = if self.config.allow_external {
            "0.0.0.0"
        } else {
            "127.0.0.1"
        };

        let app = self.router();
        let base_port = self.config.port;
        let mut last_error = None;

        for attempt in 0..MAX_PORT_ATTEMPTS {
            let Some(port) = base_port.checked_add(attempt) else {
                break;
            };

            let addr: SocketAddr = match format!("{host}:{port}").parse() {
                Ok(a) => a,
                Err(e) => {
                    error!("잘못된 주소 {host}:{port}, {e}");
                    continue;
                }
            };

            match TcpListener::bind(addr).await {
                Ok(listener) => {
                    if attempt > 0 {
                        warn!("포트 {base_port} 사용 불가, 대체 포트 {port} 사용");
                    }
                    info!("제어 API 서버 시작: http://{addr}");

                    axum::serve(listener, app)
                        .with_graceful_shutdown(async move {
                            loop {
                                if *shutdown_rx.borrow() {
                                    info!("제어 API 서버 종료 신호 수신");
                                    break;
                                }
                                if shutdown_rx.changed().await.is_err() {
                                    break;
                                }
                            }
                        })
                        .await?;

                    info!("제어 API 서버 종료");
                    return Ok(());
                }
                Err(e) => {
                    warn!("포트 {port} 바인드 실패: {e}");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::AddrInUse,
                format!("사용 가능한 포트 없음 ({base_port}부터 {MAX_PORT_ATTEMPTS}개 시도)"),
            )
        }))
    }
}
