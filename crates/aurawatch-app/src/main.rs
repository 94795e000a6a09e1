//! # aurawatch
//!
//! 오라 탐지 바이너리 진입점.
//! 설정/카탈로그/템플릿 로드, 어댑터 DI 와이어링, 제어 API 서버 실행.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use aurawatch_app::controller::MacroController;
use aurawatch_app::lifecycle::LifecycleManager;
use aurawatch_app::worker::DetectionWorker;
use aurawatch_core::catalog::AuraCatalog;
use aurawatch_core::config_manager::ConfigManager;
use aurawatch_core::ports::archive::DetectionArchive;
use aurawatch_core::ports::capture::ScreenCapturer;
use aurawatch_core::ports::control::MacroControl;
use aurawatch_core::ports::notifier::AuraNotifier;
use aurawatch_core::ports::window::WindowLocator;
use aurawatch_network::webhook::WebhookNotifier;
use aurawatch_storage::image_store::PngImageStore;
use aurawatch_vision::capture::XcapScreenCapture;
use aurawatch_vision::pipeline::{AuraDetector, DetectorSettings};
use aurawatch_vision::shape::ShapeMatcher;
use aurawatch_vision::window::XcapWindowLocator;
use aurawatch_web::ControlServer;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// 게임 창의 오라 연출을 탐지해 웹훅으로 알리는 데스크톱 에이전트
#[derive(Parser, Debug)]
#[command(name = "aurawatch")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 설정 파일 경로 (기본: 플랫폼 설정 디렉토리의 config.json)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// 오라 카탈로그 JSON 경로
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// 기준 별 템플릿 디렉토리
    #[arg(long)]
    templates: Option<PathBuf>,

    /// 탐지 이미지 저장 디렉토리
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,

    /// 폴링 주기 (밀리초)
    #[arg(long)]
    poll_interval: Option<u64>,

    /// 제어 API 서버 비활성화
    #[arg(long)]
    no_control: bool,

    /// 시작 즉시 탐지 루프 실행
    #[arg(long)]
    autostart: bool,
}

const LOG_TARGETS: [&str; 7] = [
    "aurawatch",
    "aurawatch_app",
    "aurawatch_core",
    "aurawatch_vision",
    "aurawatch_network",
    "aurawatch_storage",
    "aurawatch_web",
];

fn init_tracing(level: &str) {
    let mut directives: Vec<String> = LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect();
    directives.push(format!("tower_http={level}"));

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(directives.join(","))),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    info!("AURAWATCH 시작 (v{})", env!("CARGO_PKG_VERSION"));

    // 설정 로드
    let config_manager = match &args.config {
        Some(path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    }
    .context("설정 로드 실패")?;
    info!("설정 파일: {}", config_manager.config_path().display());

    // CLI 인자로 설정 오버라이드
    let mut config = config_manager.get();
    if let Some(path) = args.catalog {
        config.detection.catalog_path = path;
    }
    if let Some(dir) = args.templates {
        config.detection.templates_dir = dir;
    }
    if let Some(dir) = args.output_dir {
        config.detection.output_dir = dir;
    }
    if let Some(ms) = args.poll_interval {
        config.detection.poll_interval_ms = ms;
    }
    if args.no_control {
        config.control.enabled = false;
    }
    let autostart = args.autostart || config.detection.autostart;

    // ── 어댑터 생성 (DI 와이어링) ──

    // 1. 오라 카탈로그
    let catalog = AuraCatalog::load(&config.detection.catalog_path).with_context(|| {
        format!(
            "카탈로그 로드 실패: {}",
            config.detection.catalog_path.display()
        )
    })?;
    info!("오라 카탈로그: {}개", catalog.len());

    // 2. 기준 별 템플릿
    let matcher = ShapeMatcher::load(&config.detection.templates_dir).with_context(|| {
        format!(
            "템플릿 로드 실패: {}",
            config.detection.templates_dir.display()
        )
    })?;
    info!(
        "템플릿: 4각 {}개, 8각 {}개",
        matcher.four_corner_count(),
        matcher.eight_corner_count()
    );

    // 3. 창 조회 + 화면 캡처
    let locator: Arc<dyn WindowLocator> = Arc::new(XcapWindowLocator::new(
        config.detection.window_title.clone(),
        config.detection.window_border_px,
    ));
    let capturer: Arc<dyn ScreenCapturer> = Arc::new(XcapScreenCapture::new());

    // 4. 웹훅 알림
    if config.webhook.url.is_empty() {
        warn!("웹훅 URL 미설정, 알림은 전송되지 않습니다");
    }
    let notifier: Arc<dyn AuraNotifier> = Arc::new(
        WebhookNotifier::new(config.webhook.clone()).context("웹훅 클라이언트 생성 실패")?,
    );

    // 5. 탐지 이미지 저장소
    let archive: Arc<dyn DetectionArchive> = Arc::new(
        PngImageStore::new(config.detection.output_dir.clone())
            .await
            .context("이미지 저장소 초기화 실패")?,
    );

    // 6. 탐지기 + 제어기
    let detector = Arc::new(AuraDetector::new(
        locator,
        capturer.clone(),
        matcher,
        Arc::new(catalog),
        DetectorSettings::from(&config.detection),
    ));
    let worker = DetectionWorker::new(
        detector,
        archive.clone(),
        notifier.clone(),
        config.detection.poll_interval(),
    );
    let controller = Arc::new(MacroController::new(worker, capturer, archive, notifier));

    let mut lifecycle = LifecycleManager::new(controller.clone());

    // 7. 제어 API 서버
    if config.control.enabled {
        if config.control.authorized_user_id.trim().is_empty() {
            warn!("authorized_user_id 미설정, 모든 제어 명령이 거부됩니다");
        }
        let server = ControlServer::new(controller.clone(), config.control.clone());
        let shutdown_rx = lifecycle.subscribe();
        lifecycle.attach_server(tokio::spawn(async move {
            if let Err(e) = server.run(shutdown_rx).await {
                error!("제어 API 서버 오류: {e}");
            }
        }));
    } else {
        info!("제어 API 서버 비활성화");
    }

    if autostart {
        controller.start().await.context("탐지 루프 시작 실패")?;
    } else if !config.control.enabled {
        warn!("제어 API와 자동 시작이 모두 꺼져 있어 탐지 루프를 시작할 방법이 없습니다");
    }

    lifecycle.run_until_signal().await;

    info!("AURAWATCH 종료");
    Ok(())
}
