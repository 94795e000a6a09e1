//! 탐지 워커 통합 테스트.
//!
//! 합성 화면 위의 별 모양과 중심 색으로 전체 파이프라인
//! (창 조회 → 모양 매칭 → 색상 분류 → 저장 → 알림 → 상태 기록)을 검증한다.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use aurawatch_app::controller::MacroController;
use aurawatch_app::lifecycle::LifecycleManager;
use aurawatch_app::worker::DetectionWorker;
use aurawatch_core::catalog::{AuraCatalog, Tier};
use aurawatch_core::config::WebhookConfig;
use aurawatch_core::error::CoreError;
use aurawatch_core::models::aura::{AuraProfile, Rgb};
use aurawatch_core::models::detection::{DeliveryOutcome, Detection, ShapeKind};
use aurawatch_core::models::frame::Frame;
use aurawatch_core::models::geometry::WindowGeometry;
use aurawatch_core::models::stats::StatsSnapshot;
use aurawatch_core::ports::archive::DetectionArchive;
use aurawatch_core::ports::capture::ScreenCapturer;
use aurawatch_core::ports::control::MacroControl;
use aurawatch_core::ports::notifier::AuraNotifier;
use aurawatch_core::ports::window::WindowLocator;
use aurawatch_network::webhook::WebhookNotifier;
use aurawatch_storage::image_store::PngImageStore;
use aurawatch_vision::pipeline::{AuraDetector, DetectorSettings};
use aurawatch_vision::shape::ShapeMatcher;
use aurawatch_vision::template::Template;
use image::{GrayImage, Luma, RgbImage};
use mockito::Matcher;
use parking_lot::Mutex;
use tempfile::TempDir;

const EXAMPLE: Rgb = Rgb::new(91, 78, 159);
const EMBER: Rgb = Rgb::new(200, 40, 40);

// ── 가짜 포트 ──

struct ScriptedWindow(Mutex<Option<WindowGeometry>>);

impl WindowLocator for ScriptedWindow {
    fn locate(&self) -> Result<Option<WindowGeometry>, CoreError> {
        Ok(*self.0.lock())
    }
}

struct ScriptedScreen(Mutex<RgbImage>);

impl ScriptedScreen {
    fn show(&self, image: RgbImage) {
        *self.0.lock() = image;
    }
}

impl ScreenCapturer for ScriptedScreen {
    fn capture(&self) -> Result<Frame, CoreError> {
        Ok(Frame::new(self.0.lock().clone()))
    }
}

#[derive(Default)]
struct RecordingNotifier {
    detections: Mutex<Vec<String>>,
    screenshots: Mutex<Vec<PathBuf>>,
    stats: Mutex<Vec<StatsSnapshot>>,
    failing: bool,
    /// 탐지 알림 응답 지연
    delay: Duration,
}

impl RecordingNotifier {
    fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    fn names(&self) -> Vec<String> {
        self.detections.lock().clone()
    }
}

#[async_trait]
impl AuraNotifier for RecordingNotifier {
    async fn notify_detection(
        &self,
        detection: &Detection,
        _attachment: &Path,
    ) -> Result<DeliveryOutcome, CoreError> {
        self.detections.lock().push(detection.profile.name.clone());
        tokio::time::sleep(self.delay).await;
        if self.failing {
            return Err(CoreError::Delivery {
                status: 500,
                body: "unavailable".to_string(),
            });
        }
        Ok(DeliveryOutcome::Delivered { status: 204 })
    }

    async fn send_screenshot(&self, attachment: &Path) -> Result<DeliveryOutcome, CoreError> {
        self.screenshots.lock().push(attachment.to_path_buf());
        Ok(DeliveryOutcome::Delivered { status: 200 })
    }

    async fn send_stats(&self, stats: &StatsSnapshot) -> Result<DeliveryOutcome, CoreError> {
        self.stats.lock().push(stats.clone());
        Ok(DeliveryOutcome::Delivered { status: 204 })
    }
}

#[derive(Default)]
struct MemoryArchive {
    saved: Mutex<Vec<String>>,
    failing: bool,
}

#[async_trait]
impl DetectionArchive for MemoryArchive {
    async fn save_detection(
        &self,
        _frame: &Frame,
        aura_name: &str,
        kind: ShapeKind,
    ) -> Result<PathBuf, CoreError> {
        if self.failing {
            return Err(CoreError::Internal("disk full".to_string()));
        }
        let name = format!("{aura_name}_{kind}.png");
        self.saved.lock().push(name.clone());
        Ok(PathBuf::from(name))
    }

    async fn save_screenshot(&self, _frame: &Frame) -> Result<PathBuf, CoreError> {
        Ok(PathBuf::from("current_screen.png"))
    }
}

// ── 합성 화면 ──

fn cross() -> GrayImage {
    GrayImage::from_fn(7, 7, |x, y| Luma([if x == y || x + y == 6 { 255 } else { 0 }]))
}

fn plus() -> GrayImage {
    GrayImage::from_fn(7, 7, |x, y| Luma([if x == 3 || y == 3 { 255 } else { 0 }]))
}

/// 검은 화면 위 8각 별, 중심 3×3은 `center` 색
fn star_screen(center: Rgb) -> RgbImage {
    let mut image = RgbImage::new(120, 100);
    let (ox, oy) = (50u32, 40u32);
    for (x, y, p) in cross().enumerate_pixels() {
        if p.0[0] == 255 {
            image.put_pixel(ox + x, oy + y, image::Rgb([255, 255, 255]));
        }
    }
    for dx in 0..3 {
        for dy in 0..3 {
            image.put_pixel(ox + 2 + dx, oy + 2 + dy, image::Rgb(center.channels()));
        }
    }
    image
}

fn catalog() -> Arc<AuraCatalog> {
    let profile = |name: &str, color: Rgb, rarity: u64| AuraProfile {
        name: name.to_string(),
        color,
        tolerance: 40.0,
        rarity,
        image: None,
    };
    Arc::new(
        AuraCatalog::from_tiers(vec![Tier {
            name: "1m+".to_string(),
            profiles: vec![
                profile("Example", EXAMPLE, 100_000),
                profile("Ember", EMBER, 2_000_000),
            ],
        }])
        .unwrap(),
    )
}

struct Rig {
    window: Arc<ScriptedWindow>,
    screen: Arc<ScriptedScreen>,
    detector: Arc<AuraDetector>,
}

fn rig(cooldown: Duration) -> Rig {
    let window = Arc::new(ScriptedWindow(Mutex::new(Some(WindowGeometry::new(
        0, 0, 120, 100,
    )))));
    let screen = Arc::new(ScriptedScreen(Mutex::new(star_screen(EXAMPLE))));
    let matcher = ShapeMatcher::new(
        vec![Template::from_gray("4_corner_star", &plus()).unwrap()],
        vec![Template::from_gray("8_corner_star", &cross()).unwrap()],
    )
    .unwrap();
    let detector = Arc::new(AuraDetector::new(
        window.clone(),
        screen.clone(),
        matcher,
        catalog(),
        DetectorSettings {
            title_bar_offset_px: 31,
            cooldown,
        },
    ));
    Rig {
        window,
        screen,
        detector,
    }
}

fn worker(
    rig: &Rig,
    archive: Arc<dyn DetectionArchive>,
    notifier: Arc<dyn AuraNotifier>,
) -> DetectionWorker {
    DetectionWorker::new(
        rig.detector.clone(),
        archive,
        notifier,
        Duration::from_millis(10),
    )
}

// ── 테스트 ──

#[tokio::test]
async fn detection_is_saved_and_posted_once_with_mention() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/hook")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("<@123456>".to_string()),
            Matcher::Regex("# You rolled Example!".to_string()),
            Matcher::Regex(r"\*\* 1/100000 \*\*".to_string()),
            Matcher::Regex(r#"filename="Example_8_corners.png""#.to_string()),
        ]))
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let temp = TempDir::new().unwrap();
    let archive = Arc::new(PngImageStore::new(temp.path().to_path_buf()).await.unwrap());
    let notifier = Arc::new(
        WebhookNotifier::new(WebhookConfig {
            url: format!("{}/hook", server.url()),
            user_id: "123456".to_string(),
            ..Default::default()
        })
        .unwrap(),
    );

    let rig = rig(Duration::from_secs(15));
    let worker = worker(&rig, archive, notifier);

    worker.run_once().await;
    worker.run_once().await;

    mock.assert_async().await;
    assert!(temp.path().join("Example_8_corners.png").exists());

    let stats = worker.stats();
    assert_eq!(stats.polls, 2);
    assert_eq!(stats.detections, 1);
    assert_eq!(stats.notifications_sent, 1);
    assert_eq!(stats.last_detection.as_deref(), Some("Example"));
    assert_eq!(worker.state().previous_aura_name(), Some("Example"));
}

#[tokio::test]
async fn repeated_aura_is_suppressed_until_another_appears() {
    let rig = rig(Duration::ZERO);
    let notifier = Arc::new(RecordingNotifier::default());
    let archive = Arc::new(MemoryArchive::default());
    let worker = worker(&rig, archive.clone(), notifier.clone());

    worker.run_once().await;
    worker.run_once().await;
    assert_eq!(notifier.names(), vec!["Example"]);

    rig.screen.show(star_screen(EMBER));
    worker.run_once().await;
    rig.screen.show(star_screen(EXAMPLE));
    worker.run_once().await;

    assert_eq!(notifier.names(), vec!["Example", "Ember", "Example"]);
    assert_eq!(
        *archive.saved.lock(),
        vec![
            "Example_8_corners.png",
            "Ember_8_corners.png",
            "Example_8_corners.png"
        ]
    );
}

#[tokio::test]
async fn cooldown_blocks_distinct_aura() {
    let rig = rig(Duration::from_secs(60));
    let notifier = Arc::new(RecordingNotifier::default());
    let worker = worker(&rig, Arc::new(MemoryArchive::default()), notifier.clone());

    worker.run_once().await;
    rig.screen.show(star_screen(EMBER));
    worker.run_once().await;

    assert_eq!(notifier.names(), vec!["Example"]);
    assert_eq!(worker.stats().detections, 1);
}

#[tokio::test]
async fn distinct_aura_after_cooldown_is_notified() {
    let rig = rig(Duration::from_millis(50));
    let notifier = Arc::new(RecordingNotifier::default());
    let worker = worker(&rig, Arc::new(MemoryArchive::default()), notifier.clone());

    worker.run_once().await;
    tokio::time::sleep(Duration::from_millis(80)).await;
    rig.screen.show(star_screen(EMBER));
    worker.run_once().await;

    assert_eq!(notifier.names(), vec!["Example", "Ember"]);
}

#[tokio::test]
async fn cooldown_starts_at_poll_not_after_delivery() {
    let rig = rig(Duration::from_millis(450));
    let notifier = Arc::new(RecordingNotifier::slow(Duration::from_millis(400)));
    let worker = worker(&rig, Arc::new(MemoryArchive::default()), notifier.clone());

    let before = Instant::now();
    worker.run_once().await;
    assert!(before.elapsed() >= Duration::from_millis(400));

    let recorded = worker.state().last_detection().unwrap();
    assert!(recorded >= before);
    assert!(recorded < before + Duration::from_millis(150));

    // 알림 완료 시각 기준이면 before + 850ms까지 쿨다운
    tokio::time::sleep_until(tokio::time::Instant::from_std(
        before + Duration::from_millis(600),
    ))
    .await;
    rig.screen.show(star_screen(EMBER));
    worker.run_once().await;

    assert_eq!(notifier.names(), vec!["Example", "Ember"]);
}

#[tokio::test]
async fn failed_notification_still_advances_state() {
    let rig = rig(Duration::ZERO);
    let notifier = Arc::new(RecordingNotifier::failing());
    let worker = worker(&rig, Arc::new(MemoryArchive::default()), notifier.clone());

    worker.run_once().await;
    worker.run_once().await;

    assert_eq!(notifier.names(), vec!["Example"]);
    assert_eq!(worker.state().previous_aura_name(), Some("Example"));
    let stats = worker.stats();
    assert_eq!(stats.detections, 1);
    assert_eq!(stats.notifications_sent, 0);
    assert_eq!(stats.notification_failures, 1);
}

#[tokio::test]
async fn failed_save_skips_notification_and_record() {
    let rig = rig(Duration::ZERO);
    let notifier = Arc::new(RecordingNotifier::default());
    let archive = Arc::new(MemoryArchive {
        failing: true,
        ..Default::default()
    });
    let worker = worker(&rig, archive, notifier.clone());

    worker.run_once().await;

    assert!(notifier.names().is_empty());
    assert!(worker.state().previous_aura_name().is_none());
    assert_eq!(worker.stats().detections, 0);
}

#[tokio::test]
async fn missing_window_counts_skipped_poll() {
    let rig = rig(Duration::ZERO);
    *rig.window.0.lock() = None;
    let notifier = Arc::new(RecordingNotifier::default());
    let worker = worker(&rig, Arc::new(MemoryArchive::default()), notifier.clone());

    worker.run_once().await;

    let stats = worker.stats();
    assert_eq!(stats.polls, 1);
    assert_eq!(stats.skipped_polls, 1);
    assert!(notifier.names().is_empty());
}

#[tokio::test]
async fn stats_request_is_sent_after_poll() {
    let rig = rig(Duration::ZERO);
    let notifier = Arc::new(RecordingNotifier::default());
    let worker = worker(&rig, Arc::new(MemoryArchive::default()), notifier.clone());

    worker.request_stats();
    worker.run_once().await;
    worker.run_once().await;

    let reports = notifier.stats.lock().clone();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].polls, 1);
    assert_eq!(reports[0].detections, 1);
}

#[tokio::test]
async fn controller_start_stop_lifecycle() {
    let rig = rig(Duration::ZERO);
    let notifier = Arc::new(RecordingNotifier::default());
    let archive = Arc::new(MemoryArchive::default());
    let controller = MacroController::new(
        worker(&rig, archive.clone(), notifier.clone()),
        rig.screen.clone(),
        archive,
        notifier.clone(),
    );

    assert!(matches!(
        controller.stop().await,
        Err(CoreError::InvalidState(msg)) if msg == "탐지 루프가 실행 중이 아닙니다"
    ));

    controller.start().await.unwrap();
    assert!(controller.status().running);
    assert!(matches!(
        controller.start().await,
        Err(CoreError::InvalidState(msg)) if msg == "탐지 루프가 이미 실행 중입니다"
    ));

    tokio::time::sleep(Duration::from_millis(100)).await;
    controller.stop().await.unwrap();

    let stats = controller.status();
    assert!(!stats.running);
    assert!(stats.started_at.is_some());
    assert!(stats.polls >= 1);
    assert_eq!(notifier.names(), vec!["Example"]);
    assert!(matches!(
        controller.stop().await,
        Err(CoreError::InvalidState(_))
    ));
}

#[tokio::test]
async fn lifecycle_shutdown_stops_running_worker() {
    let rig = rig(Duration::ZERO);
    let notifier = Arc::new(RecordingNotifier::default());
    let archive = Arc::new(MemoryArchive::default());
    let controller = Arc::new(MacroController::new(
        worker(&rig, archive.clone(), notifier.clone()),
        rig.screen.clone(),
        archive,
        notifier,
    ));
    controller.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    LifecycleManager::new(controller.clone()).shutdown().await;

    assert!(!controller.status().running);
    assert!(controller.stop().await.is_err());
    // 종료 후에는 다시 시작 가능
    controller.start().await.unwrap();
    controller.stop().await.unwrap();
}

#[tokio::test]
async fn screenshot_is_saved_and_sent() {
    let rig = rig(Duration::ZERO);
    let notifier = Arc::new(RecordingNotifier::default());
    let archive = Arc::new(MemoryArchive::default());
    let controller = MacroController::new(
        worker(&rig, archive.clone(), notifier.clone()),
        rig.screen.clone(),
        archive,
        notifier.clone(),
    );

    let outcome = controller.capture_and_send().await.unwrap();
    assert!(outcome.is_delivered());
    assert_eq!(
        *notifier.screenshots.lock(),
        vec![PathBuf::from("current_screen.png")]
    );
}
