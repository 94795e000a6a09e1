//! 애플리케이션 설정 구조체.
//!
//! 웹훅 전송, 탐지 루프, 로컬 제어 API 설정을 정의한다.
//! 모든 필드에 serde 기본값이 있어 일부만 적힌 설정 파일도 로드된다.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 웹훅 알림 설정
    #[serde(default)]
    pub webhook: WebhookConfig,
    /// 탐지 루프 설정
    #[serde(default)]
    pub detection: DetectionConfig,
    /// 로컬 제어 API 설정
    #[serde(default)]
    pub control: ControlConfig,
}

impl AppConfig {
    /// 기본 설정 생성
    pub fn default_config() -> Self {
        Self::default()
    }
}

// ============================================================
// 웹훅 설정
// ============================================================

/// 웹훅 알림 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// 웹훅 URL (비어 있으면 전송 생략)
    #[serde(default)]
    pub url: String,
    /// 멘션 대상 사용자 ID
    #[serde(default)]
    pub user_id: String,
    /// 이 희귀도 이상이면 사용자 멘션
    #[serde(default = "default_ping_minimum")]
    pub ping_minimum: u64,
    /// 이 희귀도 미만이면 전송 생략 (탐지 기록은 유지)
    #[serde(default = "default_send_minimum")]
    pub send_minimum: u64,
    /// 요청 타임아웃 (ms)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            user_id: String::new(),
            ping_minimum: default_ping_minimum(),
            send_minimum: default_send_minimum(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl WebhookConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn default_ping_minimum() -> u64 {
    100_000
}

fn default_send_minimum() -> u64 {
    10_000
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

// ============================================================
// 탐지 설정
// ============================================================

/// 탐지 루프 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// 대상 창 제목 (부분 일치)
    #[serde(default = "default_window_title")]
    pub window_title: String,
    /// 창 테두리 두께 (px)
    #[serde(default = "default_window_border_px")]
    pub window_border_px: u32,
    /// 상단 모서리 샘플링 시 제목 표시줄 보정 (px)
    #[serde(default = "default_title_bar_offset_px")]
    pub title_bar_offset_px: u32,
    /// 폴링 주기 (ms)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// 탐지 후 재탐지 대기 시간 (초)
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    /// 오라 카탈로그 JSON 경로
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,
    /// 기준 별 템플릿 디렉토리
    #[serde(default = "default_templates_dir")]
    pub templates_dir: PathBuf,
    /// 탐지 이미지 저장 디렉토리
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// 시작 시 탐지 루프 자동 실행
    #[serde(default)]
    pub autostart: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            window_title: default_window_title(),
            window_border_px: default_window_border_px(),
            title_bar_offset_px: default_title_bar_offset_px(),
            poll_interval_ms: default_poll_interval_ms(),
            cooldown_secs: default_cooldown_secs(),
            catalog_path: default_catalog_path(),
            templates_dir: default_templates_dir(),
            output_dir: default_output_dir(),
            autostart: false,
        }
    }
}

impl DetectionConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

fn default_window_title() -> String {
    "Roblox".to_string()
}

fn default_window_border_px() -> u32 {
    8
}

fn default_title_bar_offset_px() -> u32 {
    31
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

fn default_cooldown_secs() -> u64 {
    15
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("auras.json")
}

fn default_templates_dir() -> PathBuf {
    PathBuf::from("images")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("images").join("auras")
}

// ============================================================
// 제어 API 설정
// ============================================================

/// 로컬 제어 API 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    /// 제어 API 활성화 여부
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// 바인딩 포트
    #[serde(default = "default_control_port")]
    pub port: u16,
    /// 외부 접근 허용 (false면 127.0.0.1만)
    #[serde(default)]
    pub allow_external: bool,
    /// 명령을 허용할 사용자 ID (비어 있으면 모든 명령 거부)
    #[serde(default)]
    pub authorized_user_id: String,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_control_port(),
            allow_external: false,
            authorized_user_id: String::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_control_port() -> u16 {
    9191
}
