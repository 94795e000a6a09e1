//! 스크린 캡처.
//!
//! xcap 기반 주 모니터 캡처.

use aurawatch_core::error::CoreError;
use aurawatch_core::models::frame::Frame;
use aurawatch_core::ports::capture::ScreenCapturer;
use image::DynamicImage;
use tracing::debug;
use xcap::Monitor;

/// 스크린 캡처: xcap 기반
pub struct XcapScreenCapture;

impl XcapScreenCapture {
    /// 새 캡처 인스턴스 생성
    pub fn new() -> Self {
        Self
    }

    fn primary_monitor() -> Result<Monitor, CoreError> {
        let monitors = Monitor::all()
            .map_err(|e| CoreError::Capture(format!("모니터 목록 조회 실패: {e}")))?;

        let primary = monitors
            .iter()
            .position(|m| m.is_primary().unwrap_or(false))
            .unwrap_or(0);

        monitors
            .into_iter()
            .nth(primary)
            .ok_or_else(|| CoreError::Capture("모니터를 찾을 수 없음".to_string()))
    }
}

impl Default for XcapScreenCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenCapturer for XcapScreenCapture {
    fn capture(&self) -> Result<Frame, CoreError> {
        let monitor = Self::primary_monitor()?;

        // 창 좌표는 가상 데스크톱 기준이므로 모니터 원점을 같이 기록
        let origin = (monitor.x().unwrap_or(0), monitor.y().unwrap_or(0));

        let image = monitor
            .capture_image()
            .map_err(|e| CoreError::Capture(format!("스크린 캡처 실패: {e}")))?;

        debug!(
            "스크린 캡처 완료: {}x{} (원점 {:?})",
            image.width(),
            image.height(),
            origin
        );

        let rgb = DynamicImage::ImageRgba8(image).to_rgb8();
        Ok(Frame::with_origin(rgb, origin))
    }
}
