//! 대상 창 조회.
//!
//! 창 목록에서 제목이 대상 이름을 포함하는 첫 번째 창을 찾고
//! 창 테두리를 제외한 영역을 반환한다.

use aurawatch_core::error::CoreError;
use aurawatch_core::models::geometry::WindowGeometry;
use aurawatch_core::ports::window::WindowLocator;
use tracing::{debug, trace};
use xcap::Window;

/// 제목 부분 일치 창 조회: xcap 기반
pub struct XcapWindowLocator {
    title_fragment: String,
    border_px: u32,
}

impl XcapWindowLocator {
    pub fn new(title_fragment: impl Into<String>, border_px: u32) -> Self {
        Self {
            title_fragment: title_fragment.into(),
            border_px,
        }
    }
}

impl WindowLocator for XcapWindowLocator {
    fn locate(&self) -> Result<Option<WindowGeometry>, CoreError> {
        let windows = Window::all()
            .map_err(|e| CoreError::Capture(format!("창 목록 조회 실패: {e}")))?;

        for window in windows {
            let Ok(title) = window.title() else {
                continue;
            };
            if !title.contains(&self.title_fragment) {
                continue;
            }
            if window.is_minimized().unwrap_or(false) {
                trace!("최소화된 창 건너뜀: {title}");
                continue;
            }

            let (Ok(x), Ok(y), Ok(width), Ok(height)) =
                (window.x(), window.y(), window.width(), window.height())
            else {
                continue;
            };

            let geometry = WindowGeometry::new(x, y, width, height).inset(self.border_px);
            debug!("대상 창 발견: {title} → {:?}", geometry);
            return Ok(geometry);
        }

        Ok(None)
    }
}
