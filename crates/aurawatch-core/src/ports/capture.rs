//! 화면 캡처 포트.
//!
//! 구현: `aurawatch-vision` crate (xcap)

use crate::error::CoreError;
use crate::models::frame::Frame;

/// 전체 화면 캡처
pub trait ScreenCapturer: Send + Sync {
    /// 현재 화면을 캡처해 새 프레임 반환
    fn capture(&self) -> Result<Frame, CoreError>;
}
