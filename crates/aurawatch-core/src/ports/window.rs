//! 대상 창 조회 포트.
//!
//! 구현: `aurawatch-vision` crate (xcap)

use crate::error::CoreError;
use crate::models::geometry::WindowGeometry;

/// 대상 창 좌표 조회
pub trait WindowLocator: Send + Sync {
    /// 제목이 대상 이름을 포함하는 첫 번째 창의 좌표 (테두리 제외).
    ///
    /// 창이 없으면 `Ok(None)`: 호출자는 이번 폴링을 건너뛴다.
    fn locate(&self) -> Result<Option<WindowGeometry>, CoreError>;
}
