//! 화면 좌표 모델 (창 영역, 매칭 바운딩 박스).

use serde::{Deserialize, Serialize};

/// 대상 창의 화면 좌표 (창 테두리 제외)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowGeometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl WindowGeometry {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// 각 변을 `border`만큼 안쪽으로 줄인 영역.
    ///
    /// 테두리를 빼고 남는 영역이 없으면 `None`.
    pub fn inset(&self, border: u32) -> Option<Self> {
        let shrink = border.checked_mul(2)?;
        if self.width <= shrink || self.height <= shrink {
            return None;
        }
        Some(Self {
            x: self.x + border as i32,
            y: self.y + border as i32,
            width: self.width - shrink,
            height: self.height - shrink,
        })
    }
}

/// 템플릿 매칭 바운딩 박스 (프레임 픽셀 좌표)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// 정수 나눗셈 중심점
    pub fn center(&self) -> (u32, u32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }
}
