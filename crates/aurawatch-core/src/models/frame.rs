//! 캡처 프레임 모델.
//!
//! 한 번의 폴링에서만 쓰이고 버려지는 화면 이미지 버퍼.

use chrono::{DateTime, Utc};
use image::RgbImage;

use super::aura::Rgb;

/// 캡처된 화면 이미지 + 캡처 시각
#[derive(Debug, Clone)]
pub struct Frame {
    /// RGB 픽셀 버퍼
    pub image: RgbImage,
    /// 캡처한 모니터의 화면 좌표 원점 (멀티 모니터 보정)
    pub origin: (i32, i32),
    /// 캡처 시각
    pub captured_at: DateTime<Utc>,
}

impl Frame {
    /// 원점 (0, 0) 프레임 생성
    pub fn new(image: RgbImage) -> Self {
        Self::with_origin(image, (0, 0))
    }

    pub fn with_origin(image: RgbImage, origin: (i32, i32)) -> Self {
        Self {
            image,
            origin,
            captured_at: Utc::now(),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// 화면 좌표 → 프레임 픽셀 좌표. 프레임 밖이면 `None`.
    pub fn to_local(&self, screen_x: i64, screen_y: i64) -> Option<(u32, u32)> {
        let lx = screen_x - self.origin.0 as i64;
        let ly = screen_y - self.origin.1 as i64;
        if lx < 0 || ly < 0 || lx >= self.width() as i64 || ly >= self.height() as i64 {
            return None;
        }
        Some((lx as u32, ly as u32))
    }

    /// 화면 좌표의 픽셀 색상
    pub fn screen_pixel(&self, screen_x: i64, screen_y: i64) -> Option<Rgb> {
        let (x, y) = self.to_local(screen_x, screen_y)?;
        Some(self.pixel(x, y))
    }

    /// 프레임 픽셀 좌표의 색상 (범위 검사는 호출자 책임)
    pub fn pixel(&self, x: u32, y: u32) -> Rgb {
        let p = self.image.get_pixel(x, y);
        Rgb::new(p[0], p[1], p[2])
    }
}
