//! 창 모서리 사전 필터.
//!
//! 오라 연출 중에는 창 가장자리가 검게 덮이므로, 네 모서리의 색만으로
//! 값비싼 템플릿 매칭 결과를 채택할지 판단한다.

use aurawatch_core::models::aura::Rgb;
use aurawatch_core::models::frame::Frame;
use aurawatch_core::models::geometry::WindowGeometry;

/// 모든 채널이 이 값 미만이면 검정
pub const BLACK_THRESHOLD: u8 = 80;

/// 모든 채널이 이 값 초과면 흰색
pub const WHITE_THRESHOLD: u8 = 175;

pub fn is_black(color: Rgb) -> bool {
    color.channels().iter().all(|&c| c < BLACK_THRESHOLD)
}

pub fn is_white(color: Rgb) -> bool {
    color.channels().iter().all(|&c| c > WHITE_THRESHOLD)
}

/// 샘플링 위치
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    TopLeft = 0,
    TopRight = 1,
    BottomLeft = 2,
    BottomRight = 3,
}

/// 네 모서리 샘플 결과 (`None`은 프레임 밖)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CornerReport {
    samples: [Option<Rgb>; 4],
}

impl CornerReport {
    pub fn new(samples: [Option<Rgb>; 4]) -> Self {
        Self { samples }
    }

    /// 창 좌표 기준 네 점을 샘플링.
    ///
    /// 상단 두 점은 제목 표시줄 아래(`title_bar_offset`), 하단 두 점은
    /// 아래 가장자리에서 2px 안쪽.
    pub fn sample(frame: &Frame, window: &WindowGeometry, title_bar_offset: u32) -> Self {
        let left = window.x as i64 + 1;
        let right = window.x as i64 + window.width as i64 - 2;
        let top = window.y as i64 + title_bar_offset as i64;
        let bottom = window.y as i64 + window.height as i64 - 2;

        Self::new([
            frame.screen_pixel(left, top),
            frame.screen_pixel(right, top),
            frame.screen_pixel(left, bottom),
            frame.screen_pixel(right, bottom),
        ])
    }

    pub fn sample_at(&self, corner: Corner) -> Option<Rgb> {
        self.samples[corner as usize]
    }

    pub fn is_black(&self, corner: Corner) -> bool {
        self.sample_at(corner).is_some_and(is_black)
    }

    pub fn is_white(&self, corner: Corner) -> bool {
        self.sample_at(corner).is_some_and(is_white)
    }

    pub fn black_count(&self) -> usize {
        self.samples.iter().flatten().filter(|c| is_black(**c)).count()
    }

    /// 모양 매칭 결과와 결합한 채택 판정.
    ///
    /// (네 모서리 모두 검정 AND 모양 있음) OR
    /// (모양 있음 AND 좌상/우상 검정 AND 좌하 흰색 아님)
    pub fn accepts(&self, shape_found: bool) -> bool {
        if !shape_found {
            return false;
        }
        if self.black_count() >= 4 {
            return true;
        }
        self.is_black(Corner::TopLeft)
            && self.is_black(Corner::TopRight)
            && !self.is_white(Corner::BottomLeft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    const BLACK: Rgb = Rgb::new(0, 0, 0);
    const WHITE: Rgb = Rgb::new(255, 255, 255);
    const GREY: Rgb = Rgb::new(120, 120, 120);

    #[test]
    fn thresholds_are_exclusive() {
        assert!(is_black(Rgb::new(79, 79, 79)));
        assert!(!is_black(Rgb::new(80, 0, 0)));
        assert!(!is_black(Rgb::new(0, 0, 80)));

        assert!(is_white(Rgb::new(176, 176, 176)));
        assert!(!is_white(Rgb::new(175, 255, 255)));
        assert!(!is_white(Rgb::new(255, 255, 175)));
    }

    #[test]
    fn black_and_white_are_mutually_exclusive() {
        for v in 0..=255u8 {
            for c in [Rgb::new(v, v, v), Rgb::new(v, 0, 255), Rgb::new(255 - v, v, 40)] {
                assert!(!(is_black(c) && is_white(c)), "{:?}", c);
            }
        }
    }

    #[test]
    fn counts_ignore_missing_samples() {
        let report = CornerReport::new([Some(BLACK), None, Some(WHITE), Some(BLACK)]);
        assert_eq!(report.black_count(), 2);
        assert!(report.is_white(Corner::BottomLeft));
        assert!(!report.is_black(Corner::TopRight));
        assert!(!report.is_white(Corner::TopRight));
    }

    #[test]
    fn accept_gate() {
        let all_black = CornerReport::new([Some(BLACK); 4]);
        assert!(all_black.accepts(true));
        assert!(!all_black.accepts(false));

        // 상단 검정 + 좌하 흰색 아님
        let top_black = CornerReport::new([Some(BLACK), Some(BLACK), Some(GREY), Some(WHITE)]);
        assert!(top_black.accepts(true));

        // 좌하 흰색이면 거부
        let bottom_white = CornerReport::new([Some(BLACK), Some(BLACK), Some(WHITE), Some(BLACK)]);
        assert!(!bottom_white.accepts(true));

        // 우상이 검정이 아니면 거부
        let one_top = CornerReport::new([Some(BLACK), Some(GREY), Some(BLACK), Some(BLACK)]);
        assert!(!one_top.accepts(true));
    }

    #[test]
    fn samples_window_relative_points() {
        let mut image = RgbImage::from_pixel(200, 150, image::Rgb([200, 200, 200]));
        let window = WindowGeometry::new(10, 5, 100, 80);
        // 좌상 (11, 36), 우상 (108, 36), 좌하 (11, 83), 우하 (108, 83)
        image.put_pixel(11, 36, image::Rgb([1, 2, 3]));
        image.put_pixel(108, 36, image::Rgb([4, 5, 6]));
        image.put_pixel(11, 83, image::Rgb([7, 8, 9]));
        image.put_pixel(108, 83, image::Rgb([10, 11, 12]));
        let frame = Frame::new(image);

        let report = CornerReport::sample(&frame, &window, 31);
        assert_eq!(report.sample_at(Corner::TopLeft), Some(Rgb::new(1, 2, 3)));
        assert_eq!(report.sample_at(Corner::TopRight), Some(Rgb::new(4, 5, 6)));
        assert_eq!(report.sample_at(Corner::BottomLeft), Some(Rgb::new(7, 8, 9)));
        assert_eq!(report.sample_at(Corner::BottomRight), Some(Rgb::new(10, 11, 12)));
        assert_eq!(report.black_count(), 4);
    }

    #[test]
    fn points_outside_frame_are_neither() {
        let frame = Frame::new(RgbImage::new(50, 50));
        let window = WindowGeometry::new(30, 30, 100, 100);
        let report = CornerReport::sample(&frame, &window, 31);
        assert_eq!(report.sample_at(Corner::TopRight), None);
        assert_eq!(report.black_count(), 0);
    }
}
