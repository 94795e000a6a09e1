//! 중심 색상 분류.
//!
//! 매칭된 별의 중심 3×3 평균 색을 카탈로그 버킷과 비교한다.
//! RGB 유클리드 거리로 1차 거르고, 통과한 항목만 HSV 거리로 최종 비교.
//!
//! HSV는 8비트 표현(H 0..180, S/V 0..255)을 사용한다.

use aurawatch_core::models::aura::{AuraProfile, Rgb};
use aurawatch_core::models::frame::Frame;

/// 8비트 HSV (H: 0..180)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

pub fn rgb_to_hsv(color: Rgb) -> Hsv {
    let (r, g, b) = (color.r as i32, color.g as i32, color.b as i32);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = v - min;

    let s = if v == 0 {
        0
    } else {
        ((diff as f64 * 255.0 / v as f64).round() as i32).clamp(0, 255)
    };

    let h = if diff == 0 {
        0.0
    } else if v == r {
        60.0 * (g - b) as f64 / diff as f64
    } else if v == g {
        120.0 + 60.0 * (b - r) as f64 / diff as f64
    } else {
        240.0 + 60.0 * (r - g) as f64 / diff as f64
    };
    let h = if h < 0.0 { h + 360.0 } else { h };
    let h = ((h / 2.0).round() as i32) % 180;

    Hsv {
        h: h as u8,
        s: s as u8,
        v: v as u8,
    }
}

pub fn rgb_distance(a: Rgb, b: Rgb) -> f64 {
    let dr = a.r as f64 - b.r as f64;
    let dg = a.g as f64 - b.g as f64;
    let db = a.b as f64 - b.b as f64;
    (dr * dr + dg * dg + db * db).sqrt()
}

/// 색상환 최단 호 기준 가중 거리 (0..255 스케일)
pub fn hsv_distance(a: Hsv, b: Hsv) -> f64 {
    let raw_dh = (a.h as i32 - b.h as i32).abs();
    let dh = raw_dh.min(180 - raw_dh) as f64 / 180.0;
    let ds = (a.s as i32 - b.s as i32).abs() as f64 / 255.0;
    let dv = (a.v as i32 - b.v as i32).abs() as f64 / 255.0;
    (dh * dh + ds * ds + dv * dv).sqrt() * 255.0
}

/// 중심점 주변 3×3 평균 색 (채널별 내림).
///
/// 프레임 밖 이웃은 제외하고, 전부 밖이면 `None`.
pub fn sample_center(frame: &Frame, center: (u32, u32)) -> Option<Rgb> {
    let (cx, cy) = (center.0 as i64, center.1 as i64);
    let mut sum = [0u32; 3];
    let mut count = 0u32;

    for dx in -1..=1i64 {
        for dy in -1..=1i64 {
            let (x, y) = (cx + dx, cy + dy);
            if x < 0 || y < 0 || x >= frame.width() as i64 || y >= frame.height() as i64 {
                continue;
            }
            let p = frame.pixel(x as u32, y as u32);
            sum[0] += p.r as u32;
            sum[1] += p.g as u32;
            sum[2] += p.b as u32;
            count += 1;
        }
    }

    if count == 0 {
        return None;
    }
    Some(Rgb::new(
        (sum[0] / count) as u8,
        (sum[1] / count) as u8,
        (sum[2] / count) as u8,
    ))
}

/// 분류 결과
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMatch<'a> {
    pub profile: &'a AuraProfile,
    pub rgb_distance: f64,
    pub hsv_distance: f64,
}

/// 버킷에서 가장 가까운 프로파일.
///
/// RGB 거리와 HSV 거리가 모두 허용치 미만이어야 하며, HSV 거리가
/// 같으면 먼저 나온 프로파일이 유지된다.
pub fn classify(sample: Rgb, bucket: &[AuraProfile]) -> Option<ColorMatch<'_>> {
    let sample_hsv = rgb_to_hsv(sample);
    let mut best: Option<ColorMatch<'_>> = None;

    for profile in bucket {
        let rgb = rgb_distance(sample, profile.color);
        if rgb >= profile.tolerance {
            continue;
        }

        let hsv = hsv_distance(sample_hsv, rgb_to_hsv(profile.color));
        if hsv >= profile.tolerance {
            continue;
        }
        if best.as_ref().is_some_and(|b| hsv >= b.hsv_distance) {
            continue;
        }

        best = Some(ColorMatch {
            profile,
            rgb_distance: rgb,
            hsv_distance: hsv,
        });
    }

    best
}
