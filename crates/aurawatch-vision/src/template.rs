//! 정규화 상호상관 템플릿 매칭.
//!
//! 평균을 뺀 상관계수(`TM_CCOEFF_NORMED`)를 계산한다.
//! - 창 합/제곱합은 적분 영상으로 O(1) 조회
//! - 분자는 평균 제거 템플릿과의 내적. 작은 템플릿은 창마다 직접,
//!   큰 템플릿은 프레임 스펙트럼 곱으로 모든 위치를 한 번에 계산
//! - 분산이 0인 평탄 영역은 점수 0

use std::path::Path;
use std::sync::OnceLock;

use aurawatch_core::error::CoreError;
use image::{GrayImage, RgbImage};
use rayon::prelude::*;

use crate::spectrum::FrameSpectrum;

/// 채택 임계값 (포함)
pub const MATCH_THRESHOLD: f32 = 0.75;

/// 분모가 이 값 이하이면 평탄 영역으로 간주
const FLAT_EPSILON: f64 = 1e-6;

/// 이 면적 이상인 템플릿은 FFT 경로 사용
const SPECTRUM_MIN_AREA: u32 = 256;

/// RGB → 8비트 그레이스케일 (BT.601 고정소수점)
pub fn to_gray(image: &RgbImage) -> GrayImage {
    let mut gray = GrayImage::new(image.width(), image.height());
    for (src, dst) in image.pixels().zip(gray.pixels_mut()) {
        let [r, g, b] = src.0;
        let y = (r as u32 * 4899 + g as u32 * 9617 + b as u32 * 1868 + (1 << 13)) >> 14;
        dst.0[0] = y.min(255) as u8;
    }
    gray
}

/// 기준 템플릿 (그레이스케일)
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    width: u32,
    height: u32,
    /// 평균을 뺀 픽셀값 (행 우선)
    centered: Vec<f32>,
    /// sqrt(Σ(T - mean)²)
    norm: f64,
}

impl Template {
    pub fn from_gray(name: impl Into<String>, image: &GrayImage) -> Result<Self, CoreError> {
        let name = name.into();
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(CoreError::Template(format!("빈 템플릿 이미지: {name}")));
        }

        let n = (width * height) as f64;
        let mean = image.as_raw().iter().map(|&p| p as f64).sum::<f64>() / n;
        let centered: Vec<f32> = image
            .as_raw()
            .iter()
            .map(|&p| (p as f64 - mean) as f32)
            .collect();
        let norm = centered
            .iter()
            .map(|&t| (t as f64) * (t as f64))
            .sum::<f64>()
            .sqrt();

        Ok(Self {
            name,
            width,
            height,
            centered,
            norm,
        })
    }

    /// 이미지 파일에서 로드 (그레이스케일 변환)
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let image = image::open(path).map_err(|e| {
            CoreError::Template(format!("템플릿 로드 실패: {}: {e}", path.display()))
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_gray(name, &to_gray(&image.to_rgb8()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// 프레임의 모든 위치에 대한 상관계수 맵 계산.
    ///
    /// 프레임이 템플릿보다 작으면 빈 맵.
    pub fn match_against(&self, frame: &SearchFrame) -> ScoreMap {
        let (fw, fh) = frame.dimensions();
        if fw < self.width || fh < self.height {
            return ScoreMap::empty();
        }

        let out_w = (fw - self.width + 1) as usize;
        let out_h = (fh - self.height + 1) as usize;
        let numerators = if self.uses_spectrum() {
            frame
                .spectrum()
                .correlate(&self.centered, self.width as usize, self.height as usize)
        } else {
            self.direct_numerators(&frame.gray, out_w, out_h)
        };

        let tw = self.width as usize;
        let th = self.height as usize;
        let n = (tw * th) as f64;
        let mut scores = vec![0.0f32; out_w * out_h];

        scores
            .par_chunks_mut(out_w)
            .zip(numerators.par_chunks(out_w))
            .enumerate()
            .for_each(|(y, (row, numerator_row))| {
                for (x, (score, &numerator)) in row.iter_mut().zip(numerator_row).enumerate() {
                    let (sum, sum_sq) = frame.integral.window(x, y, tw, th);
                    let variance = (sum_sq - sum * sum / n).max(0.0);
                    let denom = variance.sqrt() * self.norm;
                    *score = if denom <= FLAT_EPSILON {
                        0.0
                    } else {
                        clamp_correlation(numerator / denom)
                    };
                }
            });

        ScoreMap {
            width: out_w as u32,
            height: out_h as u32,
            scores,
        }
    }

    /// 큰 템플릿은 프레임 스펙트럼으로 분자 계산
    fn uses_spectrum(&self) -> bool {
        self.width * self.height >= SPECTRUM_MIN_AREA
    }

    /// 창마다 직접 내적 (작은 템플릿용)
    fn direct_numerators(&self, frame: &GrayImage, out_w: usize, out_h: usize) -> Vec<f64> {
        let tw = self.width as usize;
        let th = self.height as usize;
        let stride = frame.width() as usize;
        let pixels = frame.as_raw();
        let mut numerators = vec![0.0f64; out_w * out_h];

        numerators
            .par_chunks_mut(out_w)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, numerator) in row.iter_mut().enumerate() {
                    let mut total = 0.0f64;
                    for ty in 0..th {
                        let start = (y + ty) * stride + x;
                        let frame_row = &pixels[start..start + tw];
                        let template_row = &self.centered[ty * tw..(ty + 1) * tw];
                        let dot: f32 = frame_row
                            .iter()
                            .zip(template_row)
                            .map(|(&p, &t)| p as f32 * t)
                            .sum();
                        total += dot as f64;
                    }
                    *numerator = total;
                }
            });

        numerators
    }
}

/// 매칭 대상 프레임.
///
/// 그레이스케일 영상, 적분 영상, (필요할 때) FFT 스펙트럼을 한 번만
/// 만들어 같은 프레임의 모든 템플릿이 공유한다.
pub struct SearchFrame {
    gray: GrayImage,
    integral: IntegralImage,
    spectrum: OnceLock<FrameSpectrum>,
}

impl SearchFrame {
    pub fn new(gray: GrayImage) -> Self {
        let integral = IntegralImage::new(&gray);
        Self {
            gray,
            integral,
            spectrum: OnceLock::new(),
        }
    }

    pub fn from_rgb(image: &RgbImage) -> Self {
        Self::new(to_gray(image))
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.gray.dimensions()
    }

    fn spectrum(&self) -> &FrameSpectrum {
        self.spectrum.get_or_init(|| FrameSpectrum::new(&self.gray))
    }
}

/// 부동소수 오차로 [-1, 1]을 살짝 벗어난 값은 경계로, 크게 벗어나면 0으로
fn clamp_correlation(r: f64) -> f32 {
    let magnitude = r.abs();
    if magnitude <= 1.0 {
        r as f32
    } else if magnitude < 1.125 {
        r.signum() as f32
    } else {
        0.0
    }
}

/// 상관계수 맵 (행 우선, 좌표는 템플릿 좌상단 위치)
#[derive(Debug, Clone, Default)]
pub struct ScoreMap {
    width: u32,
    height: u32,
    scores: Vec<f32>,
}

impl ScoreMap {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_scores(width: u32, height: u32, scores: Vec<f32>) -> Self {
        debug_assert_eq!(scores.len(), (width * height) as usize);
        Self {
            width,
            height,
            scores,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.scores.get((y * self.width + x) as usize).copied()
    }

    /// 최대 점수와 그 위치 (동점이면 행 우선 첫 위치)
    pub fn peak(&self) -> Option<(f32, u32, u32)> {
        let mut best: Option<(f32, usize)> = None;
        for (i, &s) in self.scores.iter().enumerate() {
            if best.map_or(true, |(b, _)| s > b) {
                best = Some((s, i));
            }
        }
        best.map(|(s, i)| {
            let i = i as u32;
            (s, i % self.width, i / self.width)
        })
    }

    /// 임계값 이상 위치가 하나라도 있으면 최대 점수, 없으면 0
    pub fn confidence(&self, threshold: f32) -> f32 {
        match self.peak() {
            Some((s, _, _)) if s >= threshold => s,
            _ => 0.0,
        }
    }

    /// 임계값 이상인 모든 위치 (행 우선)
    pub fn locations_at_least(&self, threshold: f32) -> impl Iterator<Item = (u32, u32)> + '_ {
        let width = self.width;
        self.scores
            .iter()
            .enumerate()
            .filter(move |&(_, &s)| s >= threshold)
            .map(move |(i, _)| (i as u32 % width, i as u32 / width))
    }
}

/// 합/제곱합 적분 영상
struct IntegralImage {
    stride: usize,
    sum: Vec<f64>,
    sum_sq: Vec<f64>,
}

impl IntegralImage {
    fn new(image: &GrayImage) -> Self {
        let (w, h) = (image.width() as usize, image.height() as usize);
        let stride = w + 1;
        let mut sum = vec![0.0f64; stride * (h + 1)];
        let mut sum_sq = vec![0.0f64; stride * (h + 1)];
        let pixels = image.as_raw();

        for y in 0..h {
            let mut row_sum = 0.0;
            let mut row_sq = 0.0;
            for x in 0..w {
                let p = pixels[y * w + x] as f64;
                row_sum += p;
                row_sq += p * p;
                let idx = (y + 1) * stride + x + 1;
                sum[idx] = sum[idx - stride] + row_sum;
                sum_sq[idx] = sum_sq[idx - stride] + row_sq;
            }
        }

        Self {
            stride,
            sum,
            sum_sq,
        }
    }

    /// (x, y)에서 시작하는 w×h 창의 (합, 제곱합)
    fn window(&self, x: usize, y: usize, w: usize, h: usize) -> (f64, f64) {
        let a = y * self.stride + x;
        let b = y * self.stride + x + w;
        let c = (y + h) * self.stride + x;
        let d = (y + h) * self.stride + x + w;
        (
            self.sum[d] - self.sum[b] - self.sum[c] + self.sum[a],
            self.sum_sq[d] - self.sum_sq[b] - self.sum_sq[c] + self.sum_sq[a],
        )
    }
}
