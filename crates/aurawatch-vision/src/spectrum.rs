//! 프레임 스펙트럼 기반 상호상관.
//!
//! 프레임의 2D FFT를 한 번 계산해 두고, 템플릿마다
//! `IFFT(F · conj(T))`로 모든 위치의 내적을 한꺼번에 얻는다.
//! 유효 위치(템플릿이 프레임 안에 완전히 들어가는 위치)만 읽으므로
//! 프레임 크기 그대로 변환해도 순환 겹침이 생기지 않는다.

use std::sync::Arc;

use image::GrayImage;
use rayon::prelude::*;
use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// 프레임 2D 스펙트럼과 재사용할 FFT 계획
pub(crate) struct FrameSpectrum {
    width: usize,
    height: usize,
    row_forward: Arc<dyn Fft<f64>>,
    row_inverse: Arc<dyn Fft<f64>>,
    col_forward: Arc<dyn Fft<f64>>,
    col_inverse: Arc<dyn Fft<f64>>,
    /// 열 변환까지 마친 전치 배치 (width개 행 × height)
    data: Vec<Complex<f64>>,
}

impl FrameSpectrum {
    pub(crate) fn new(image: &GrayImage) -> Self {
        let width = image.width() as usize;
        let height = image.height() as usize;

        let mut planner = FftPlanner::new();
        let mut spectrum = Self {
            width,
            height,
            row_forward: planner.plan_fft_forward(width),
            row_inverse: planner.plan_fft_inverse(width),
            col_forward: planner.plan_fft_forward(height),
            col_inverse: planner.plan_fft_inverse(height),
            data: Vec::new(),
        };

        let pixels = image
            .as_raw()
            .iter()
            .map(|&p| Complex::new(p as f64, 0.0))
            .collect();
        spectrum.data = spectrum.forward(pixels);
        spectrum
    }

    /// 행 우선 `width × height` 버퍼의 2D 순방향 변환 (결과는 전치 배치)
    fn forward(&self, mut buffer: Vec<Complex<f64>>) -> Vec<Complex<f64>> {
        process_rows(self.row_forward.as_ref(), &mut buffer, self.width);
        let mut columns = transpose(&buffer, self.height, self.width);
        process_rows(self.col_forward.as_ref(), &mut columns, self.height);
        columns
    }

    /// 평균 제거 템플릿과의 내적 `Σ I(x+i, y+j)·T(i, j)`.
    ///
    /// 결과는 `(width - tw + 1) × (height - th + 1)` 행 우선.
    /// 호출자는 템플릿이 프레임보다 크지 않음을 보장한다.
    pub(crate) fn correlate(&self, centered: &[f32], tw: usize, th: usize) -> Vec<f64> {
        let (w, h) = (self.width, self.height);

        let mut padded = vec![Complex::new(0.0, 0.0); w * h];
        for ty in 0..th {
            for tx in 0..tw {
                padded[ty * w + tx] = Complex::new(centered[ty * tw + tx] as f64, 0.0);
            }
        }
        let template = self.forward(padded);

        let mut product: Vec<Complex<f64>> = self
            .data
            .par_iter()
            .zip(template.par_iter())
            .map(|(f, t)| *f * t.conj())
            .collect();

        process_rows(self.col_inverse.as_ref(), &mut product, h);
        let mut spatial = transpose(&product, w, h);
        process_rows(self.row_inverse.as_ref(), &mut spatial, w);

        // rustfft 역변환은 정규화하지 않음
        let scale = 1.0 / (w * h) as f64;
        let out_w = w - tw + 1;
        let out_h = h - th + 1;
        let mut out = Vec::with_capacity(out_w * out_h);
        for y in 0..out_h {
            out.extend(spatial[y * w..y * w + out_w].iter().map(|c| c.re * scale));
        }
        out
    }
}

/// 길이 `len`인 각 행에 FFT 적용 (스레드별 스크래치 재사용)
fn process_rows(fft: &dyn Fft<f64>, data: &mut [Complex<f64>], len: usize) {
    let scratch_len = fft.get_inplace_scratch_len();
    data.par_chunks_mut(len).for_each_init(
        || vec![Complex::new(0.0, 0.0); scratch_len],
        |scratch, row| fft.process_with_scratch(row, scratch),
    );
}

/// `rows × cols` 행 우선 → `cols × rows` 행 우선
fn transpose(src: &[Complex<f64>], rows: usize, cols: usize) -> Vec<Complex<f64>> {
    let mut dst = vec![Complex::new(0.0, 0.0); src.len()];
    for r in 0..rows {
        for c in 0..cols {
            dst[c * rows + r] = src[r * cols + c];
        }
    }
    dst
}
