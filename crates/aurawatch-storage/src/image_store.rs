//! 탐지 이미지 파일 저장소.
//!
//! 출력 디렉토리에 `{오라 이름}_{모양}.png`로 저장한다.
//! 같은 이름의 파일은 경고 없이 덮어쓴다.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use aurawatch_core::error::CoreError;
use aurawatch_core::models::detection::ShapeKind;
use aurawatch_core::models::frame::Frame;
use aurawatch_core::ports::archive::DetectionArchive;
use image::{ImageFormat, RgbImage};
use tokio::fs;
use tracing::{debug, info};

/// 즉시 스크린샷 파일 이름
pub const SCREENSHOT_FILE_NAME: &str = "current_screen.png";

/// PNG 이미지 저장소
pub struct PngImageStore {
    output_dir: PathBuf,
}

impl PngImageStore {
    /// 새 저장소 생성 (출력 디렉토리 생성)
    pub async fn new(output_dir: PathBuf) -> Result<Self, CoreError> {
        fs::create_dir_all(&output_dir)
            .await
            .map_err(|e| CoreError::Internal(format!("출력 디렉토리 생성 실패: {e}")))?;

        info!("이미지 저장소 초기화: {}", output_dir.display());
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// 탐지 이미지 파일 경로
    pub fn detection_path(&self, aura_name: &str, kind: ShapeKind) -> PathBuf {
        self.output_dir
            .join(format!("{}_{}.png", file_safe(aura_name), kind.as_str()))
    }

    async fn write_png(&self, image: &RgbImage, path: PathBuf) -> Result<PathBuf, CoreError> {
        let image = image.clone();
        let bytes = tokio::task::spawn_blocking(move || encode_png(&image))
            .await
            .map_err(|e| CoreError::Internal(format!("PNG 인코딩 작업 실패: {e}")))??;

        fs::write(&path, &bytes)
            .await
            .map_err(|e| CoreError::Internal(format!("이미지 파일 저장 실패: {e}")))?;

        debug!("이미지 저장: {} ({}bytes)", path.display(), bytes.len());
        Ok(path)
    }
}

fn encode_png(image: &RgbImage) -> Result<Vec<u8>, CoreError> {
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| CoreError::Internal(format!("PNG 인코딩 실패: {e}")))?;
    Ok(buf.into_inner())
}

/// 경로 구분자는 파일명에 쓸 수 없으므로 치환
fn file_safe(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c => c,
        })
        .collect()
}

#[async_trait]
impl DetectionArchive for PngImageStore {
    async fn save_detection(
        &self,
        frame: &Frame,
        aura_name: &str,
        kind: ShapeKind,
    ) -> Result<PathBuf, CoreError> {
        let path = self.detection_path(aura_name, kind);
        let saved = self.write_png(&frame.image, path).await?;
        info!("탐지 이미지 저장: {}", saved.display());
        Ok(saved)
    }

    async fn save_screenshot(&self, frame: &Frame) -> Result<PathBuf, CoreError> {
        let path = self.output_dir.join(SCREENSHOT_FILE_NAME);
        self.write_png(&frame.image, path).await
    }
}
