//! 탐지 이미지 저장 포트.
//!
//! 구현: `aurawatch-storage` crate (image + tokio::fs)

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::detection::ShapeKind;
use crate::models::frame::Frame;

/// 탐지 프레임 저장소
#[async_trait]
pub trait DetectionArchive: Send + Sync {
    /// `{오라 이름}_{모양}.png`로 저장 (같은 이름은 덮어씀). 저장 경로 반환.
    async fn save_detection(
        &self,
        frame: &Frame,
        aura_name: &str,
        kind: ShapeKind,
    ) -> Result<PathBuf, CoreError>;

    /// 즉시 스크린샷 저장 (`current_screen.png`)
    async fn save_screenshot(&self, frame: &Frame) -> Result<PathBuf, CoreError>;
}
