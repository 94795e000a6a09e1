//! 오라 프로파일 모델.
//!
//! 카탈로그 파일에서 로드되며 로드 이후에는 변경되지 않는다.

use serde::{Deserialize, Serialize};

/// RGB 색상 (카탈로그 파일에서는 `[r, g, b]` 배열)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// 채널 배열
    pub fn channels(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// 24비트 정수로 패킹 (`0xRRGGBB`): 임베드 강조색
    pub fn to_u24(&self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(c: [u8; 3]) -> Self {
        Self::new(c[0], c[1], c[2])
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(c: Rgb) -> Self {
        c.channels()
    }
}

/// 카탈로그 파일의 개별 항목 (이름은 상위 맵의 키)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuraEntry {
    pub color: Rgb,
    pub tolerance: f64,
    #[serde(default)]
    pub rarity: u64,
    #[serde(default)]
    pub image: Option<String>,
}

/// 오라 프로파일
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuraProfile {
    /// 오라 이름 (티어 버킷 내 고유)
    pub name: String,
    /// 기준 색상
    pub color: Rgb,
    /// RGB/HSV 거리 허용치
    pub tolerance: f64,
    /// 희귀도 (1/N의 N)
    pub rarity: u64,
    /// 대형 이미지 URL (알림용)
    pub image: Option<String>,
}

impl AuraProfile {
    pub fn from_entry(name: impl Into<String>, entry: AuraEntry) -> Self {
        Self {
            name: name.into(),
            color: entry.color,
            tolerance: entry.tolerance,
            rarity: entry.rarity,
            image: entry.image,
        }
    }
}
