//! 탐지 결과 모델.
//!
//! 모양 매칭 결과, 확정된 오라 탐지, 알림 전송 결과를 정의.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::aura::{AuraProfile, Rgb};
use super::geometry::BoundingBox;

/// 별 모양 마커 계열
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    /// 4각 별: 흔함, 배경 순도 검사 필요
    #[serde(rename = "4_corners")]
    FourCorners,
    /// 8각 별: 희귀 티어
    #[serde(rename = "8_corners")]
    EightCorners,
}

impl ShapeKind {
    /// 파일명/로그용 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeKind::FourCorners => "4_corners",
            ShapeKind::EightCorners => "8_corners",
        }
    }
}

impl std::fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 채택된 모양 매칭 결과
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeMatch {
    /// 매칭 위치 (프레임 픽셀 좌표)
    pub bbox: BoundingBox,
    /// 모양 계열
    pub kind: ShapeKind,
    /// 정규화 상호상관 점수 (0.0 ~ 1.0)
    pub confidence: f32,
}

/// 확정된 오라 탐지 (알림 대상)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    /// 매칭된 카탈로그 프로파일
    pub profile: AuraProfile,
    /// 매칭된 모양 계열
    pub shape: ShapeKind,
    /// 중심부 평균 색상
    pub sample: Rgb,
    /// HSV 거리
    pub distance: f64,
    /// 탐지 시각
    pub detected_at: DateTime<Utc>,
}

/// 알림 전송 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    /// 전송 성공 (200/204)
    Delivered { status: u16 },
    /// 정책에 의해 전송 생략 (URL 미설정, 희귀도 미달 등)
    Skipped { reason: String },
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }
}
