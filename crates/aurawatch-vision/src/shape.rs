//! 별 모양 마커 매칭.
//!
//! 4각/8각 두 템플릿 계열을 각각 매칭하고 히스테리시스 규칙으로
//! 하나의 결과를 고른다.
//!
//! - 4각: 흔한 모양이라 후보 박스 주변이 순수 검정인지 추가 검사.
//!   강한 후보가 검사에 연속 실패하면 잡음으로 보고 8각만 신뢰한다.
//! - 8각: 배경 검사 없이 최고 점수 위치 채택.

use std::path::Path;

use aurawatch_core::error::CoreError;
use aurawatch_core::models::detection::{ShapeKind, ShapeMatch};
use aurawatch_core::models::frame::Frame;
use aurawatch_core::models::geometry::BoundingBox;
use tracing::{debug, info};

use crate::template::{SearchFrame, Template, MATCH_THRESHOLD};

/// 4각 후보가 연속으로 이만큼 거부되면 8각만 채택
pub const NOISE_STREAK_LIMIT: u32 = 2;

/// 배경 순도 검사: 박스 모서리에서 안쪽으로 이동하는 거리
const BACKGROUND_INSET: i64 = 10;

/// 배경 순도 검사: 모든 채널이 이 값 미만이어야 함
const PURE_BLACK_THRESHOLD: u8 = 5;

const FOUR_CORNER_PREFIX: &str = "4_corner";
const EIGHT_CORNER_PREFIX: &str = "8_corner";

/// 한 계열의 매칭 결과
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FamilyScan {
    /// 계열 내 최고 신뢰도 (임계값 미만이면 0)
    pub confidence: f32,
    /// 채택된 위치
    pub bbox: Option<BoundingBox>,
}

/// 두 계열 결과와 진입 시점의 연속 거부 횟수로 최종 모양 결정
pub fn resolve(four: &FamilyScan, eight: &FamilyScan, streak: u32) -> Option<ShapeMatch> {
    let eight_match = || {
        eight.bbox.map(|bbox| ShapeMatch {
            bbox,
            kind: ShapeKind::EightCorners,
            confidence: eight.confidence,
        })
    };

    if streak >= NOISE_STREAK_LIMIT {
        if eight.confidence >= MATCH_THRESHOLD {
            return eight_match();
        }
        return None;
    }

    if eight.confidence > four.confidence && eight.confidence >= MATCH_THRESHOLD {
        return eight_match();
    }

    if four.confidence >= MATCH_THRESHOLD {
        if let Some(bbox) = four.bbox {
            return Some(ShapeMatch {
                bbox,
                kind: ShapeKind::FourCorners,
                confidence: four.confidence,
            });
        }
    }

    None
}

/// 박스 네 모서리에서 안쪽으로 이동한 점이 모두 순수 검정인지.
/// 프레임 밖 점은 실패.
pub fn is_pure_black_background(frame: &Frame, bbox: &BoundingBox) -> bool {
    let x = bbox.x as i64;
    let y = bbox.y as i64;
    let w = bbox.width as i64;
    let h = bbox.height as i64;

    let points = [
        (x - BACKGROUND_INSET, y),
        (x + w - BACKGROUND_INSET, y),
        (x, y + h - BACKGROUND_INSET),
        (x + w - BACKGROUND_INSET, y + h - BACKGROUND_INSET),
    ];

    points.iter().all(|&(px, py)| {
        if px < 0 || py < 0 || px >= frame.width() as i64 || py >= frame.height() as i64 {
            return false;
        }
        frame
            .pixel(px as u32, py as u32)
            .channels()
            .iter()
            .all(|&c| c < PURE_BLACK_THRESHOLD)
    })
}

/// 두 템플릿 계열을 보유한 모양 매처
#[derive(Debug, Clone)]
pub struct ShapeMatcher {
    four_corner: Vec<Template>,
    eight_corner: Vec<Template>,
}

impl ShapeMatcher {
    /// 계열별 템플릿으로 생성. 한 계열이라도 비어 있으면 에러.
    pub fn new(
        four_corner: Vec<Template>,
        eight_corner: Vec<Template>,
    ) -> Result<Self, CoreError> {
        if four_corner.is_empty() {
            return Err(CoreError::Template("4각 별 템플릿이 없음".to_string()));
        }
        if eight_corner.is_empty() {
            return Err(CoreError::Template("8각 별 템플릿이 없음".to_string()));
        }
        Ok(Self {
            four_corner,
            eight_corner,
        })
    }

    /// 디렉토리에서 템플릿 로드.
    ///
    /// 파일명이 `4_corner`/`8_corner`로 시작하는 PNG를 이름순으로 읽는다.
    pub fn load(dir: &Path) -> Result<Self, CoreError> {
        let entries = std::fs::read_dir(dir).map_err(|e| {
            CoreError::Template(format!("템플릿 디렉토리 읽기 실패: {}: {e}", dir.display()))
        })?;

        let mut paths: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
            })
            .collect();
        paths.sort();

        let mut four_corner = Vec::new();
        let mut eight_corner = Vec::new();
        for path in paths {
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            if stem.starts_with(FOUR_CORNER_PREFIX) {
                four_corner.push(Template::load(&path)?);
            } else if stem.starts_with(EIGHT_CORNER_PREFIX) {
                eight_corner.push(Template::load(&path)?);
            }
        }

        info!(
            "별 템플릿 로드: {} (4각 {}개, 8각 {}개)",
            dir.display(),
            four_corner.len(),
            eight_corner.len()
        );
        Self::new(four_corner, eight_corner)
    }

    pub fn four_corner_count(&self) -> usize {
        self.four_corner.len()
    }

    pub fn eight_corner_count(&self) -> usize {
        self.eight_corner.len()
    }

    /// 프레임에서 별 모양 탐지.
    ///
    /// 최종 판정은 호출 시점의 `streak` 값을 기준으로 하며,
    /// 이번 4각 검사 결과는 `streak`에 반영되어 다음 폴링부터 적용된다.
    /// 그레이스케일/적분 영상/스펙트럼은 프레임당 한 번만 만든다.
    pub fn detect(&self, frame: &Frame, streak: &mut u32) -> Option<ShapeMatch> {
        let search = SearchFrame::from_rgb(&frame.image);
        let entry_streak = *streak;

        let four = self.scan_four_corner(frame, &search, streak);
        let eight = self.scan_eight_corner(&search);
        debug!(
            "모양 매칭: 4각 {:.3} ({:?}), 8각 {:.3}, 연속 거부 {} → {}",
            four.confidence,
            four.bbox,
            eight.confidence,
            entry_streak,
            *streak
        );

        resolve(&four, &eight, entry_streak)
    }

    fn scan_four_corner(
        &self,
        frame: &Frame,
        search: &SearchFrame,
        streak: &mut u32,
    ) -> FamilyScan {
        let mut scan = FamilyScan::default();

        for template in &self.four_corner {
            let map = template.match_against(search);
            let confidence = map.confidence(MATCH_THRESHOLD);
            if confidence <= scan.confidence {
                continue;
            }
            scan.confidence = confidence;

            let verified = map.locations_at_least(MATCH_THRESHOLD).find_map(|(x, y)| {
                let bbox = BoundingBox::new(x, y, template.width(), template.height());
                is_pure_black_background(frame, &bbox).then_some(bbox)
            });

            match verified {
                Some(bbox) => {
                    *streak = 0;
                    scan.bbox = Some(bbox);
                }
                None => {
                    // 실패한 템플릿마다 누적
                    *streak += 1;
                    debug!("4각 후보 배경 검사 실패: {}", template.name());
                }
            }
        }

        scan
    }

    fn scan_eight_corner(&self, search: &SearchFrame) -> FamilyScan {
        let mut scan = FamilyScan::default();

        for template in &self.eight_corner {
            let map = template.match_against(search);
            let confidence = map.confidence(MATCH_THRESHOLD);
            if confidence <= scan.confidence {
                continue;
            }
            if let Some((_, x, y)) = map.peak() {
                scan.confidence = confidence;
                scan.bbox = Some(BoundingBox::new(x, y, template.width(), template.height()));
            }
        }

        scan
    }
}
