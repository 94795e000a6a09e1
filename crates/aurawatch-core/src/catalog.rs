//! 오라 카탈로그.
//!
//! 티어 버킷 → 오라 이름 → 프로파일 JSON 파일을 로드하고,
//! 모양 계열별 탐색 버킷을 로드 시점에 한 번만 계산해 둔다.

use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::CoreError;
use crate::models::aura::{AuraEntry, AuraProfile};
use crate::models::detection::ShapeKind;

/// 4각 별 계열이 사용하는 티어
pub const FOUR_CORNER_TIER: &str = "10k+";

/// 8각 별 계열이 병합해서 사용하는 티어 (뒤 티어가 같은 이름을 덮어씀)
pub const EIGHT_CORNER_TIERS: [&str; 3] = ["1m+", "10m+", "100m+"];

/// 티어 버킷 (파일 순서 유지)
#[derive(Debug, Clone, PartialEq)]
pub struct Tier {
    pub name: String,
    pub profiles: Vec<AuraProfile>,
}

/// 로드 완료된 읽기 전용 카탈로그
#[derive(Debug, Clone, Default)]
pub struct AuraCatalog {
    tiers: Vec<Tier>,
    four_corner: Vec<AuraProfile>,
    eight_corner: Vec<AuraProfile>,
}

impl AuraCatalog {
    /// 파일에서 카탈로그 로드. 파일 누락/형식 오류는 에러.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CoreError::Config(format!("카탈로그 파일 읽기 실패: {}: {}", path.display(), e))
        })?;

        let catalog = Self::from_json(&content)?;
        info!(
            "카탈로그 로드: {} ({}개 티어, 4각 {}개, 8각 {}개)",
            path.display(),
            catalog.tiers.len(),
            catalog.four_corner.len(),
            catalog.eight_corner.len()
        );
        Ok(catalog)
    }

    /// JSON 문자열에서 카탈로그 파싱
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let root: Map<String, Value> = serde_json::from_str(json)?;

        let mut tiers = Vec::with_capacity(root.len());
        for (tier_name, tier_value) in root {
            let entries: Map<String, Value> = serde_json::from_value(tier_value)?;
            let mut profiles = Vec::with_capacity(entries.len());
            for (aura_name, entry_value) in entries {
                let entry: AuraEntry = serde_json::from_value(entry_value)?;
                profiles.push(AuraProfile::from_entry(aura_name, entry));
            }
            tiers.push(Tier {
                name: tier_name,
                profiles,
            });
        }

        Self::from_tiers(tiers)
    }

    /// 티어 목록에서 카탈로그 구성 (검증 + 버킷 계산)
    pub fn from_tiers(tiers: Vec<Tier>) -> Result<Self, CoreError> {
        for tier in &tiers {
            for profile in &tier.profiles {
                validate_profile(&tier.name, profile)?;
            }
        }

        let four_corner = tiers
            .iter()
            .find(|t| t.name == FOUR_CORNER_TIER)
            .map(|t| t.profiles.clone())
            .unwrap_or_default();

        let mut eight_corner: Vec<AuraProfile> = Vec::new();
        for tier_name in EIGHT_CORNER_TIERS {
            let Some(tier) = tiers.iter().find(|t| t.name == tier_name) else {
                debug!("8각 티어 없음: {tier_name}");
                continue;
            };
            for profile in &tier.profiles {
                // 같은 이름은 원래 위치에서 값만 교체
                match eight_corner.iter_mut().find(|p| p.name == profile.name) {
                    Some(existing) => *existing = profile.clone(),
                    None => eight_corner.push(profile.clone()),
                }
            }
        }

        Ok(Self {
            tiers,
            four_corner,
            eight_corner,
        })
    }

    /// 모양 계열에 대응하는 탐색 버킷
    pub fn bucket(&self, kind: ShapeKind) -> &[AuraProfile] {
        match kind {
            ShapeKind::FourCorners => &self.four_corner,
            ShapeKind::EightCorners => &self.eight_corner,
        }
    }

    /// 전체 프로파일 수 (모든 티어 합)
    pub fn len(&self) -> usize {
        self.tiers.iter().map(|t| t.profiles.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn validate_profile(tier: &str, profile: &AuraProfile) -> Result<(), CoreError> {
    if profile.name.is_empty() {
        return Err(CoreError::Validation {
            field: format!("{tier}.<name>"),
            message: "오라 이름이 비어 있음".to_string(),
        });
    }
    if !profile.tolerance.is_finite() || profile.tolerance < 0.0 {
        return Err(CoreError::Validation {
            field: format!("{tier}.{}.tolerance", profile.name),
            message: format!("허용치는 0 이상의 유한한 값이어야 함: {}", profile.tolerance),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::aura::Rgb;

    const SAMPLE: &str = r#"{
        "10k+": {
            "Glock": {"color": [100, 200, 50], "tolerance": 30, "rarity": 17000}
        },
        "1m+": {
            "Example": {"color": [91, 78, 159], "tolerance": 40, "rarity": 100000},
            "Shared": {"color": [1, 1, 1], "tolerance": 10, "rarity": 1000000}
        },
        "10m+": {
            "Deep": {"color": [10, 20, 30], "tolerance": 25, "rarity": 10000000, "image": "https://example.com/deep.png"}
        },
        "100m+": {
            "Shared": {"color": [2, 2, 2], "tolerance": 10, "rarity": 100000000}
        },
        "special": {
            "Unused": {"color": [0, 0, 0], "tolerance": 5, "rarity": 1}
        }
    }"#;

    #[test]
    fn four_corner_bucket_is_low_tier_only() {
        let catalog = AuraCatalog::from_json(SAMPLE).unwrap();
        let bucket = catalog.bucket(ShapeKind::FourCorners);
        assert_eq!(bucket.len(), 1);
        assert_eq!(bucket[0].name, "Glock");
    }

    #[test]
    fn eight_corner_bucket_merges_high_tiers_in_order() {
        let catalog = AuraCatalog::from_json(SAMPLE).unwrap();
        let names: Vec<&str> = catalog
            .bucket(ShapeKind::EightCorners)
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        // 덮어쓴 항목은 처음 등장 위치 유지
        assert_eq!(names, vec!["Example", "Shared", "Deep"]);

        let shared = &catalog.bucket(ShapeKind::EightCorners)[1];
        assert_eq!(shared.color, Rgb::new(2, 2, 2));
        assert_eq!(shared.rarity, 100_000_000);
    }

    #[test]
    fn unselected_tiers_are_kept_but_not_bucketed() {
        let catalog = AuraCatalog::from_json(SAMPLE).unwrap();
        assert_eq!(catalog.len(), 6);
    }

    #[test]
    fn missing_tiers_yield_empty_buckets() {
        let catalog = AuraCatalog::from_json(r#"{"1m+": {}}"#).unwrap();
        assert!(catalog.bucket(ShapeKind::FourCorners).is_empty());
        assert!(catalog.bucket(ShapeKind::EightCorners).is_empty());
        assert!(catalog.is_empty());
    }

    #[test]
    fn malformed_json_is_error() {
        assert!(AuraCatalog::from_json("{not json").is_err());
        assert!(AuraCatalog::from_json(r#"{"10k+": {"A": {"color": [1,2]}}}"#).is_err());
    }

    #[test]
    fn negative_tolerance_is_validation_error() {
        let err = AuraCatalog::from_json(
            r#"{"10k+": {"A": {"color": [1,2,3], "tolerance": -1, "rarity": 1}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
    }

    #[test]
    fn load_missing_file_is_config_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = AuraCatalog::load(&dir.path().join("auras.json")).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("auras.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let catalog = AuraCatalog::load(&path).unwrap();
        assert_eq!(catalog.bucket(ShapeKind::EightCorners).len(), 3);
    }
}
