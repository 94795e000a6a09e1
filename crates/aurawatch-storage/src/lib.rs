//! # aurawatch-storage
//!
//! 로컬 저장소 어댑터 크레이트.
//! 탐지 프레임과 즉시 스크린샷을 PNG 파일로 저장하는 `DetectionArchive` 구현.

pub mod image_store;
