//! AURAWATCH 도메인 모델.
//!
//! 탐지 파이프라인 전 구간에서 공유하는 데이터 구조체를 정의한다.

pub mod aura;
pub mod detection;
pub mod frame;
pub mod geometry;
pub mod stats;
