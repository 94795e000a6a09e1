//! # aurawatch-vision
//!
//! 화면 기반 오라 탐지 크레이트.
//! 대상 창 조회, 화면 캡처, 모서리 사전 필터, 별 모양 템플릿 매칭,
//! 색상 분류, 중복/쿨다운 상태를 묶어 한 번의 폴링 파이프라인을 구성한다.

pub mod capture;
pub mod color;
pub mod corners;
pub mod pipeline;
pub mod shape;
mod spectrum;
pub mod state;
pub mod template;
pub mod window;
