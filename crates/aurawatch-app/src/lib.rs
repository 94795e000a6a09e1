//! # aurawatch-app
//!
//! 탐지 워커, 루프 제어기, 라이프사이클 관리.
//! 바이너리(`aurawatch`)와 통합 테스트가 함께 사용한다.

pub mod controller;
pub mod lifecycle;
pub mod worker;
