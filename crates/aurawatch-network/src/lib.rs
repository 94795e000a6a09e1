//! # aurawatch-network
//!
//! 네트워크 어댑터 크레이트.
//! 탐지/스크린샷/통계 메시지를 웹훅으로 전송하는 `AuraNotifier` 구현을 제공한다.

pub mod embed;
pub mod webhook;
