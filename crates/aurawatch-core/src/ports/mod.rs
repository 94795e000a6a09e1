//! 포트 인터페이스 (trait).
//!
//! Hexagonal Architecture의 포트 레이어.
//! 각 어댑터 crate가 이 trait들을 구현하며,
//! `aurawatch-app`에서 `Arc<dyn T>`로 와이어링한다.
//!
//! 캡처/창 조회는 폴링 한 번 안에서 동기적으로 호출되므로 동기 trait,
//! 네트워크/파일 I/O는 `async_trait`을 사용한다.

pub mod archive;
pub mod capture;
pub mod control;
pub mod notifier;
pub mod window;
