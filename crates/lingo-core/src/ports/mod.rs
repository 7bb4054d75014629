//! 포트 인터페이스.
//!
//! 파이프라인 구성요소 사이의 경계를 trait으로 정의한다.
//! 어댑터(xcap 캡처, Tesseract, HTTP 번역 백엔드, 오버레이 표면)는
//! 각 구현 크레이트에 있고, 테스트는 가짜 구현을 주입한다.

pub mod capture;
pub mod history;
pub mod overlay;
pub mod text_extractor;
pub mod translation;
