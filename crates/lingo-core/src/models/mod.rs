//! lingo 도메인 모델.
//!
//! 캡처 → 변경 감지 → 추출 → 번역 → 렌더 파이프라인이 주고받는
//! 핵심 데이터 구조체를 정의한다.

pub mod capture;
pub mod geometry;
pub mod overlay;
pub mod text;
pub mod translation;
