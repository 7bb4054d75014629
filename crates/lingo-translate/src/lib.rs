//! # lingo-translate
//!
//! 번역 라우터 크레이트.
//! 언어 쌍별 품질 매트릭스에 따라 번역 티어를 순서대로 시도하고,
//! 공유 LRU 캐시와 티어별 레이트 리미터를 적용한다.
//!
//! - [`router`] — `TranslationRouter` (Translator 포트 구현)
//! - [`cache`] — `(text, source_lang, target_lang)` 키 LRU 캐시
//! - [`rate_limiter`] — 티어별 최소 호출 간격 + 429 쿨다운
//! - [`quality_matrix`] — 언어 쌍 → 티어 순서 (순수 데이터)
//! - [`detect`] — 원문 언어 자동 감지 (whatlang)
//! - [`backends`] — reqwest 기반 HTTP 백엔드 (Gemini, LibreTranslate, OpenAI 호환)

pub mod backends;
pub mod cache;
pub mod detect;
pub mod quality_matrix;
pub mod rate_limiter;
pub mod router;

pub use router::{RouterStats, TierPolicy, TierStats, TranslationRouter};
