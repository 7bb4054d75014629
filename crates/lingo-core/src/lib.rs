//! # lingo-core
//!
//! lingo 도메인 모델, 포트(trait) 정의, 에러 타입.
//! 모든 크레이트가 공유하는 핵심 타입과 인터페이스를 제공한다.
//!
//! ## 구조
//!
//! - [`models`] — 도메인 데이터 구조체 (프레임, 텍스트 영역, 번역 단위, 오버레이 박스)
//! - [`ports`] — Hexagonal Architecture 포트 인터페이스 (async_trait)
//! - [`error`] — 에러 분류 체계 (thiserror)
//! - [`config`] — 애플리케이션 설정 구조체
//! - [`config_store`] — 설정 파일 저장소 (로드/원자적 저장)

pub mod config;
pub mod config_store;
pub mod error;
pub mod models;
pub mod ports;

#[cfg(test)]
mod tests {
    use crate::models::translation::{TierId, TranslationUnit};
    use std::time::Duration;

    #[test]
    fn translation_unit_serde_roundtrip() {
        let unit = TranslationUnit {
            source_text: "Hello".to_string(),
            target_text: "Xin chào".to_string(),
            source_lang: "en".to_string(),
            target_lang: "vi".to_string(),
            backend_tier_used: TierId::Cloud,
            confidence: 0.95,
            latency: Duration::from_millis(420),
        };

        let json = serde_json::to_string(&unit).unwrap();
        assert!(json.contains("\"cloud\""));
        let deserialized: TranslationUnit = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.target_text, "Xin chào");
        assert_eq!(deserialized.backend_tier_used, TierId::Cloud);
        assert_eq!(deserialized.latency, Duration::from_millis(420));
    }

    #[test]
    fn tier_ordering_follows_quality_rank() {
        assert!(TierId::Cloud.rank() < TierId::LocalLarge.rank());
        assert!(TierId::LocalLarge.rank() < TierId::LocalLite.rank());
    }

    #[test]
    fn config_defaults() {
        let config = crate::config::AppConfig::default_config();
        assert_eq!(config.pipeline.poll_interval_ms, 66);
        assert_eq!(config.pipeline.change_threshold, 5);
        assert_eq!(config.pipeline.hash_size, 8);
        assert_eq!(config.translation.cache_capacity, 512);
        assert_eq!(config.translation.tiers.len(), 3);
        assert!(!config.translation.quality_matrix.is_empty());
    }
}
