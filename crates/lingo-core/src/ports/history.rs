//! 번역 기록 수집 포트.

use crate::models::translation::TranslationUnit;

/// 번역 완료 관찰자 — fire-and-forget
///
/// 캐시에서 나온 결과는 통지하지 않는다. 구현체는 블로킹하면 안 된다.
pub trait TranslationObserver: Send + Sync {
    fn on_translation_completed(&self, unit: &TranslationUnit);
}
