//! 번역 백엔드 / 번역기 포트.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{BackendFailure, TranslationFailure};
use crate::models::translation::TranslationUnit;

/// 백엔드 번역 결과
#[derive(Debug, Clone, PartialEq)]
pub struct BackendTranslation {
    /// 번역문
    pub text: String,
    /// 백엔드 자체 신뢰도 (0.0 ~ 1.0)
    pub confidence: f32,
}

/// 단일 티어 번역 백엔드
///
/// 구현체: `GeminiBackend`, `LibreTranslateBackend`, `OpenAiCompatBackend`
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    /// 텍스트 번역. `timeout` 안에 끝나지 않으면 `BackendFailure::Timeout`.
    ///
    /// `source_lang`이 "auto"이면 백엔드가 원문 언어를 추정한다.
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
        timeout: Duration,
    ) -> Result<BackendTranslation, BackendFailure>;

    /// 백엔드 이름 (예: "gemini", "libretranslate")
    fn name(&self) -> &str;
}

/// 번역기 — 캐시/레이트 리밋/폴백을 감싼 상위 인터페이스
///
/// 구현체: `TranslationRouter`
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<TranslationUnit, TranslationFailure>;
}
