//! HTTP 번역 백엔드.
//!
//! - [`gemini`] — Google Gemini `generateContent` (cloud 티어)
//! - [`libretranslate`] — LibreTranslate 호환 `/translate` (로컬 서버 티어)
//! - [`openai_compat`] — OpenAI 호환 `/v1/chat/completions` (Ollama 등, lite 티어)
//!
//! 상태 코드 분류: 429 → RateLimited (`Retry-After` 반영), 401/403 → 인증 에러,
//! 400/422 → Unsupported, 타임아웃 → Timeout, 나머지 → NetworkError.

pub mod gemini;
pub mod libretranslate;
pub mod openai_compat;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use lingo_core::config::{BackendKind, TierConfig, TranslationConfig};
use lingo_core::error::{BackendFailure, CoreError};
use lingo_core::models::translation::TierId;
use lingo_core::ports::translation::TranslationBackend;
use reqwest::header::RETRY_AFTER;
use reqwest::{RequestBuilder, StatusCode};
use tracing::{debug, warn};

pub use gemini::GeminiBackend;
pub use libretranslate::LibreTranslateBackend;
pub use openai_compat::OpenAiCompatBackend;

/// 설정의 활성 티어마다 백엔드 생성
///
/// 생성에 실패한 티어(API 키 없음 등)는 경고 후 제외한다.
pub fn build_backends(config: &TranslationConfig) -> HashMap<TierId, Arc<dyn TranslationBackend>> {
    let mut backends: HashMap<TierId, Arc<dyn TranslationBackend>> = HashMap::new();
    for tier in config.tiers.iter().filter(|t| t.enabled) {
        match build_backend(tier) {
            Ok(backend) => {
                debug!(tier = %tier.id, backend = backend.name(), "번역 백엔드 생성");
                backends.insert(tier.id, backend);
            }
            Err(e) => warn!(tier = %tier.id, "번역 백엔드 생성 실패 — 티어 비활성: {e}"),
        }
    }
    backends
}

fn build_backend(tier: &TierConfig) -> Result<Arc<dyn TranslationBackend>, CoreError> {
    let api_key = tier.resolved_api_key();
    Ok(match tier.backend {
        BackendKind::Gemini => Arc::new(GeminiBackend::new(
            &tier.endpoint,
            api_key.unwrap_or_default(),
            tier.model.as_deref(),
        )?),
        BackendKind::LibreTranslate => {
            Arc::new(LibreTranslateBackend::new(&tier.endpoint, api_key)?)
        }
        BackendKind::OpenAiCompat => Arc::new(OpenAiCompatBackend::new(
            &tier.endpoint,
            api_key,
            tier.model.as_deref(),
        )?),
    })
}

/// 공용 HTTP 클라이언트 (요청별 타임아웃은 호출 시 지정)
pub(crate) fn http_client() -> Result<reqwest::Client, CoreError> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .build()
        .map_err(|e| CoreError::Config(format!("HTTP 클라이언트 생성 실패: {e}")))
}

/// 요청 전송 + 상태 분류 + JSON 파싱
pub(crate) async fn send_json(
    request: RequestBuilder,
    timeout: Duration,
) -> Result<serde_json::Value, BackendFailure> {
    let response = request
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| classify_error(&e, timeout))?;

    let status = response.status();
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_retry_after);
    let body = response
        .text()
        .await
        .map_err(|e| classify_error(&e, timeout))?;

    if !status.is_success() {
        return Err(classify_status(status, retry_after, &body));
    }

    serde_json::from_str(&body)
        .map_err(|e| BackendFailure::NetworkError(format!("응답 JSON 파싱 실패: {e}")))
}

pub(crate) fn classify_error(e: &reqwest::Error, timeout: Duration) -> BackendFailure {
    if e.is_timeout() {
        BackendFailure::Timeout(timeout)
    } else {
        BackendFailure::NetworkError(e.to_string())
    }
}

pub(crate) fn classify_status(
    status: StatusCode,
    retry_after: Option<Duration>,
    body: &str,
) -> BackendFailure {
    let snippet: String = body.chars().take(200).collect();
    match status.as_u16() {
        429 => BackendFailure::RateLimited { retry_after },
        401 | 403 => BackendFailure::NetworkError(format!("인증 실패 ({status})")),
        400 | 422 => BackendFailure::Unsupported(format!("({status}) {snippet}")),
        _ => BackendFailure::NetworkError(format!("API 오류 ({status}): {snippet}")),
    }
}

/// `Retry-After` 초 단위 값만 해석 (HTTP 날짜 형식은 무시)
fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// 프롬프트용 언어 이름
pub(crate) fn language_name(code: &str) -> &str {
    match code {
        "en" => "English",
        "vi" => "Vietnamese",
        "zh" => "Chinese",
        "ja" => "Japanese",
        "ko" => "Korean",
        "fr" => "French",
        "de" => "German",
        "es" => "Spanish",
        "ru" => "Russian",
        "pt" => "Portuguese",
        "it" => "Italian",
        "th" => "Thai",
        other => other,
    }
}

/// LLM형 백엔드 공용 번역 지시문
pub(crate) fn translation_instruction(source_lang: &str, target_lang: &str) -> String {
    let target = language_name(target_lang);
    if source_lang == lingo_core::models::translation::AUTO_LANG {
        format!(
            "Translate the following text to {target}. \
             Maintain the original meaning and context. Return only the translation."
        )
    } else {
        format!(
            "Translate the following text from {} to {target}. \
             Maintain the original meaning and context. Return only the translation.",
            language_name(source_lang)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert_eq!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, Some(Duration::from_secs(7)), ""),
            BackendFailure::RateLimited {
                retry_after: Some(Duration::from_secs(7))
            }
        );
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, None, ""),
            BackendFailure::NetworkError(msg) if msg.contains("인증")
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_REQUEST, None, "bad lang"),
            BackendFailure::Unsupported(msg) if msg.contains("bad lang")
        ));
        assert!(matches!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR, None, ""),
            BackendFailure::NetworkError(_)
        ));
    }

    #[test]
    fn retry_after_seconds() {
        assert_eq!(parse_retry_after("30"), Some(Duration::from_secs(30)));
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    }

    #[test]
    fn instruction_mentions_languages() {
        let auto = translation_instruction("auto", "vi");
        assert!(auto.contains("to Vietnamese"));
        assert!(!auto.contains("from"));
        let fixed = translation_instruction("ja", "en");
        assert!(fixed.contains("from Japanese to English"));
    }

    #[test]
    fn gemini_tier_without_key_is_skipped() {
        let mut config = TranslationConfig::default();
        for tier in &mut config.tiers {
            tier.api_key.clear();
        }
        // Gemini 키가 환경에도 없으면 cloud 티어만 빠진다
        if std::env::var(lingo_core::config::GEMINI_API_KEY_ENV).is_err() {
            let backends = build_backends(&config);
            assert!(!backends.contains_key(&TierId::Cloud));
            assert!(backends.contains_key(&TierId::LocalLarge));
            assert!(backends.contains_key(&TierId::LocalLite));
        }
    }

    #[test]
    fn disabled_tier_is_not_built() {
        let mut config = TranslationConfig::default();
        for tier in &mut config.tiers {
            tier.enabled = tier.id == TierId::LocalLite;
        }
        let backends = build_backends(&config);
        assert_eq!(backends.len(), 1);
        assert!(backends.contains_key(&TierId::LocalLite));
    }
}
