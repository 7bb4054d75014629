//! Google Gemini 번역 백엔드.
//!
//! `POST {endpoint}/v1beta/models/{model}:generateContent`, 키는
//! `x-goog-api-key` 헤더. 무료 할당량이 작아 라우터 쪽에서 호출 간격을 둔다.

use std::time::Duration;

use async_trait::async_trait;
use lingo_core::error::{BackendFailure, CoreError};
use lingo_core::ports::translation::{BackendTranslation, TranslationBackend};
use tracing::debug;

use super::{http_client, send_json, translation_instruction};

const DEFAULT_MODEL: &str = "gemini-2.0-flash-lite";

/// Gemini 응답에는 점수가 없어 고정값을 쓴다
const GEMINI_CONFIDENCE: f32 = 0.95;

#[derive(Debug)]
pub struct GeminiBackend {
    http_client: reqwest::Client,
    endpoint: String,
    /// API 키 (메모리에만 유지)
    api_key: String,
    model: String,
}

impl GeminiBackend {
    pub fn new(endpoint: &str, api_key: String, model: Option<&str>) -> Result<Self, CoreError> {
        if api_key.trim().is_empty() {
            return Err(CoreError::Config(format!(
                "Gemini API 키 미설정. 설정 파일 또는 {} 환경 변수를 지정하세요.",
                lingo_core::config::GEMINI_API_KEY_ENV
            )));
        }
        Ok(Self {
            http_client: http_client()?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            model: model.unwrap_or(DEFAULT_MODEL).to_string(),
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.model
        )
    }

    fn parse_response(body: &serde_json::Value) -> Result<String, BackendFailure> {
        if let Some(reason) = body
            .get("promptFeedback")
            .and_then(|f| f.get("blockReason"))
            .and_then(|r| r.as_str())
        {
            return Err(BackendFailure::Unsupported(format!("차단된 요청: {reason}")));
        }

        // candidates[0].content.parts[*].text
        let text: String = body
            .get("candidates")
            .and_then(|c| c.as_array())
            .and_then(|arr| arr.first())
            .and_then(|c| c.get("content"))
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.as_array())
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                    .collect()
            })
            .unwrap_or_default();

        let text = text.trim();
        if text.is_empty() {
            return Err(BackendFailure::NetworkError(
                "Gemini 응답에서 텍스트를 찾을 수 없음".to_string(),
            ));
        }
        Ok(text.to_string())
    }
}

#[async_trait]
impl TranslationBackend for GeminiBackend {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
        timeout: Duration,
    ) -> Result<BackendTranslation, BackendFailure> {
        let prompt = format!(
            "{}\n\n{}",
            translation_instruction(source_lang, target_lang),
            text
        );
        let body = serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": { "temperature": 0.1 }
        });

        debug!(model = %self.model, source_lang, target_lang, "Gemini 번역 요청");
        let request = self
            .http_client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body);
        let response = send_json(request, timeout).await?;

        Ok(BackendTranslation {
            text: Self::parse_response(&response)?,
            confidence: GEMINI_CONFIDENCE,
        })
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
