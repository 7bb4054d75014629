//! OpenAI 호환 번역 백엔드.
//!
//! `POST {endpoint}/v1/chat/completions`. Ollama, llama.cpp 서버 등
//! 로컬 경량 모델을 대상으로 하며 키가 있으면 `Authorization: Bearer`.

use std::time::Duration;

use async_trait::async_trait;
use lingo_core::error::{BackendFailure, CoreError};
use lingo_core::ports::translation::{BackendTranslation, TranslationBackend};
use tracing::debug;

use super::{http_client, send_json, translation_instruction};

const DEFAULT_MODEL: &str = "qwen2.5:1.5b";

/// 경량 모델 기본 신뢰도
const LITE_CONFIDENCE: f32 = 0.7;

#[derive(Debug)]
pub struct OpenAiCompatBackend {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiCompatBackend {
    pub fn new(endpoint: &str, api_key: Option<String>, model: Option<&str>) -> Result<Self, CoreError> {
        Ok(Self {
            http_client: http_client()?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            model: model.unwrap_or(DEFAULT_MODEL).to_string(),
        })
    }

    fn parse_response(body: &serde_json::Value) -> Result<String, BackendFailure> {
        // choices[0].message.content
        let text = body
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|arr| arr.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|msg| msg.get("content"))
            .and_then(|t| t.as_str())
            .map(strip_quotes)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                BackendFailure::NetworkError("OpenAI 응답에서 텍스트를 찾을 수 없음".to_string())
            })?;
        Ok(text.to_string())
    }
}

/// 소형 모델이 붙이는 앞뒤 공백/따옴표 제거
fn strip_quotes(text: &str) -> &str {
    let t = text.trim();
    t.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(t)
        .trim()
}

#[async_trait]
impl TranslationBackend for OpenAiCompatBackend {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
        timeout: Duration,
    ) -> Result<BackendTranslation, BackendFailure> {
        let body = serde_json::json!({
            "model": self.model,
            "temperature": 0,
            "messages": [
                {
                    "role": "system",
                    "content": translation_instruction(source_lang, target_lang)
                },
                {
                    "role": "user",
                    "content": text
                }
            ]
        });

        debug!(model = %self.model, source_lang, target_lang, "OpenAI 호환 번역 요청");
        let mut request = self
            .http_client
            .post(format!("{}/v1/chat/completions", self.endpoint))
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }
        let response = send_json(request, timeout).await?;

        Ok(BackendTranslation {
            text: Self::parse_response(&response)?,
            confidence: LITE_CONFIDENCE,
        })
    }

    fn name(&self) -> &str {
        "openai_compat"
    }
}
