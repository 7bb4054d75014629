//! LibreTranslate 호환 번역 백엔드.
//!
//! `POST {endpoint}/translate` `{ q, source, target, format }`.
//! 로컬에서 NLLB/Argos 모델을 서빙하는 서버를 대상으로 한다.

use std::time::Duration;

use async_trait::async_trait;
use lingo_core::error::{BackendFailure, CoreError};
use lingo_core::ports::translation::{BackendTranslation, TranslationBackend};
use tracing::debug;

use super::{http_client, send_json};

/// 언어 감지 점수가 없을 때 쓰는 신뢰도
const DEFAULT_CONFIDENCE: f32 = 0.85;

#[derive(Debug)]
pub struct LibreTranslateBackend {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl LibreTranslateBackend {
    pub fn new(endpoint: &str, api_key: Option<String>) -> Result<Self, CoreError> {
        Ok(Self {
            http_client: http_client()?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn parse_response(body: &serde_json::Value) -> Result<BackendTranslation, BackendFailure> {
        let text = body
            .get("translatedText")
            .and_then(|t| t.as_str())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                BackendFailure::NetworkError("translatedText 필드 없음".to_string())
            })?;

        // source=auto일 때만 detectedLanguage.confidence (0~100)가 온다
        let confidence = body
            .get("detectedLanguage")
            .and_then(|d| d.get("confidence"))
            .and_then(|c| c.as_f64())
            .map(|c| (c / 100.0) as f32)
            .unwrap_or(DEFAULT_CONFIDENCE);

        Ok(BackendTranslation {
            text: text.to_string(),
            confidence,
        })
    }
}

#[async_trait]
impl TranslationBackend for LibreTranslateBackend {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
        timeout: Duration,
    ) -> Result<BackendTranslation, BackendFailure> {
        let mut body = serde_json::json!({
            "q": text,
            "source": source_lang,
            "target": target_lang,
            "format": "text",
        });
        if let Some(key) = &self.api_key {
            body["api_key"] = serde_json::Value::String(key.clone());
        }

        debug!(source_lang, target_lang, "LibreTranslate 번역 요청");
        let request = self
            .http_client
            .post(format!("{}/translate", self.endpoint))
            .json(&body);
        let response = send_json(request, timeout).await?;
        Self::parse_response(&response)
    }

    fn name(&self) -> &str {
        "libretranslate"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use mockito::Matcher;

    #[tokio::test]
    async fn translate_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/translate")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "q": "Start game",
                "source": "en",
                "target": "vi"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"translatedText":"Bắt đầu trò chơi"}"#)
            .create_async()
            .await;

        let backend = LibreTranslateBackend::new(&server.url(), None).unwrap();
        let result = backend
            .translate("Start game", "en", "vi", Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(result.text, "Bắt đầu trò chơi");
        assert_eq!(result.confidence, DEFAULT_CONFIDENCE);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn detected_language_confidence_is_used() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/translate")
            .with_status(200)
            .with_body(
                r#"{"translatedText":"Xin chào","detectedLanguage":{"confidence":64.0,"language":"en"}}"#,
            )
            .create_async()
            .await;

        let backend = LibreTranslateBackend::new(&server.url(), Some("k".into())).unwrap();
        let result = backend
            .translate("Hello", "auto", "vi", Duration::from_secs(5))
            .await
            .unwrap();
        assert!((result.confidence - 0.64).abs() < 1e-6);
    }

    #[tokio::test]
    async fn unsupported_pair() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/translate")
            .with_status(400)
            .with_body(r#"{"error":"xx is not supported"}"#)
            .create_async()
            .await;

        let backend = LibreTranslateBackend::new(&server.url(), None).unwrap();
        let err = backend
            .translate("Hello", "xx", "vi", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_matches!(err, BackendFailure::Unsupported(msg) if msg.contains("not supported"));
    }

    #[tokio::test]
    async fn empty_translation_is_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/translate")
            .with_status(200)
            .with_body(r#"{"translatedText":"  "}"#)
            .create_async()
            .await;

        let backend = LibreTranslateBackend::new(&server.url(), None).unwrap();
        let err = backend
            .translate("Hello", "en", "vi", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_matches!(err, BackendFailure::NetworkError(_));
    }
}
