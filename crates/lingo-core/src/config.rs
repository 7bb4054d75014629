//! 애플리케이션 설정 구조체.
//!
//! 폴링 주기, 변경 감지 임계값, 캡처 폴백 체인, 번역 티어/품질 매트릭스,
//! 오버레이 표시 설정을 정의한다. `ConfigStore`가 JSON 파일로 로드/저장한다.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::CoreError;
use crate::models::capture::CaptureMethod;
use crate::models::translation::{TierId, AUTO_LANG};

/// Gemini API 키 환경 변수
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 파이프라인 설정
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// 캡처 설정
    #[serde(default)]
    pub capture: CaptureConfig,
    /// 번역 설정
    #[serde(default)]
    pub translation: TranslationConfig,
    /// 오버레이 설정
    #[serde(default)]
    pub overlay: OverlayConfig,
    /// OCR 설정
    #[serde(default)]
    pub ocr: OcrConfig,
}

// ============================================================
// 파이프라인 설정
// ============================================================

/// 파이프라인 설정 — 폴링/렌더 주기와 변경 감지
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// 캡처 폴링 주기 (ms, 기본 66 ≈ 15Hz)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// 오버레이 위치 추적 주기 (ms)
    #[serde(default = "default_render_interval_ms")]
    pub render_interval_ms: u64,
    /// 변경 판정 해밍 거리 임계값 (거리 > 임계값이면 변경)
    #[serde(default = "default_change_threshold")]
    pub change_threshold: u32,
    /// dHash 크기 N (지문 N×N 비트)
    #[serde(default = "default_hash_size")]
    pub hash_size: u32,
    /// 텍스트 추출 타임아웃 (ms)
    #[serde(default = "default_extraction_timeout_ms")]
    pub extraction_timeout_ms: u64,
    /// 번역 대상으로 삼을 최소 OCR 신뢰도
    #[serde(default = "default_min_text_confidence")]
    pub min_text_confidence: f32,
    /// 실패한 사이클 재시도 첫 대기 (ms, 이후 두 배씩)
    #[serde(default = "default_retry_initial_ms")]
    pub retry_initial_ms: u64,
    /// 재시도 대기 상한 (ms)
    #[serde(default = "default_retry_max_ms")]
    pub retry_max_ms: u64,
    /// 같은 화면에 대한 최대 재시도 횟수
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            render_interval_ms: default_render_interval_ms(),
            change_threshold: default_change_threshold(),
            hash_size: default_hash_size(),
            extraction_timeout_ms: default_extraction_timeout_ms(),
            min_text_confidence: default_min_text_confidence(),
            retry_initial_ms: default_retry_initial_ms(),
            retry_max_ms: default_retry_max_ms(),
            max_retries: default_max_retries(),
        }
    }
}

// ============================================================
// 캡처 설정
// ============================================================

/// 캡처 설정 — 폴백 체인과 빈 이미지 판정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// 시도 순서
    #[serde(default = "CaptureMethod::default_chain")]
    pub methods: Vec<CaptureMethod>,
    /// 평균 휘도가 이 값 미만이면 검은(사용 불가) 이미지로 판정
    #[serde(default = "default_blank_threshold")]
    pub blank_threshold: u8,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            methods: CaptureMethod::default_chain(),
            blank_threshold: default_blank_threshold(),
        }
    }
}

// ============================================================
// 번역 설정
// ============================================================

/// 번역 백엔드 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Google Gemini `generateContent`
    Gemini,
    /// LibreTranslate 호환 `/translate`
    LibreTranslate,
    /// OpenAI 호환 `/v1/chat/completions` (Ollama 등)
    OpenAiCompat,
}

/// 티어별 백엔드 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierConfig {
    /// 티어 태그
    pub id: TierId,
    /// 백엔드 종류
    pub backend: BackendKind,
    /// API URL
    pub endpoint: String,
    /// API 키 (비어 있으면 환경 변수 사용)
    #[serde(default)]
    pub api_key: String,
    /// 모델 이름
    #[serde(default)]
    pub model: Option<String>,
    /// 연속 호출 최소 간격 (ms)
    #[serde(default)]
    pub min_call_spacing_ms: u64,
    /// 레이트 리밋 신호 후 쿨다운 (ms)
    #[serde(default = "default_cooldown_after_rate_limit_ms")]
    pub cooldown_after_rate_limit_ms: u64,
    /// 동시 호출 불가 백엔드 — 티어별 게이트로 직렬화
    #[serde(default)]
    pub serialize_calls: bool,
    /// 활성화 여부
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl TierConfig {
    pub fn min_call_spacing(&self) -> Duration {
        Duration::from_millis(self.min_call_spacing_ms)
    }

    pub fn cooldown_after_rate_limit(&self) -> Duration {
        Duration::from_millis(self.cooldown_after_rate_limit_ms)
    }

    /// 설정 파일 키가 비어 있으면 백엔드별 환경 변수로 보충
    pub fn resolved_api_key(&self) -> Option<String> {
        if !self.api_key.trim().is_empty() {
            return Some(self.api_key.clone());
        }
        match self.backend {
            BackendKind::Gemini => std::env::var(GEMINI_API_KEY_ENV)
                .ok()
                .filter(|k| !k.trim().is_empty()),
            _ => None,
        }
    }
}

/// 품질 매트릭스 행 — 언어 쌍 → 티어 우선순위
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityMatrixEntry {
    /// 원문 언어 ("auto"는 와일드카드)
    pub source: String,
    /// 대상 언어
    pub target: String,
    /// 시도 순서
    pub tiers: Vec<TierId>,
}

impl QualityMatrixEntry {
    pub fn new(source: &str, target: &str, tiers: &[TierId]) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            tiers: tiers.to_vec(),
        }
    }
}

/// 번역 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// 원문 언어 ("auto"면 자동 감지)
    #[serde(default = "default_source_lang")]
    pub source_lang: String,
    /// 대상 언어
    #[serde(default = "default_target_lang")]
    pub target_lang: String,
    /// 번역 캐시 용량 (항목 수)
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    /// 백엔드 호출 타임아웃 (ms)
    #[serde(default = "default_backend_timeout_ms")]
    pub backend_timeout_ms: u64,
    /// 티어 구성
    #[serde(default = "default_tiers")]
    pub tiers: Vec<TierConfig>,
    /// 언어 쌍별 티어 순서
    #[serde(default = "default_quality_matrix")]
    pub quality_matrix: Vec<QualityMatrixEntry>,
    /// 매트릭스에 없는 쌍의 티어 순서
    #[serde(default = "default_tier_order")]
    pub default_tiers: Vec<TierId>,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            source_lang: default_source_lang(),
            target_lang: default_target_lang(),
            cache_capacity: default_cache_capacity(),
            backend_timeout_ms: default_backend_timeout_ms(),
            tiers: default_tiers(),
            quality_matrix: default_quality_matrix(),
            default_tiers: default_tier_order(),
        }
    }
}

impl TranslationConfig {
    pub fn backend_timeout(&self) -> Duration {
        Duration::from_millis(self.backend_timeout_ms)
    }

    pub fn tier(&self, id: TierId) -> Option<&TierConfig> {
        self.tiers.iter().find(|t| t.id == id)
    }
}

// ============================================================
// 오버레이 설정
// ============================================================

/// 오버레이 표시 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// 신뢰도 0일 때 불투명도
    #[serde(default = "default_min_opacity")]
    pub min_opacity: f32,
    /// 신뢰도 1일 때 불투명도
    #[serde(default = "default_max_opacity")]
    pub max_opacity: f32,
    /// 최소 글꼴 크기 (px)
    #[serde(default = "default_min_font_size")]
    pub min_font_size: u32,
    /// 최대 글꼴 크기 (px)
    #[serde(default = "default_max_font_size")]
    pub max_font_size: u32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            min_opacity: default_min_opacity(),
            max_opacity: default_max_opacity(),
            min_font_size: default_min_font_size(),
            max_font_size: default_max_font_size(),
        }
    }
}

// ============================================================
// OCR 설정
// ============================================================

/// Tesseract OCR 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// tessdata 경로 (None이면 시스템 기본값)
    #[serde(default)]
    pub tessdata_path: Option<PathBuf>,
    /// Tesseract 언어 (예: "eng", "eng+jpn")
    #[serde(default = "default_ocr_language")]
    pub language: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tessdata_path: None,
            language: default_ocr_language(),
        }
    }
}

// ============================================================
// AppConfig impl
// ============================================================

impl AppConfig {
    /// 기본 설정값 반환
    pub fn default_config() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            capture: CaptureConfig::default(),
            translation: TranslationConfig::default(),
            overlay: OverlayConfig::default(),
            ocr: OcrConfig::default(),
        }
    }

    /// 폴링 주기를 Duration으로 반환
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.pipeline.poll_interval_ms)
    }

    /// 렌더(위치 추적) 주기를 Duration으로 반환
    pub fn render_interval(&self) -> Duration {
        Duration::from_millis(self.pipeline.render_interval_ms)
    }

    /// 추출 타임아웃을 Duration으로 반환
    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_millis(self.pipeline.extraction_timeout_ms)
    }

    /// 재시도 첫 대기를 Duration으로 반환
    pub fn retry_initial(&self) -> Duration {
        Duration::from_millis(self.pipeline.retry_initial_ms)
    }

    /// 재시도 대기 상한을 Duration으로 반환
    pub fn retry_max(&self) -> Duration {
        Duration::from_millis(self.pipeline.retry_max_ms)
    }

    /// 설정값 유효성 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.pipeline.poll_interval_ms == 0 {
            return Err(invalid("pipeline.poll_interval_ms", "0보다 커야 합니다"));
        }
        if self.pipeline.render_interval_ms == 0 {
            return Err(invalid("pipeline.render_interval_ms", "0보다 커야 합니다"));
        }
        if !(2..=32).contains(&self.pipeline.hash_size) {
            return Err(invalid("pipeline.hash_size", "2 ~ 32 범위여야 합니다"));
        }
        if self.pipeline.retry_initial_ms == 0 {
            return Err(invalid("pipeline.retry_initial_ms", "0보다 커야 합니다"));
        }
        if self.pipeline.retry_max_ms < self.pipeline.retry_initial_ms {
            return Err(invalid(
                "pipeline.retry_max_ms",
                "retry_initial_ms 이상이어야 합니다",
            ));
        }
        if self.capture.methods.is_empty() {
            return Err(invalid("capture.methods", "최소 하나의 캡처 방식이 필요합니다"));
        }
        if self.translation.cache_capacity == 0 {
            return Err(invalid("translation.cache_capacity", "0보다 커야 합니다"));
        }
        let o = &self.overlay;
        if !(0.0..=1.0).contains(&o.min_opacity)
            || !(0.0..=1.0).contains(&o.max_opacity)
            || o.min_opacity > o.max_opacity
        {
            return Err(invalid(
                "overlay.opacity",
                "0 <= min_opacity <= max_opacity <= 1 이어야 합니다",
            ));
        }
        if o.min_font_size == 0 || o.min_font_size > o.max_font_size {
            return Err(invalid("overlay.font_size", "0 < min_font_size <= max_font_size"));
        }
        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> CoreError {
    CoreError::Validation {
        field: field.to_string(),
        message: message.to_string(),
    }
}

// ============================================================
// 기본값 함수
// ============================================================

fn default_true() -> bool {
    true
}

fn default_poll_interval_ms() -> u64 {
    66
}
fn default_render_interval_ms() -> u64 {
    33
}
fn default_change_threshold() -> u32 {
    5
}
fn default_hash_size() -> u32 {
    8
}
fn default_extraction_timeout_ms() -> u64 {
    5_000
}
fn default_min_text_confidence() -> f32 {
    0.3
}
fn default_retry_initial_ms() -> u64 {
    1_000
}
fn default_retry_max_ms() -> u64 {
    30_000
}
fn default_max_retries() -> u32 {
    5
}

fn default_blank_threshold() -> u8 {
    10
}

fn default_source_lang() -> String {
    AUTO_LANG.to_string()
}
fn default_target_lang() -> String {
    "vi".to_string()
}
fn default_cache_capacity() -> usize {
    512
}
fn default_backend_timeout_ms() -> u64 {
    8_000
}
fn default_cooldown_after_rate_limit_ms() -> u64 {
    60_000
}

fn default_tier_order() -> Vec<TierId> {
    vec![TierId::Cloud, TierId::LocalLarge, TierId::LocalLite]
}

fn default_tiers() -> Vec<TierConfig> {
    vec![
        TierConfig {
            id: TierId::Cloud,
            backend: BackendKind::Gemini,
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            api_key: String::new(),
            model: Some("gemini-2.0-flash-lite".to_string()),
            // 무료 할당량 15 요청/분
            min_call_spacing_ms: 1_500,
            cooldown_after_rate_limit_ms: 60_000,
            serialize_calls: false,
            enabled: true,
        },
        TierConfig {
            id: TierId::LocalLarge,
            backend: BackendKind::LibreTranslate,
            endpoint: "http://127.0.0.1:5000".to_string(),
            api_key: String::new(),
            model: None,
            min_call_spacing_ms: 0,
            cooldown_after_rate_limit_ms: 5_000,
            serialize_calls: true,
            enabled: true,
        },
        TierConfig {
            id: TierId::LocalLite,
            backend: BackendKind::OpenAiCompat,
            endpoint: "http://127.0.0.1:11434".to_string(),
            api_key: String::new(),
            model: Some("qwen2.5:1.5b".to_string()),
            min_call_spacing_ms: 0,
            cooldown_after_rate_limit_ms: 5_000,
            serialize_calls: true,
            enabled: true,
        },
    ]
}

fn default_quality_matrix() -> Vec<QualityMatrixEntry> {
    use TierId::*;

    let speed_first = [Cloud, LocalLarge, LocalLite];
    // 사용 빈도가 낮은 쌍은 로컬 대형 모델이 더 안정적
    let local_first = [LocalLarge, Cloud, LocalLite];

    let mut rows = Vec::new();
    for (s, t) in [
        ("en", "vi"),
        ("vi", "en"),
        ("en", "zh"),
        ("zh", "en"),
        ("en", "fr"),
        ("fr", "en"),
        ("en", "ja"),
        ("ja", "en"),
    ] {
        rows.push(QualityMatrixEntry::new(s, t, &speed_first));
    }
    for (s, t) in [
        ("vi", "zh"),
        ("zh", "vi"),
        ("vi", "fr"),
        ("fr", "vi"),
        ("vi", "ja"),
        ("ja", "vi"),
        ("fr", "zh"),
        ("zh", "fr"),
        ("fr", "ja"),
        ("ja", "fr"),
    ] {
        rows.push(QualityMatrixEntry::new(s, t, &local_first));
    }
    for t in ["vi", "en"] {
        rows.push(QualityMatrixEntry::new(AUTO_LANG, t, &speed_first));
    }
    rows
}

fn default_min_opacity() -> f32 {
    0.55
}
fn default_max_opacity() -> f32 {
    0.95
}
fn default_min_font_size() -> u32 {
    8
}
fn default_max_font_size() -> u32 {
    32
}

fn default_ocr_language() -> String {
    "eng".to_string()
}
