//! lingo 에러 분류 체계.
//!
//! - [`CoreError`] — 설정/직렬화/I/O 등 공통 에러
//! - [`CaptureError`] — 해당 영역 모니터링에 치명적 (영역 중단)
//! - [`ExtractionError`] — 일시적, 이번 사이클만 포기
//! - [`BackendFailure`] — 단일 번역 티어 실패 (라우터 내부에서 폴백)
//! - [`TranslationFailure`] — 모든 티어 소진 (일시적, 진단 채널로 보고)

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::models::capture::CaptureMethod;
use crate::models::translation::TierId;

/// 코어 레이어 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패
    #[error("유효성 검증 실패 — {field}: {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// 캡처 에러 — 대상 창 소실/무효 또는 모든 캡처 폴백 소진.
///
/// 해당 영역의 모니터링은 `Stopped`로 전환되고 호출자에게 보고된다.
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    /// 대상 창이 더 이상 존재하지 않거나 핸들이 무효
    #[error("대상 창 무효: window_id={window_id}")]
    WindowInvalid {
        /// 대상 창 ID
        window_id: u32,
    },

    /// 모니터링 영역이 창 범위를 벗어나 크기가 0
    #[error("캡처 영역이 비어 있음: window_id={window_id}")]
    EmptyRegion {
        /// 대상 창 ID
        window_id: u32,
    },

    /// 모든 캡처 방식 실패
    #[error("모든 캡처 방식 실패: {}", format_attempts(.attempts))]
    Exhausted {
        /// 방식별 실패 사유 (시도 순서)
        attempts: Vec<(CaptureMethod, String)>,
    },

    /// 블로킹 캡처 작업 조인 실패
    #[error("캡처 작업 실패: {0}")]
    Task(String),
}

fn format_attempts(attempts: &[(CaptureMethod, String)]) -> String {
    attempts
        .iter()
        .map(|(method, reason)| format!("{method}: {reason}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// 텍스트 추출 에러 — 일시적. 이번 사이클은 폐기되고 오버레이는 유지된다.
#[derive(Debug, Clone, Error)]
pub enum ExtractionError {
    /// 추출기 타임아웃
    #[error("텍스트 추출 타임아웃: {0:?} 초과")]
    Timeout(Duration),

    /// 빈 이미지 입력
    #[error("빈 이미지: 너비 또는 높이가 0")]
    EmptyImage,

    /// 추출기 사용 불가 (feature 비활성화, 초기화 실패 등)
    #[error("텍스트 추출기 사용 불가: {0}")]
    Unavailable(String),

    /// 추출 실패
    #[error("텍스트 추출 실패: {0}")]
    Failed(String),
}

/// 번역 백엔드 단일 티어 실패.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendFailure {
    /// 백엔드가 요청 한도 초과를 알림 (429 등)
    #[error("요청 한도 초과 (retry_after={retry_after:?})")]
    RateLimited {
        /// 백엔드가 제시한 재시도 대기 시간
        retry_after: Option<Duration>,
    },

    /// 네트워크/인증 에러
    #[error("네트워크 에러: {0}")]
    NetworkError(String),

    /// 지원하지 않는 언어 쌍 또는 입력
    #[error("지원하지 않는 요청: {0}")]
    Unsupported(String),

    /// 백엔드 호출 타임아웃
    #[error("백엔드 타임아웃: {0:?} 초과")]
    Timeout(Duration),
}

/// 라우터가 한 티어를 포기한 사유
#[derive(Debug, Clone, PartialEq)]
pub enum TierFailureReason {
    /// 백엔드 호출 실패
    Backend(BackendFailure),
    /// 로컬 레이트 리미터가 호출을 막음 (백엔드 미호출)
    RateLimitedLocally {
        /// 다음 호출 가능까지 남은 시간
        wait: Duration,
    },
    /// 해당 티어에 백엔드가 구성되지 않음
    NotConfigured,
}

impl fmt::Display for TierFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend(failure) => write!(f, "{failure}"),
            Self::RateLimitedLocally { wait } => {
                write!(f, "로컬 레이트 리밋으로 건너뜀 ({}ms 대기 필요)", wait.as_millis())
            }
            Self::NotConfigured => write!(f, "구성되지 않은 티어"),
        }
    }
}

/// 번역 실패 — 모든 티어 소진 또는 번역 불가 입력.
#[derive(Debug, Clone)]
pub struct TranslationFailure {
    /// 원문
    pub text: String,
    /// 원문 언어 (요청 기준)
    pub source_lang: String,
    /// 대상 언어
    pub target_lang: String,
    /// 티어별 실패 사유 (시도 순서)
    pub attempts: Vec<(TierId, TierFailureReason)>,
    /// 빈 텍스트로 인해 백엔드를 호출하지 않은 경우
    pub empty_text: bool,
}

impl TranslationFailure {
    /// 빈 텍스트 입력 실패
    pub fn empty(source_lang: &str, target_lang: &str) -> Self {
        Self {
            text: String::new(),
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            attempts: Vec::new(),
            empty_text: true,
        }
    }

    /// 특정 티어의 실패 사유 조회
    pub fn reason_for(&self, tier: TierId) -> Option<&TierFailureReason> {
        self.attempts
            .iter()
            .find(|(t, _)| *t == tier)
            .map(|(_, reason)| reason)
    }

    fn describe_attempts(&self) -> String {
        if self.empty_text {
            return "빈 텍스트".to_string();
        }
        if self.attempts.is_empty() {
            return "시도한 티어 없음".to_string();
        }
        self.attempts
            .iter()
            .map(|(tier, reason)| format!("{tier}: {reason}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl fmt::Display for TranslationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "번역 실패 [{}→{}] '{}': {}",
            self.source_lang,
            self.target_lang,
            self.text,
            self.describe_attempts()
        )
    }
}

impl std::error::Error for TranslationFailure {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_error_lists_attempts() {
        let err = CaptureError::Exhausted {
            attempts: vec![
                (CaptureMethod::WindowSurface, "검은 이미지".to_string()),
                (CaptureMethod::DesktopCrop, "모니터 없음".to_string()),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("window_surface: 검은 이미지"));
        assert!(msg.contains("desktop_crop: 모니터 없음"));
    }

    #[test]
    fn translation_failure_display() {
        let failure = TranslationFailure {
            text: "Hello".to_string(),
            source_lang: "en".to_string(),
            target_lang: "vi".to_string(),
            attempts: vec![
                (
                    TierId::Cloud,
                    TierFailureReason::Backend(BackendFailure::NetworkError("연결 거부".into())),
                ),
                (TierId::LocalLarge, TierFailureReason::NotConfigured),
            ],
            empty_text: false,
        };
        let msg = failure.to_string();
        assert!(msg.contains("cloud: 네트워크 에러: 연결 거부"));
        assert!(msg.contains("local_large: 구성되지 않은 티어"));
    }

    #[test]
    fn empty_failure_has_no_attempts() {
        let failure = TranslationFailure::empty("auto", "vi");
        assert!(failure.empty_text);
        assert!(failure.attempts.is_empty());
        assert!(failure.to_string().contains("빈 텍스트"));
    }
}
