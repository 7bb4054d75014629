//! 번역 모델.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::geometry::Rect;

/// 원문 언어 자동 감지 와일드카드
pub const AUTO_LANG: &str = "auto";

/// 번역 백엔드 티어 — 닫힌 태그 집합.
///
/// 품질 매트릭스는 언어 쌍을 이 태그들의 순서 있는 목록으로 매핑한다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierId {
    /// 고품질 네트워크 의존 모델 (예: Gemini)
    Cloud,
    /// 중간 품질 로컬 모델 (예: NLLB를 서빙하는 로컬 서버)
    LocalLarge,
    /// 경량 로컬 폴백 모델
    LocalLite,
}

impl TierId {
    pub const ALL: [TierId; 3] = [TierId::Cloud, TierId::LocalLarge, TierId::LocalLite];

    /// 품질 순위 (작을수록 고품질)
    pub fn rank(&self) -> u8 {
        match self {
            TierId::Cloud => 1,
            TierId::LocalLarge => 2,
            TierId::LocalLite => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TierId::Cloud => "cloud",
            TierId::LocalLarge => "local_large",
            TierId::LocalLite => "local_lite",
        }
    }
}

impl fmt::Display for TierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 번역 단위 — 번역 라우터가 생성, 생성 후 불변
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationUnit {
    /// 원문
    pub source_text: String,
    /// 번역문
    pub target_text: String,
    /// 원문 언어 (자동 감지 시 감지 결과, 실패 시 "auto")
    pub source_lang: String,
    /// 대상 언어
    pub target_lang: String,
    /// 결과를 만든 티어
    pub backend_tier_used: TierId,
    /// 백엔드가 보고한 신뢰도 (0.0 ~ 1.0, 정보용)
    pub confidence: f32,
    /// 백엔드 호출 지연
    #[serde(with = "duration_ms")]
    pub latency: Duration,
}

/// 캡처 원점 기준 위치가 붙은 번역 결과 (렌더러 입력)
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedTranslation {
    /// 캡처 원점 기준 바운딩 박스
    pub bbox: Rect,
    /// 번역 단위
    pub unit: TranslationUnit,
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
