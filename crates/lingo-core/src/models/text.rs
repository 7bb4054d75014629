//! 텍스트 추출 결과 모델.

use serde::{Deserialize, Serialize};

use super::geometry::Rect;

/// 추출된 텍스트 영역 — 텍스트 추출기가 프레임 하나에서 0개 이상 생성
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRegion {
    /// 인식된 텍스트
    pub text: String,
    /// 캡처 원점 기준 바운딩 박스
    pub bbox: Rect,
    /// 인식 신뢰도 (0.0 ~ 1.0)
    pub confidence: f32,
}

impl TextRegion {
    pub fn new(text: impl Into<String>, bbox: Rect, confidence: f32) -> Self {
        Self {
            text: text.into(),
            bbox,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// 번역 대상이 될 수 있는지 (공백 제외 텍스트 존재 + 최소 신뢰도)
    pub fn is_translatable(&self, min_confidence: f32) -> bool {
        !self.text.trim().is_empty() && self.confidence >= min_confidence
    }
}
