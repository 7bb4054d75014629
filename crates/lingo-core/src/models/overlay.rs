//! 오버레이 박스 모델.

use serde::{Deserialize, Serialize};

use super::geometry::Rect;

/// 신뢰도 구간 (박스 강조색 결정)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    /// >= 0.8
    High,
    /// >= 0.5
    Medium,
    /// < 0.5
    Low,
}

impl ConfidenceBand {
    pub fn from_confidence(confidence: f32) -> Self {
        if confidence >= 0.8 {
            ConfidenceBand::High
        } else if confidence >= 0.5 {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::Low
        }
    }

    /// 강조색 (RGB hex)
    pub fn accent_color(&self) -> &'static str {
        match self {
            ConfidenceBand::High => "#00FF00",
            ConfidenceBand::Medium => "#FFFF00",
            ConfidenceBand::Low => "#FF6600",
        }
    }
}

/// 화면에 표시되는 오버레이 박스 (클릭 통과, 비대화형)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayBox {
    /// 화면 절대 좌표
    pub absolute_bbox: Rect,
    /// 표시 텍스트 (번역문)
    pub display_text: String,
    /// 불투명도 (0.0 ~ 1.0, 신뢰도에 단조 비례)
    pub opacity: f32,
    /// 글꼴 크기 (px)
    pub font_size: u32,
    /// 신뢰도 구간
    pub band: ConfidenceBand,
    /// 번역에 실패한 자리에 이전 내용을 흐리게 유지 중인 박스
    pub stale: bool,
}
