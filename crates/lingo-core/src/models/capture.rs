//! 캡처 프레임 및 모니터링 영역 모델.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::geometry::Rect;

/// 캡처 방식 (폴백 체인 순서대로 시도)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureMethod {
    /// 대상 창 자체 렌더링 표면 (컴포지팅 우회 — 오버레이가 찍히지 않음)
    WindowSurface,
    /// 컴포지터 수준 캡처, 창의 현재 사각형으로 제한
    CompositorRect,
    /// 전체 데스크톱 캡처 후 창의 마지막으로 알려진 사각형으로 자르기
    DesktopCrop,
}

impl CaptureMethod {
    /// 기본 폴백 체인
    pub fn default_chain() -> Vec<CaptureMethod> {
        vec![
            CaptureMethod::WindowSurface,
            CaptureMethod::CompositorRect,
            CaptureMethod::DesktopCrop,
        ]
    }

    /// 합성된 데스크톱 이미지를 읽는 방식인지 (오버레이가 함께 찍힐 수 있음)
    pub fn is_composited(&self) -> bool {
        !matches!(self, CaptureMethod::WindowSurface)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureMethod::WindowSurface => "window_surface",
            CaptureMethod::CompositorRect => "compositor_rect",
            CaptureMethod::DesktopCrop => "desktop_crop",
        }
    }
}

impl fmt::Display for CaptureMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 캡처된 프레임 — 한 파이프라인 사이클이 일시적으로 소유
#[derive(Debug, Clone)]
pub struct Frame {
    /// 단조 증가 시퀀스 번호
    pub seq: u64,
    /// 캡처 시각
    pub captured_at: DateTime<Utc>,
    /// 모니터링 영역으로 잘린 이미지
    pub image: Arc<DynamicImage>,
    /// 이 프레임을 만든 캡처 방식
    pub method: CaptureMethod,
}

impl Frame {
    pub fn new(seq: u64, image: DynamicImage, method: CaptureMethod) -> Self {
        Self {
            seq,
            captured_at: Utc::now(),
            image: Arc::new(image),
            method,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }
}

/// 모니터링 영역 식별자
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionId(Uuid);

impl RegionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RegionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 로그 가독성을 위해 앞 8자리만
        let s = self.0.simple().to_string();
        f.write_str(&s[..8])
    }
}

/// 모니터링 영역 핸들 — 대상 창 안의 사용자 지정 사각형
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionHandle {
    /// 영역 ID
    pub id: RegionId,
    /// 대상 창 ID (플랫폼 창 식별자)
    pub window_id: u32,
    /// 창 원점 기준 영역 (None이면 창 전체)
    pub region: Option<Rect>,
}

impl RegionHandle {
    pub fn new(window_id: u32, region: Option<Rect>) -> Self {
        Self {
            id: RegionId::new(),
            window_id,
            region,
        }
    }

    /// 창 크기(w, h) 안으로 잘린 상대 영역
    pub fn clamp_to_window(&self, window_w: u32, window_h: u32) -> Option<Rect> {
        let window = Rect::new(0, 0, window_w, window_h);
        match self.region {
            Some(region) => region.intersect(&window),
            None if window.is_empty() => None,
            None => Some(window),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_chain_order() {
        let chain = CaptureMethod::default_chain();
        assert_eq!(chain[0], CaptureMethod::WindowSurface);
        assert!(!chain[0].is_composited());
        assert!(chain[1].is_composited());
        assert!(chain[2].is_composited());
    }

    #[test]
    fn capture_method_serde_name() {
        let json = serde_json::to_string(&CaptureMethod::CompositorRect).unwrap();
        assert_eq!(json, "\"compositor_rect\"");
    }

    #[test]
    fn region_is_clamped_to_window() {
        let handle = RegionHandle::new(7, Some(Rect::new(700, 500, 200, 200)));
        assert_eq!(handle.clamp_to_window(800, 600), Some(Rect::new(700, 500, 100, 100)));

        let outside = RegionHandle::new(7, Some(Rect::new(900, 0, 50, 50)));
        assert_eq!(outside.clamp_to_window(800, 600), None);

        let whole = RegionHandle::new(7, None);
        assert_eq!(whole.clamp_to_window(800, 600), Some(Rect::new(0, 0, 800, 600)));
    }

    #[test]
    fn region_ids_are_unique() {
        assert_ne!(RegionId::new(), RegionId::new());
        assert_eq!(RegionId::new().to_string().len(), 8);
    }
}
