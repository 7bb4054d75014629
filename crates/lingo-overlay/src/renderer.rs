//! 오버레이 렌더러.
//!
//! - `apply`: 영역 박스 전체 교체. 창의 현재 절대 위치 + 상대 bbox에 배치
//! - `clear`: 영역 박스 제거 및 비활성화 (이후 apply는 `Closed`)
//! - `follow`: 렌더 틱마다 창 위치를 다시 읽어 바뀐 경우에만 박스 이동
//!
//! 적용은 프레임 시퀀스 기준 단조 증가다. 이미 적용된 시퀀스 이하의
//! 결과는 `Stale`로 버린다. 활성 여부와 시퀀스 검사는 모두 렌더러 잠금
//! 안에서 이루어진다.

use std::collections::HashMap;
use std::sync::Arc;

use lingo_core::config::OverlayConfig;
use lingo_core::error::CaptureError;
use lingo_core::models::capture::{RegionHandle, RegionId};
use lingo_core::models::geometry::Rect;
use lingo_core::models::overlay::{ConfidenceBand, OverlayBox};
use lingo_core::models::translation::PlacedTranslation;
use lingo_core::ports::capture::WindowProvider;
use lingo_core::ports::overlay::OverlaySurface;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

/// 번역 실패 자리에 유지되는 박스의 불투명도 배율
const STALE_OPACITY_FACTOR: f32 = 0.6;

/// 이전 박스를 같은 자리로 볼 최소 IoU
const SAME_PLACE_IOU: f32 = 0.5;

/// 한 사이클의 렌더 입력
#[derive(Debug, Clone, Default)]
pub struct RenderBatch {
    /// 번역 성공한 영역
    pub translated: Vec<PlacedTranslation>,
    /// 번역 실패한 영역의 상대 bbox (이전 박스 유지 후보)
    pub failed: Vec<Rect>,
}

/// apply 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// 적용됨
    Applied {
        /// 표시 중인 박스 수 (유지된 박스 포함)
        boxes: usize,
        /// 유지된(stale) 박스 수
        carried: usize,
    },
    /// 더 최신 시퀀스가 이미 적용됨 — 폐기
    Stale {
        /// 마지막으로 적용된 시퀀스
        last_applied: u64,
    },
    /// 열려 있지 않은(중지/정리된) 영역 — 폐기
    Closed,
}

#[derive(Debug, Clone)]
struct PlacedBox {
    /// 캡처 원점 기준 bbox
    relative: Rect,
    overlay: OverlayBox,
}

#[derive(Debug)]
struct RegionOverlay {
    last_seq: Option<u64>,
    anchor: Option<Rect>,
    boxes: Vec<PlacedBox>,
}

/// 오버레이 렌더러 — 모든 모니터링 영역 공유
pub struct OverlayRenderer {
    surface: Arc<dyn OverlaySurface>,
    windows: Arc<dyn WindowProvider>,
    config: OverlayConfig,
    regions: Mutex<HashMap<RegionId, RegionOverlay>>,
}

impl OverlayRenderer {
    pub fn new(
        surface: Arc<dyn OverlaySurface>,
        windows: Arc<dyn WindowProvider>,
        config: OverlayConfig,
    ) -> Self {
        Self {
            surface,
            windows,
            config,
            regions: Mutex::new(HashMap::new()),
        }
    }

    /// 영역 활성화 (모니터링 시작 시)
    pub fn open(&self, handle: &RegionHandle) {
        self.regions.lock().entry(handle.id).or_insert(RegionOverlay {
            last_seq: None,
            anchor: None,
            boxes: Vec::new(),
        });
        debug!(region = %handle.id, "오버레이 영역 열림");
    }

    /// 영역이 활성 상태인지
    pub fn is_open(&self, region: RegionId) -> bool {
        self.regions.lock().contains_key(&region)
    }

    /// 마지막으로 적용된 프레임 시퀀스
    pub fn last_applied(&self, region: RegionId) -> Option<u64> {
        self.regions.lock().get(&region).and_then(|r| r.last_seq)
    }

    /// 프레임 `seq`의 번역 결과 적용 (전체 교체)
    pub fn apply(
        &self,
        handle: &RegionHandle,
        seq: u64,
        batch: RenderBatch,
    ) -> Result<ApplyOutcome, CaptureError> {
        // 창 조회는 블로킹 호출이라 잠금 밖에서
        let anchor = match self.windows.get_absolute_rect(handle) {
            Ok(anchor) => anchor,
            Err(e) => {
                if self.close(handle.id) {
                    warn!(region = %handle.id, "적용 중 대상 창 무효 — 오버레이 제거: {e}");
                }
                return Err(e);
            }
        };

        let mut regions = self.regions.lock();
        let Some(region) = regions.get_mut(&handle.id) else {
            debug!(region = %handle.id, seq, "닫힌 영역 — 결과 폐기");
            return Ok(ApplyOutcome::Closed);
        };
        if let Some(last) = region.last_seq {
            if seq <= last {
                debug!(region = %handle.id, seq, last, "오래된 사이클 결과 폐기");
                return Ok(ApplyOutcome::Stale { last_applied: last });
            }
        }

        let mut next: Vec<PlacedBox> = batch
            .translated
            .iter()
            .map(|placed| PlacedBox {
                relative: placed.bbox,
                overlay: self.make_box(placed, &anchor),
            })
            .collect();

        // 번역 실패 자리의 이전 박스는 그 자리가 번역될 때까지 흐리게 유지
        let mut carried = 0;
        for failed in &batch.failed {
            if let Some(prev) = region
                .boxes
                .iter()
                .find(|b| b.relative.iou(failed) >= SAME_PLACE_IOU)
            {
                let mut kept = prev.clone();
                if !kept.overlay.stale {
                    kept.overlay.stale = true;
                    kept.overlay.opacity *= STALE_OPACITY_FACTOR;
                }
                kept.overlay.absolute_bbox = kept.relative.anchored_at(&anchor);
                next.push(kept);
                carried += 1;
            }
        }

        let overlays: Vec<OverlayBox> = next.iter().map(|b| b.overlay.clone()).collect();
        self.surface.replace(handle.id, &overlays);

        region.last_seq = Some(seq);
        region.anchor = Some(anchor);
        region.boxes = next;

        info!(region = %handle.id, seq, boxes = overlays.len(), carried, "오버레이 적용");
        Ok(ApplyOutcome::Applied {
            boxes: overlays.len(),
            carried,
        })
    }

    /// 영역 박스 제거 및 비활성화
    pub fn clear(&self, region: RegionId) {
        if self.close(region) {
            info!(%region, "오버레이 정리");
        }
    }

    /// 창 위치 추적 — 위치가 바뀌었으면 박스를 옮기고 true
    ///
    /// 창이 무효가 되면 영역을 정리하고 에러를 돌려준다.
    pub fn follow(&self, handle: &RegionHandle) -> Result<bool, CaptureError> {
        let anchor = match self.windows.get_absolute_rect(handle) {
            Ok(anchor) => anchor,
            Err(e) => {
                if self.close(handle.id) {
                    warn!(region = %handle.id, "대상 창 무효 — 오버레이 제거: {e}");
                }
                return Err(e);
            }
        };

        let mut regions = self.regions.lock();
        let Some(region) = regions.get_mut(&handle.id) else {
            return Ok(false);
        };
        if region.anchor == Some(anchor) || region.boxes.is_empty() {
            region.anchor = Some(anchor);
            return Ok(false);
        }

        for b in &mut region.boxes {
            b.overlay.absolute_bbox = b.relative.anchored_at(&anchor);
        }
        region.anchor = Some(anchor);
        let overlays: Vec<OverlayBox> = region.boxes.iter().map(|b| b.overlay.clone()).collect();
        self.surface.reposition(handle.id, &overlays);
        debug!(region = %handle.id, %anchor, "오버레이 위치 추적");
        Ok(true)
    }

    /// 제거 + 비활성화. 열려 있었으면 true.
    fn close(&self, region: RegionId) -> bool {
        let removed = self.regions.lock().remove(&region).is_some();
        self.surface.clear(region);
        removed
    }

    fn make_box(&self, placed: &PlacedTranslation, anchor: &Rect) -> OverlayBox {
        let confidence = placed.unit.confidence.clamp(0.0, 1.0);
        OverlayBox {
            absolute_bbox: placed.bbox.anchored_at(anchor),
            display_text: placed.unit.target_text.clone(),
            opacity: opacity_for(confidence, &self.config),
            font_size: font_size_for(&placed.bbox, &placed.unit.target_text, &self.config),
            band: ConfidenceBand::from_confidence(confidence),
            stale: false,
        }
    }
}

/// 신뢰도에 단조 비례하는 불투명도
pub fn opacity_for(confidence: f32, config: &OverlayConfig) -> f32 {
    let c = confidence.clamp(0.0, 1.0);
    config.min_opacity + (config.max_opacity - config.min_opacity) * c
}

/// bbox 높이 기준 글꼴 크기, 번역문이 길면 줄임
pub fn font_size_for(bbox: &Rect, text: &str, config: &OverlayConfig) -> u32 {
    let mut size = bbox.h as f32 * 0.75;

    // 평균 글자 폭 ≈ 0.55em, 한 줄 폭의 1.5배까지 허용 (줄바꿈 여유)
    let chars = text.chars().count().max(1) as f32;
    let needed = chars * size * 0.55;
    let available = bbox.w as f32 * 1.5;
    if needed > available && needed > 0.0 {
        size *= available / needed;
    }

    (size.round() as u32).clamp(config.min_font_size, config.max_font_size)
}
