//! 헤드리스 오버레이 표면.
//!
//! 박스를 메모리에 보관하고 tracing으로 기록한다. 테스트와 `--headless`
//! 실행에서 쓰인다.

use std::collections::HashMap;

use lingo_core::models::capture::RegionId;
use lingo_core::models::overlay::OverlayBox;
use lingo_core::ports::overlay::OverlaySurface;
use parking_lot::Mutex;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct SurfaceState {
    boxes: HashMap<RegionId, Vec<OverlayBox>>,
    replace_count: u64,
    reposition_count: u64,
}

/// 메모리 기반 오버레이 표면
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    state: Mutex<SurfaceState>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// 영역에 현재 표시 중인 박스
    pub fn boxes(&self, region: RegionId) -> Vec<OverlayBox> {
        self.state
            .lock()
            .boxes
            .get(&region)
            .cloned()
            .unwrap_or_default()
    }

    /// 영역에 표시 중인 박스가 있는지
    pub fn is_visible(&self, region: RegionId) -> bool {
        self.state
            .lock()
            .boxes
            .get(&region)
            .is_some_and(|b| !b.is_empty())
    }

    pub fn replace_count(&self) -> u64 {
        self.state.lock().replace_count
    }

    pub fn reposition_count(&self) -> u64 {
        self.state.lock().reposition_count
    }
}

impl OverlaySurface for HeadlessSurface {
    fn replace(&self, region: RegionId, boxes: &[OverlayBox]) {
        for b in boxes {
            info!(
                %region,
                bbox = %b.absolute_bbox,
                opacity = b.opacity,
                font = b.font_size,
                stale = b.stale,
                color = b.band.accent_color(),
                "오버레이: {}",
                b.display_text
            );
        }
        let mut state = self.state.lock();
        state.replace_count += 1;
        state.boxes.insert(region, boxes.to_vec());
    }

    fn reposition(&self, region: RegionId, boxes: &[OverlayBox]) {
        debug!(%region, count = boxes.len(), "오버레이 위치 이동");
        let mut state = self.state.lock();
        state.reposition_count += 1;
        state.boxes.insert(region, boxes.to_vec());
    }

    fn clear(&self, region: RegionId) {
        debug!(%region, "오버레이 제거");
        self.state.lock().boxes.remove(&region);
    }
}
