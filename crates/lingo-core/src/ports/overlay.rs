//! 오버레이 표면 포트.
//!
//! 실제 그리기를 담당한다. 구현체는 클릭 통과(pass-through),
//! 비대화형 창을 만들어야 한다.

use crate::models::capture::RegionId;
use crate::models::overlay::OverlayBox;

/// 오버레이 그리기 표면
///
/// 구현체: `HeadlessSurface` (메모리 + tracing 로그)
pub trait OverlaySurface: Send + Sync {
    /// 영역의 박스 전체 교체
    fn replace(&self, region: RegionId, boxes: &[OverlayBox]);

    /// 내용은 그대로, 위치만 이동
    fn reposition(&self, region: RegionId, boxes: &[OverlayBox]);

    /// 영역의 박스 모두 제거
    fn clear(&self, region: RegionId);
}
