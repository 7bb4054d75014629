//! 캡처 소스 / 창 위치 제공자 포트.
//!
//! 두 trait 모두 동기 API다. 플랫폼 캡처 호출은 블로킹이므로
//! 호출자가 `spawn_blocking`에서 실행한다.

use crate::error::CaptureError;
use crate::models::capture::{Frame, RegionHandle};
use crate::models::geometry::Rect;

/// 모니터링 영역 캡처
///
/// 구현체: `WindowCapture` (xcap 기반 폴백 체인)
pub trait CaptureSource: Send + Sync {
    /// 영역을 캡처하여 잘린 프레임 반환
    ///
    /// 대상 창 위에 그려진 오버레이는 1순위 방식에서 절대 찍히지 않는다.
    fn capture(&self, handle: &RegionHandle) -> Result<Frame, CaptureError>;
}

/// 창/영역의 현재 화면 절대 좌표 제공
pub trait WindowProvider: Send + Sync {
    /// 창의 현재 원점 + 영역 오프셋 (창 범위로 클램프)
    ///
    /// 창이 사라졌으면 `CaptureError::WindowInvalid`.
    fn get_absolute_rect(&self, handle: &RegionHandle) -> Result<Rect, CaptureError>;
}
