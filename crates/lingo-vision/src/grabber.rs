//! 플랫폼 화면 접근 추상화.
//!
//! `xcap`을 감싸는 [`XcapGrabber`]가 실제 구현이고, 캡처 폴백 체인 테스트는
//! 가짜 grabber를 주입한다. 모든 호출은 블로킹이다.

use image::RgbaImage;
use lingo_core::error::CoreError;
use lingo_core::models::geometry::Rect;
use tracing::debug;
use xcap::{Monitor, Window};

/// 최상위 창 정보
#[derive(Debug, Clone, PartialEq)]
pub struct WindowInfo {
    /// 플랫폼 창 ID
    pub id: u32,
    /// 창 제목
    pub title: String,
    /// 앱 이름
    pub app_name: String,
    /// 화면 절대 좌표
    pub rect: Rect,
    /// 최소화 여부
    pub minimized: bool,
}

/// 화면 grabber — 창/모니터 조회와 원시 캡처
pub trait ScreenGrabber: Send + Sync {
    /// 최상위 창 목록
    fn list_windows(&self) -> Result<Vec<WindowInfo>, CoreError>;

    /// 특정 창 조회 (없으면 None)
    fn window_info(&self, window_id: u32) -> Result<Option<WindowInfo>, CoreError> {
        Ok(self
            .list_windows()?
            .into_iter()
            .find(|w| w.id == window_id))
    }

    /// 창 자체 렌더링 표면 캡처 (창 원점 기준 이미지)
    fn capture_window(&self, window_id: u32) -> Result<RgbaImage, CoreError>;

    /// 화면 점 (x, y)를 포함하는 모니터 캡처 → (모니터 절대 사각형, 이미지)
    fn capture_monitor_at(&self, x: i32, y: i32) -> Result<(Rect, RgbaImage), CoreError>;

    /// 모든 모니터 캡처
    fn capture_all_monitors(&self) -> Result<Vec<(Rect, RgbaImage)>, CoreError>;
}

/// xcap 기반 grabber
#[derive(Debug, Default, Clone, Copy)]
pub struct XcapGrabber;

impl XcapGrabber {
    pub fn new() -> Self {
        Self
    }

    fn find_window(window_id: u32) -> Result<Option<Window>, CoreError> {
        let windows = Window::all()
            .map_err(|e| CoreError::Internal(format!("창 목록 조회 실패: {e}")))?;
        Ok(windows
            .into_iter()
            .find(|w| w.id().map(|id| id == window_id).unwrap_or(false)))
    }

    fn monitor_rect(monitor: &Monitor) -> Result<Rect, CoreError> {
        let map = |e: xcap::XCapError| CoreError::Internal(format!("모니터 정보 조회 실패: {e}"));
        Ok(Rect::new(
            monitor.x().map_err(map)?,
            monitor.y().map_err(map)?,
            monitor.width().map_err(map)?,
            monitor.height().map_err(map)?,
        ))
    }
}

fn window_info(window: &Window) -> Option<WindowInfo> {
    Some(WindowInfo {
        id: window.id().ok()?,
        title: window.title().unwrap_or_default(),
        app_name: window.app_name().unwrap_or_default(),
        rect: Rect::new(
            window.x().ok()?,
            window.y().ok()?,
            window.width().ok()?,
            window.height().ok()?,
        ),
        minimized: window.is_minimized().unwrap_or(false),
    })
}

impl ScreenGrabber for XcapGrabber {
    fn list_windows(&self) -> Result<Vec<WindowInfo>, CoreError> {
        let windows = Window::all()
            .map_err(|e| CoreError::Internal(format!("창 목록 조회 실패: {e}")))?;
        Ok(windows.iter().filter_map(window_info).collect())
    }

    fn window_info(&self, window_id: u32) -> Result<Option<WindowInfo>, CoreError> {
        Ok(Self::find_window(window_id)?.as_ref().and_then(window_info))
    }

    fn capture_window(&self, window_id: u32) -> Result<RgbaImage, CoreError> {
        let window = Self::find_window(window_id)?
            .ok_or_else(|| CoreError::Internal(format!("창 없음: {window_id}")))?;
        let image = window
            .capture_image()
            .map_err(|e| CoreError::Internal(format!("창 캡처 실패: {e}")))?;
        debug!(window_id, "창 캡처 완료: {}x{}", image.width(), image.height());
        Ok(image)
    }

    fn capture_monitor_at(&self, x: i32, y: i32) -> Result<(Rect, RgbaImage), CoreError> {
        let monitor = Monitor::from_point(x, y)
            .map_err(|e| CoreError::Internal(format!("({x}, {y}) 위치의 모니터 없음: {e}")))?;
        let rect = Self::monitor_rect(&monitor)?;
        let image = monitor
            .capture_image()
            .map_err(|e| CoreError::Internal(format!("스크린 캡처 실패: {e}")))?;
        Ok((rect, image))
    }

    fn capture_all_monitors(&self) -> Result<Vec<(Rect, RgbaImage)>, CoreError> {
        let monitors = Monitor::all()
            .map_err(|e| CoreError::Internal(format!("모니터 목록 조회 실패: {e}")))?;
        monitors
            .iter()
            .map(|monitor| {
                let rect = Self::monitor_rect(monitor)?;
                let image = monitor
                    .capture_image()
                    .map_err(|e| CoreError::Internal(format!("스크린 캡처 실패: {e}")))?;
                Ok((rect, image))
            })
            .collect()
    }
}
