//! 모니터링 영역 캡처 — 폴백 체인.
//!
//! 1순위는 대상 창 자체의 렌더링 표면(window_surface)이라 위에 그려진
//! 오버레이가 찍히지 않는다. 실패하면 창의 현재 사각형으로 제한한 모니터
//! 캡처(compositor_rect), 마지막으로 전체 데스크톱에서 창의 마지막 위치를
//! 잘라낸다(desktop_crop). 에러와 빈 이미지는 언제나 실패다. 검은 이미지는
//! 뒤에 시도할 방식이 남아 있을 때만 실패로 보고, 체인의 마지막 방식에서는
//! 어두운 화면 그대로 받아들인다.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use image::{imageops, DynamicImage, GenericImageView, RgbaImage};
use lingo_core::config::CaptureConfig;
use lingo_core::error::CaptureError;
use lingo_core::models::capture::{CaptureMethod, Frame, RegionHandle, RegionId};
use lingo_core::models::geometry::Rect;
use lingo_core::ports::capture::{CaptureSource, WindowProvider};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::grabber::{ScreenGrabber, WindowInfo, XcapGrabber};

/// 창 기반 캡처 소스
pub struct WindowCapture<G = XcapGrabber> {
    grabber: G,
    methods: Vec<CaptureMethod>,
    blank_threshold: u8,
    /// 마지막 발급 시퀀스
    seq: AtomicU64,
    /// 창별 마지막으로 알려진 절대 사각형
    last_known: Mutex<HashMap<u32, Rect>>,
    /// 합성 캡처 경고를 이미 낸 영역
    composited_warned: Mutex<HashSet<RegionId>>,
}

impl WindowCapture<XcapGrabber> {
    /// xcap 기반 캡처 소스 생성
    pub fn from_config(config: &CaptureConfig) -> Self {
        Self::with_grabber(XcapGrabber::new(), config)
    }
}

impl<G: ScreenGrabber> WindowCapture<G> {
    pub fn with_grabber(grabber: G, config: &CaptureConfig) -> Self {
        Self {
            grabber,
            methods: config.methods.clone(),
            blank_threshold: config.blank_threshold,
            seq: AtomicU64::new(0),
            last_known: Mutex::new(HashMap::new()),
            composited_warned: Mutex::new(HashSet::new()),
        }
    }

    pub fn grabber(&self) -> &G {
        &self.grabber
    }

    /// 선택 가능한 창 목록 (최소화/크기 0 제외)
    pub fn list_windows(&self) -> Result<Vec<WindowInfo>, CaptureError> {
        let windows = self
            .grabber
            .list_windows()
            .map_err(|e| CaptureError::Task(e.to_string()))?;
        Ok(windows
            .into_iter()
            .filter(|w| !w.minimized && !w.rect.is_empty())
            .collect())
    }

    /// 창의 현재 사각형 조회.
    ///
    /// 플랫폼 조회가 일시적으로 실패하면 마지막으로 알려진 사각형을 쓴다.
    /// 창이 사라졌다고 확인되면(`Ok(None)`) 기록을 지우고 무효로 본다.
    fn lookup(&self, window_id: u32) -> Result<Rect, CaptureError> {
        match self.grabber.window_info(window_id) {
            Ok(Some(info)) => {
                self.last_known.lock().insert(window_id, info.rect);
                Ok(info.rect)
            }
            Ok(None) => {
                self.last_known.lock().remove(&window_id);
                Err(CaptureError::WindowInvalid { window_id })
            }
            Err(e) => match self.last_known.lock().get(&window_id).copied() {
                Some(rect) => {
                    debug!(window_id, "창 조회 실패, 마지막 위치 사용: {e}");
                    Ok(rect)
                }
                None => {
                    debug!(window_id, "창 조회 실패: {e}");
                    Err(CaptureError::WindowInvalid { window_id })
                }
            },
        }
    }

    fn try_method(
        &self,
        method: CaptureMethod,
        handle: &RegionHandle,
        window: &Rect,
        relative: &Rect,
        last_resort: bool,
    ) -> Result<RgbaImage, String> {
        let image = match method {
            CaptureMethod::WindowSurface => {
                let surface = self
                    .grabber
                    .capture_window(handle.window_id)
                    .map_err(|e| e.to_string())?;
                crop(&surface, &Rect::new(0, 0, surface.width(), surface.height()), relative)?
            }
            CaptureMethod::CompositorRect => {
                let absolute = relative.anchored_at(window);
                let (monitor, shot) = self
                    .grabber
                    .capture_monitor_at(absolute.x, absolute.y)
                    .map_err(|e| e.to_string())?;
                crop(&shot, &monitor, &absolute)?
            }
            CaptureMethod::DesktopCrop => {
                let absolute = relative.anchored_at(window);
                let monitors = self
                    .grabber
                    .capture_all_monitors()
                    .map_err(|e| e.to_string())?;
                compose(&monitors, &absolute)?
            }
        };

        if image.width() == 0 || image.height() == 0 {
            return Err("빈 이미지".to_string());
        }
        if is_blank(&image, self.blank_threshold) {
            if !last_resort {
                return Err("검은 이미지".to_string());
            }
            debug!(region = %handle.id, %method, "어두운 화면을 그대로 사용");
        }
        Ok(image)
    }

    fn warn_composited_once(&self, region: RegionId, method: CaptureMethod) {
        if self.composited_warned.lock().insert(region) {
            warn!(
                %region,
                %method,
                "창 표면 캡처 불가 — 합성 화면 캡처로 대체 (오버레이가 함께 찍힐 수 있음)"
            );
        }
    }
}

impl<G: ScreenGrabber> CaptureSource for WindowCapture<G> {
    fn capture(&self, handle: &RegionHandle) -> Result<Frame, CaptureError> {
        let window = self.lookup(handle.window_id)?;
        let relative = handle
            .clamp_to_window(window.w, window.h)
            .ok_or(CaptureError::EmptyRegion {
                window_id: handle.window_id,
            })?;

        let mut attempts = Vec::with_capacity(self.methods.len());
        let last = self.methods.len().saturating_sub(1);
        for (i, &method) in self.methods.iter().enumerate() {
            match self.try_method(method, handle, &window, &relative, i == last) {
                Ok(image) => {
                    if method.is_composited() {
                        self.warn_composited_once(handle.id, method);
                    }
                    let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
                    return Ok(Frame::new(seq, DynamicImage::ImageRgba8(image), method));
                }
                Err(reason) => {
                    debug!(region = %handle.id, %method, "캡처 방식 실패: {reason}");
                    attempts.push((method, reason));
                }
            }
        }

        Err(CaptureError::Exhausted { attempts })
    }
}

impl<G: ScreenGrabber> WindowProvider for WindowCapture<G> {
    fn get_absolute_rect(&self, handle: &RegionHandle) -> Result<Rect, CaptureError> {
        let window = self.lookup(handle.window_id)?;
        handle
            .clamp_to_window(window.w, window.h)
            .map(|relative| relative.anchored_at(&window))
            .ok_or(CaptureError::EmptyRegion {
                window_id: handle.window_id,
            })
    }
}

/// `source`(화면 사각형 `source_rect`)에서 절대 사각형 `target` 잘라내기
fn crop(source: &RgbaImage, source_rect: &Rect, target: &Rect) -> Result<RgbaImage, String> {
    let visible = target
        .intersect(source_rect)
        .ok_or_else(|| "캡처 이미지 범위 밖".to_string())?;
    let x = (visible.x as i64 - source_rect.x as i64) as u32;
    let y = (visible.y as i64 - source_rect.y as i64) as u32;

    // DPI 배율 등으로 이미지가 사각형보다 작을 수 있다
    let (iw, ih) = source.dimensions();
    if x >= iw || y >= ih {
        return Err("캡처 이미지 범위 밖".to_string());
    }
    let w = visible.w.min(iw - x);
    let h = visible.h.min(ih - y);
    Ok(source.view(x, y, w, h).to_image())
}

/// 여러 모니터 이미지를 합쳐 절대 사각형 `target` 구성
fn compose(monitors: &[(Rect, RgbaImage)], target: &Rect) -> Result<RgbaImage, String> {
    let mut canvas = RgbaImage::new(target.w, target.h);
    let mut covered = false;
    for (rect, shot) in monitors {
        let Ok(part) = crop(shot, rect, target) else {
            continue;
        };
        let Some(visible) = target.intersect(rect) else {
            continue;
        };
        let dx = visible.x as i64 - target.x as i64;
        let dy = visible.y as i64 - target.y as i64;
        imageops::replace(&mut canvas, &part, dx, dy);
        covered = true;
    }
    if covered {
        Ok(canvas)
    } else {
        Err("어느 모니터에도 걸치지 않음".to_string())
    }
}

/// 평균 휘도가 임계값 미만이면 검은 이미지
fn is_blank(image: &RgbaImage, threshold: u8) -> bool {
    let pixels = image.width() as u64 * image.height() as u64;
    if pixels == 0 {
        return true;
    }
    let sum: u64 = image
        .pixels()
        .map(|p| {
            let [r, g, b, _] = p.0;
            // ITU-R BT.601
            (299 * r as u64 + 587 * g as u64 + 114 * b as u64) / 1000
        })
        .sum();
    sum / pixels < threshold as u64
}
