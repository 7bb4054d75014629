//! Win32 오버레이 표면.
//!
//! 가상 데스크톱 전체를 덮는 layered 팝업 창 하나에 모든 영역의 박스를
//! 그린다. `WS_EX_TRANSPARENT`로 클릭이 아래 창으로 통과하고, 색상 키로
//! 박스 밖은 투명하다. 창과 메시지 루프는 전용 UI 스레드가 소유하며
//! 다른 스레드는 박스 목록만 바꾸고 다시 그리기 메시지를 보낸다.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::c_void;
use std::sync::mpsc;
use std::sync::{Arc, Once};
use std::thread::JoinHandle;

use lingo_core::error::CoreError;
use lingo_core::models::capture::RegionId;
use lingo_core::models::overlay::OverlayBox;
use lingo_core::ports::overlay::OverlaySurface;
use parking_lot::Mutex;
use tracing::{debug, info, warn};
use windows::core::w;
use windows::Win32::Foundation::{COLORREF, HWND, LPARAM, LRESULT, RECT, WPARAM};
use windows::Win32::Graphics::Gdi::{
    BeginPaint, BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, CreateFontIndirectW,
    CreateSolidBrush, DeleteDC, DeleteObject, DrawTextW, EndPaint, FillRect, FrameRect,
    InvalidateRect, SelectObject, SetBkMode, SetTextColor, CLEARTYPE_QUALITY, DEFAULT_CHARSET,
    DT_END_ELLIPSIS, DT_LEFT, DT_SINGLELINE, DT_VCENTER, FW_SEMIBOLD, HDC, LOGFONTW,
    PAINTSTRUCT, SRCCOPY, TRANSPARENT,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetMessageW,
    GetSystemMetrics, PostMessageW, PostQuitMessage, RegisterClassW, SetLayeredWindowAttributes,
    ShowWindow, TranslateMessage, LWA_COLORKEY, MSG, SM_CXVIRTUALSCREEN, SM_CYVIRTUALSCREEN,
    SM_XVIRTUALSCREEN, SM_YVIRTUALSCREEN, SW_SHOWNOACTIVATE, WM_APP, WM_CLOSE, WM_DESTROY,
    WM_ERASEBKGND, WM_PAINT, WNDCLASSW, WS_EX_LAYERED, WS_EX_NOACTIVATE, WS_EX_TOOLWINDOW,
    WS_EX_TOPMOST, WS_EX_TRANSPARENT, WS_POPUP,
};

use crate::style::{box_style, Rgb};

/// 박스 목록이 바뀌었으니 다시 그려라
const WM_APP_REDRAW: u32 = WM_APP + 1;

/// 글자와 박스 테두리 사이 여백 (px)
const TEXT_PADDING: i32 = 4;

static REGISTER_CLASS: Once = Once::new();

type SharedBoxes = Arc<Mutex<HashMap<RegionId, Vec<OverlayBox>>>>;

thread_local! {
    /// UI 스레드에서 창 프로시저가 읽는 박스 목록
    static UI_BOXES: RefCell<Option<SharedBoxes>> = const { RefCell::new(None) };
}

/// 가상 데스크톱 원점과 크기
#[derive(Debug, Clone, Copy)]
struct Desktop {
    x: i32,
    y: i32,
    w: i32,
    h: i32,
}

impl Desktop {
    fn current() -> Self {
        unsafe {
            Self {
                x: GetSystemMetrics(SM_XVIRTUALSCREEN),
                y: GetSystemMetrics(SM_YVIRTUALSCREEN),
                w: GetSystemMetrics(SM_CXVIRTUALSCREEN),
                h: GetSystemMetrics(SM_CYVIRTUALSCREEN),
            }
        }
    }
}

/// Win32 layered 창 표면
pub struct NativeSurface {
    boxes: SharedBoxes,
    /// HWND는 Send가 아니라 정수로 보관
    hwnd: isize,
    ui_thread: Option<JoinHandle<()>>,
}

impl NativeSurface {
    /// UI 스레드를 띄우고 창이 만들어질 때까지 대기
    pub fn spawn() -> Result<Self, CoreError> {
        let boxes: SharedBoxes = Arc::new(Mutex::new(HashMap::new()));
        let (ready_tx, ready_rx) = mpsc::channel();

        let shared = boxes.clone();
        let ui_thread = std::thread::Builder::new()
            .name("lingo-overlay".to_string())
            .spawn(move || run_window(shared, ready_tx))?;

        let hwnd = ready_rx
            .recv()
            .map_err(|_| CoreError::Internal("오버레이 스레드가 창 생성 전에 종료됨".to_string()))?
            .map_err(CoreError::Internal)?;

        info!("네이티브 오버레이 창 생성");
        Ok(Self {
            boxes,
            hwnd,
            ui_thread: Some(ui_thread),
        })
    }

    fn post(&self, msg: u32) {
        let hwnd = HWND(self.hwnd as *mut c_void);
        if let Err(e) = unsafe { PostMessageW(Some(hwnd), msg, WPARAM(0), LPARAM(0)) } {
            warn!("오버레이 창 메시지 전송 실패: {e}");
        }
    }
}

impl OverlaySurface for NativeSurface {
    fn replace(&self, region: RegionId, boxes: &[OverlayBox]) {
        self.boxes.lock().insert(region, boxes.to_vec());
        self.post(WM_APP_REDRAW);
    }

    fn reposition(&self, region: RegionId, boxes: &[OverlayBox]) {
        self.boxes.lock().insert(region, boxes.to_vec());
        self.post(WM_APP_REDRAW);
    }

    fn clear(&self, region: RegionId) {
        if self.boxes.lock().remove(&region).is_some() {
            self.post(WM_APP_REDRAW);
        }
    }
}

impl Drop for NativeSurface {
    fn drop(&mut self) {
        self.post(WM_CLOSE);
        if let Some(thread) = self.ui_thread.take() {
            if thread.join().is_err() {
                warn!("오버레이 UI 스레드 비정상 종료");
            }
        }
        debug!("네이티브 오버레이 창 정리");
    }
}

/// UI 스레드 본체 — 창 생성 후 메시지 루프
fn run_window(boxes: SharedBoxes, ready: mpsc::Sender<Result<isize, String>>) {
    UI_BOXES.with(|cell| *cell.borrow_mut() = Some(boxes));

    let hwnd = match unsafe { create_window() } {
        Ok(hwnd) => hwnd,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };
    let _ = ready.send(Ok(hwnd.0 as isize));

    unsafe {
        let mut msg = MSG::default();
        while GetMessageW(&mut msg, None, 0, 0).as_bool() {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
    UI_BOXES.with(|cell| *cell.borrow_mut() = None);
}

unsafe fn create_window() -> Result<HWND, String> {
    let instance = GetModuleHandleW(None).map_err(|e| format!("모듈 핸들 조회 실패: {e}"))?;
    let class_name = w!("LingoTranslationOverlay");

    REGISTER_CLASS.call_once(|| {
        let wc = WNDCLASSW {
            lpfnWndProc: Some(overlay_wnd_proc),
            hInstance: instance.into(),
            lpszClassName: class_name,
            ..Default::default()
        };
        RegisterClassW(&wc);
    });

    let desktop = Desktop::current();
    let hwnd = CreateWindowExW(
        WS_EX_LAYERED | WS_EX_TRANSPARENT | WS_EX_TOPMOST | WS_EX_TOOLWINDOW | WS_EX_NOACTIVATE,
        class_name,
        w!("lingo overlay"),
        WS_POPUP,
        desktop.x,
        desktop.y,
        desktop.w,
        desktop.h,
        None,
        None,
        Some(instance.into()),
        None,
    )
    .map_err(|e| format!("오버레이 창 생성 실패: {e}"))?;

    SetLayeredWindowAttributes(
        hwnd,
        COLORREF(Rgb::TRANSPARENT_KEY.to_colorref()),
        0,
        LWA_COLORKEY,
    )
    .map_err(|e| format!("투명 색상 키 설정 실패: {e}"))?;
    let _ = ShowWindow(hwnd, SW_SHOWNOACTIVATE);
    Ok(hwnd)
}

unsafe extern "system" fn overlay_wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_APP_REDRAW => {
            let _ = InvalidateRect(Some(hwnd), None, false);
            LRESULT(0)
        }
        WM_PAINT => {
            paint(hwnd);
            LRESULT(0)
        }
        WM_ERASEBKGND => LRESULT(1),
        WM_CLOSE => {
            let _ = DestroyWindow(hwnd);
            LRESULT(0)
        }
        WM_DESTROY => {
            PostQuitMessage(0);
            LRESULT(0)
        }
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

/// 더블 버퍼로 전체 다시 그리기
unsafe fn paint(hwnd: HWND) {
    let mut ps = PAINTSTRUCT::default();
    let hdc = BeginPaint(hwnd, &mut ps);
    let desktop = Desktop::current();

    let mem_dc = CreateCompatibleDC(Some(hdc));
    let bitmap = CreateCompatibleBitmap(hdc, desktop.w, desktop.h);
    let old_bitmap = SelectObject(mem_dc, bitmap.into());

    let key = CreateSolidBrush(COLORREF(Rgb::TRANSPARENT_KEY.to_colorref()));
    let full = RECT {
        left: 0,
        top: 0,
        right: desktop.w,
        bottom: desktop.h,
    };
    FillRect(mem_dc, &full, key);
    let _ = DeleteObject(key.into());

    let snapshot: Vec<OverlayBox> = UI_BOXES.with(|cell| {
        cell.borrow()
            .as_ref()
            .map(|boxes| boxes.lock().values().flatten().cloned().collect())
            .unwrap_or_default()
    });
    SetBkMode(mem_dc, TRANSPARENT);
    for overlay in &snapshot {
        draw_box(mem_dc, overlay, &desktop);
    }

    let _ = BitBlt(hdc, 0, 0, desktop.w, desktop.h, Some(mem_dc), 0, 0, SRCCOPY);
    SelectObject(mem_dc, old_bitmap);
    let _ = DeleteObject(bitmap.into());
    let _ = DeleteDC(mem_dc);
    let _ = EndPaint(hwnd, &ps);
}

unsafe fn draw_box(hdc: HDC, overlay: &OverlayBox, desktop: &Desktop) {
    let style = box_style(overlay);
    let b = overlay.absolute_bbox;
    let rect = RECT {
        left: b.x - desktop.x,
        top: b.y - desktop.y,
        right: b.x - desktop.x + b.w as i32,
        bottom: b.y - desktop.y + b.h as i32,
    };

    let fill = CreateSolidBrush(COLORREF(style.fill.to_colorref()));
    FillRect(hdc, &rect, fill);
    let _ = DeleteObject(fill.into());
    let border = CreateSolidBrush(COLORREF(style.border.to_colorref()));
    FrameRect(hdc, &rect, border);
    let _ = DeleteObject(border.into());

    let mut font = LOGFONTW {
        lfHeight: -(overlay.font_size as i32),
        lfWeight: FW_SEMIBOLD.0 as i32,
        lfCharSet: DEFAULT_CHARSET,
        lfQuality: CLEARTYPE_QUALITY,
        ..Default::default()
    };
    for (dst, src) in font.lfFaceName.iter_mut().zip("Segoe UI".encode_utf16()) {
        *dst = src;
    }
    let hfont = CreateFontIndirectW(&font);
    let old_font = SelectObject(hdc, hfont.into());
    SetTextColor(hdc, COLORREF(style.text.to_colorref()));

    let mut text: Vec<u16> = overlay.display_text.encode_utf16().collect();
    let mut text_rect = RECT {
        left: rect.left + TEXT_PADDING,
        right: rect.right - TEXT_PADDING,
        ..rect
    };
    DrawTextW(
        hdc,
        &mut text,
        &mut text_rect,
        DT_LEFT | DT_VCENTER | DT_SINGLELINE | DT_END_ELLIPSIS,
    );

    SelectObject(hdc, old_font);
    let _ = DeleteObject(hfont.into());
}
