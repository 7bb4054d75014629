//! # lingo-overlay
//!
//! 번역 결과를 원문 위치에 겹쳐 그리는 오버레이 렌더러.
//!
//! - [`renderer`] — apply / clear / follow, 프레임 시퀀스 기반 단조 적용
//! - [`surface`] — 메모리 표면 (`HeadlessSurface`, 테스트와 `--headless`)
//! - [`style`] — 박스 색상 계산
//! - `native` — Win32 layered 창 표면 (`native` 기능, Windows 전용)

pub mod renderer;
pub mod style;
pub mod surface;

#[cfg(all(windows, feature = "native"))]
pub mod native;

pub use renderer::{ApplyOutcome, OverlayRenderer, RenderBatch};
pub use surface::HeadlessSurface;

#[cfg(all(windows, feature = "native"))]
pub use native::NativeSurface;
