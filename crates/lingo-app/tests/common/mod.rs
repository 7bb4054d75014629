//! 통합 테스트 공용 가짜 어댑터.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use image::{DynamicImage, Rgba, RgbaImage};
use lingo_app::cycle::{CycleRunner, CycleSettings};
use lingo_app::event_bus::{EventBus, PipelineEvent};
use lingo_app::orchestrator::{PipelineOrchestrator, PollSettings};
use lingo_app::retry::RetryPolicy;
use lingo_core::config::OverlayConfig;
use lingo_core::error::{CaptureError, ExtractionError, TranslationFailure};
use lingo_core::models::capture::{CaptureMethod, Frame, RegionHandle};
use lingo_core::models::geometry::Rect;
use lingo_core::models::text::TextRegion;
use lingo_core::models::translation::{TierId, TranslationUnit};
use lingo_core::ports::capture::{CaptureSource, WindowProvider};
use lingo_core::ports::text_extractor::TextExtractor;
use lingo_core::ports::translation::Translator;
use lingo_overlay::{HeadlessSurface, OverlayRenderer};
use parking_lot::Mutex;
use tokio::sync::broadcast;

/// 왼쪽→오른쪽 밝아지는 그라디언트
pub fn gradient() -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(64, 48, |x, _| {
        let v = (x * 4) as u8;
        Rgba([v, v, v, 255])
    }))
}

/// 반대 방향 그라디언트 (지문 거리 최대)
pub fn reversed_gradient() -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(64, 48, |x, _| {
        let v = 255 - (x * 4) as u8;
        Rgba([v, v, v, 255])
    }))
}

/// 가짜 창 + 캡처 소스
pub struct FakeScreen {
    image: Mutex<DynamicImage>,
    window: Mutex<Option<Rect>>,
    seq: AtomicU64,
    pub captures: AtomicUsize,
}

impl FakeScreen {
    pub fn new(image: DynamicImage) -> Self {
        Self {
            image: Mutex::new(image),
            window: Mutex::new(Some(Rect::new(100, 100, 640, 480))),
            seq: AtomicU64::new(0),
            captures: AtomicUsize::new(0),
        }
    }

    pub fn show(&self, image: DynamicImage) {
        *self.image.lock() = image;
    }

    /// 대상 창 닫힘
    pub fn close_window(&self) {
        *self.window.lock() = None;
    }
}

impl CaptureSource for FakeScreen {
    fn capture(&self, handle: &RegionHandle) -> Result<Frame, CaptureError> {
        if self.window.lock().is_none() {
            return Err(CaptureError::WindowInvalid {
                window_id: handle.window_id,
            });
        }
        self.captures.fetch_add(1, Ordering::SeqCst);
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Frame::new(seq, self.image.lock().clone(), CaptureMethod::WindowSurface))
    }
}

impl WindowProvider for FakeScreen {
    fn get_absolute_rect(&self, handle: &RegionHandle) -> Result<Rect, CaptureError> {
        let window = self.window.lock().ok_or(CaptureError::WindowInvalid {
            window_id: handle.window_id,
        })?;
        let rel = handle
            .clamp_to_window(window.w, window.h)
            .ok_or(CaptureError::EmptyRegion {
                window_id: handle.window_id,
            })?;
        Ok(rel.anchored_at(&window))
    }
}

/// 스크립트 추출기 — 현재 설정된 텍스트를 한 줄로 돌려준다
pub struct FakeExtractor {
    lines: Mutex<Vec<TextRegion>>,
    delay: Duration,
    failures_left: AtomicUsize,
    pub calls: AtomicUsize,
}

impl FakeExtractor {
    pub fn new(texts: &[&str]) -> Self {
        let extractor = Self {
            lines: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
            failures_left: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        };
        extractor.set_texts(texts);
        extractor
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// 처음 n번 호출 실패
    pub fn failing_first(self, n: usize) -> Self {
        self.failures_left.store(n, Ordering::SeqCst);
        self
    }

    pub fn set_texts(&self, texts: &[&str]) {
        *self.lines.lock() = texts
            .iter()
            .enumerate()
            .map(|(i, t)| TextRegion::new(*t, Rect::new(10, 10 + i as i32 * 30, 200, 24), 0.9))
            .collect();
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextExtractor for FakeExtractor {
    async fn extract(&self, _image: Arc<DynamicImage>) -> Result<Vec<TextRegion>, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(ExtractionError::Failed("인식 엔진 오류".to_string()));
        }
        Ok(self.lines.lock().clone())
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// "{text}_translated"를 돌려주는 번역기. 지정한 텍스트는 항상 실패.
#[derive(Default)]
pub struct SuffixTranslator {
    failing: Mutex<HashSet<String>>,
    pub calls: AtomicUsize,
    pub broken: AtomicBool,
}

impl SuffixTranslator {
    pub fn fail_on(&self, text: &str) {
        self.failing.lock().insert(text.to_string());
    }

    pub fn heal(&self, text: &str) {
        self.failing.lock().remove(text);
    }
}

#[async_trait]
impl Translator for SuffixTranslator {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<TranslationUnit, TranslationFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.broken.load(Ordering::SeqCst) || self.failing.lock().contains(text) {
            return Err(TranslationFailure {
                text: text.to_string(),
                source_lang: source_lang.to_string(),
                target_lang: target_lang.to_string(),
                attempts: Vec::new(),
                empty_text: false,
            });
        }
        Ok(TranslationUnit {
            source_text: text.to_string(),
            target_text: format!("{text}_translated"),
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            backend_tier_used: TierId::Cloud,
            confidence: 0.9,
            latency: Duration::from_millis(1),
        })
    }
}

/// 테스트 파이프라인 조립 결과
pub struct Harness {
    pub screen: Arc<FakeScreen>,
    pub extractor: Arc<FakeExtractor>,
    pub translator: Arc<SuffixTranslator>,
    pub surface: Arc<HeadlessSurface>,
    pub renderer: Arc<OverlayRenderer>,
    pub events: EventBus,
    pub orchestrator: PipelineOrchestrator,
}

/// 하네스의 같은 화면 재시도 한도
pub const MAX_RETRIES: u32 = 3;

pub fn fast_poll() -> PollSettings {
    PollSettings {
        poll_interval: Duration::from_millis(10),
        render_interval: Duration::from_millis(10),
        hash_size: 8,
        change_threshold: 5,
        retry: RetryPolicy {
            initial: Duration::from_millis(20),
            max: Duration::from_millis(40),
            max_retries: MAX_RETRIES,
        },
    }
}

pub fn harness(extractor: FakeExtractor) -> Harness {
    let screen = Arc::new(FakeScreen::new(gradient()));
    let extractor = Arc::new(extractor);
    let translator = Arc::new(SuffixTranslator::default());
    let surface = Arc::new(HeadlessSurface::new());
    let renderer = Arc::new(OverlayRenderer::new(
        surface.clone(),
        screen.clone(),
        OverlayConfig::default(),
    ));
    let events = EventBus::new(1024);
    let runner = Arc::new(CycleRunner::new(
        extractor.clone(),
        translator.clone(),
        renderer.clone(),
        events.clone(),
        CycleSettings {
            source_lang: "en".to_string(),
            target_lang: "vi".to_string(),
            extraction_timeout: Duration::from_secs(2),
            min_text_confidence: 0.3,
        },
    ));
    let orchestrator =
        PipelineOrchestrator::new(screen.clone(), runner, events.clone(), fast_poll());

    Harness {
        screen,
        extractor,
        translator,
        surface,
        renderer,
        events,
        orchestrator,
    }
}

/// 조건에 맞는 이벤트가 올 때까지 대기 (최대 2초)
pub async fn wait_event<F>(rx: &mut broadcast::Receiver<PipelineEvent>, mut pred: F) -> PipelineEvent
where
    F: FnMut(&PipelineEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match rx.recv().await {
                Ok(event) if pred(&event) => return event,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("이벤트 버스 닫힘"),
            }
        }
    })
    .await
    .expect("이벤트 대기 시간 초과")
}
