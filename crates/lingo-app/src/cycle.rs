//! 파이프라인 사이클 — 추출 → 번역 → 렌더.
//!
//! 변경이 감지된 프레임 하나를 처리한다. 영역당 하나의 워커가 순차로
//! 실행하며, 사이클 안에서 텍스트 영역별 번역은 동시에 진행된다.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use lingo_core::config::AppConfig;
use lingo_core::error::{CaptureError, ExtractionError};
use lingo_core::models::capture::{Frame, RegionHandle};
use lingo_core::models::text::TextRegion;
use lingo_core::models::translation::PlacedTranslation;
use lingo_core::ports::text_extractor::TextExtractor;
use lingo_core::ports::translation::Translator;
use lingo_overlay::{ApplyOutcome, OverlayRenderer, RenderBatch};
use tracing::{debug, info, warn};

use crate::event_bus::{EventBus, PipelineEvent};
use crate::state::{RegionState, StateCell};

/// 사이클 설정
#[derive(Debug, Clone)]
pub struct CycleSettings {
    pub source_lang: String,
    pub target_lang: String,
    pub extraction_timeout: Duration,
    pub min_text_confidence: f32,
}

impl CycleSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            source_lang: config.translation.source_lang.clone(),
            target_lang: config.translation.target_lang.clone(),
            extraction_timeout: config.extraction_timeout(),
            min_text_confidence: config.pipeline.min_text_confidence,
        }
    }
}

/// 사이클 결과
#[derive(Debug)]
pub enum CycleOutcome {
    /// 렌더러까지 도달 (적용/폐기 여부는 `ApplyOutcome`)
    Rendered {
        outcome: ApplyOutcome,
        /// 번역 실패한 텍스트 영역 수
        failed: usize,
    },
    /// 추출 실패 — 오버레이 변경 없음
    ExtractionFailed(ExtractionError),
    /// 적용 중 대상 창 무효 — 폴링 태스크가 영역을 중단시킨다
    WindowLost(CaptureError),
}

impl CycleOutcome {
    /// 같은 화면을 나중에 다시 처리해야 하는지 (추출 실패 또는 번역 일부 실패)
    pub fn needs_retry(&self) -> bool {
        match self {
            CycleOutcome::Rendered { failed, .. } => *failed > 0,
            CycleOutcome::ExtractionFailed(_) => true,
            CycleOutcome::WindowLost(_) => false,
        }
    }
}

/// 보고한 번역 실패 텍스트 목록이 이 크기에 닿으면 비운다
const FAILURE_LOG_CAPACITY: usize = 256;

/// 영역별 번역 실패 보고 기록.
///
/// 같은 텍스트의 실패는 한 번만 알린다. 번역에 성공하면 해당 텍스트가,
/// 실패 없이 끝난 사이클이면 전체가 지워진다.
#[derive(Debug, Default)]
pub struct FailureLog {
    reported: HashSet<String>,
}

impl FailureLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 처음 보고하는 실패면 true
    pub fn first_report(&mut self, text: &str) -> bool {
        if self.reported.contains(text) {
            return false;
        }
        if self.reported.len() >= FAILURE_LOG_CAPACITY {
            self.reported.clear();
        }
        self.reported.insert(text.to_string())
    }

    pub fn succeeded(&mut self, text: &str) {
        self.reported.remove(text);
    }

    pub fn clear(&mut self) {
        self.reported.clear();
    }

    pub fn len(&self) -> usize {
        self.reported.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reported.is_empty()
    }
}

/// 사이클 실행기 — 모든 영역이 공유
pub struct CycleRunner {
    extractor: Arc<dyn TextExtractor>,
    translator: Arc<dyn Translator>,
    renderer: Arc<OverlayRenderer>,
    events: EventBus,
    settings: CycleSettings,
}

impl CycleRunner {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        translator: Arc<dyn Translator>,
        renderer: Arc<OverlayRenderer>,
        events: EventBus,
        settings: CycleSettings,
    ) -> Self {
        Self {
            extractor,
            translator,
            renderer,
            events,
            settings,
        }
    }

    pub fn renderer(&self) -> &Arc<OverlayRenderer> {
        &self.renderer
    }

    pub fn settings(&self) -> &CycleSettings {
        &self.settings
    }

    /// 프레임 하나 처리
    ///
    /// 번역 실패는 `failures`에 처음 기록될 때만 경고와 이벤트로 알린다.
    pub async fn run(
        &self,
        handle: &RegionHandle,
        frame: Frame,
        state: &StateCell,
        failures: &mut FailureLog,
    ) -> CycleOutcome {
        let seq = frame.seq;

        // 1. 추출
        state.cycle_phase(RegionState::Extracting);
        let regions = match self.extract(&frame).await {
            Ok(regions) => regions,
            Err(e) => {
                warn!(region = %handle.id, seq, extractor = self.extractor.name(), "텍스트 추출 실패: {e}");
                self.events.publish(PipelineEvent::ExtractionFailed {
                    region: handle.id,
                    reason: e.to_string(),
                });
                return CycleOutcome::ExtractionFailed(e);
            }
        };

        let total = regions.len();
        let regions: Vec<TextRegion> = regions
            .into_iter()
            .filter(|r| r.is_translatable(self.settings.min_text_confidence))
            .collect();
        debug!(region = %handle.id, seq, total, kept = regions.len(), "텍스트 영역 추출");

        // 2. 번역 (영역별 동시)
        state.cycle_phase(RegionState::Translating);
        let translator = &self.translator;
        let settings = &self.settings;
        let results = join_all(regions.iter().map(|region| {
            translator.translate(&region.text, &settings.source_lang, &settings.target_lang)
        }))
        .await;

        let mut batch = RenderBatch::default();
        for (region, result) in regions.into_iter().zip(results) {
            match result {
                Ok(unit) => {
                    failures.succeeded(&region.text);
                    batch.translated.push(PlacedTranslation {
                        bbox: region.bbox,
                        unit,
                    });
                }
                Err(failure) => {
                    if failures.first_report(&region.text) {
                        warn!(region = %handle.id, "{failure}");
                        self.events.publish(PipelineEvent::TranslationFailed {
                            region: handle.id,
                            text: region.text.clone(),
                            reason: failure.to_string(),
                        });
                    }
                    batch.failed.push(region.bbox);
                }
            }
        }
        let failed = batch.failed.len();
        if failed == 0 {
            failures.clear();
        }

        // 3. 렌더
        state.cycle_phase(RegionState::Rendering);
        let outcome = match self.renderer.apply(handle, seq, batch) {
            Ok(outcome) => outcome,
            Err(e) => return CycleOutcome::WindowLost(e),
        };

        match outcome {
            ApplyOutcome::Applied { boxes, carried } => {
                info!(region = %handle.id, seq, boxes, carried, failed, "사이클 완료");
                self.events.publish(PipelineEvent::CycleCompleted {
                    region: handle.id,
                    seq,
                    boxes,
                    carried,
                });
            }
            ApplyOutcome::Stale { .. } | ApplyOutcome::Closed => {
                debug!(region = %handle.id, seq, ?outcome, "사이클 결과 폐기");
                self.events.publish(PipelineEvent::CycleDiscarded {
                    region: handle.id,
                    seq,
                });
            }
        }
        CycleOutcome::Rendered { outcome, failed }
    }

    async fn extract(&self, frame: &Frame) -> Result<Vec<TextRegion>, ExtractionError> {
        let timeout = self.settings.extraction_timeout;
        tokio::time::timeout(timeout, self.extractor.extract(frame.image.clone()))
            .await
            .map_err(|_| ExtractionError::Timeout(timeout))?
    }
}
