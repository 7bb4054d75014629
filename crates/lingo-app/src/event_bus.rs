//! 파이프라인 이벤트 버스.
//!
//! `tokio::broadcast` 기반 진단 채널. 구독자가 없으면 이벤트는 버려진다.

use lingo_core::models::capture::RegionId;
use tokio::sync::broadcast;
use tracing::debug;

/// 파이프라인 이벤트
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// 영역 모니터링 시작
    RegionStarted { region: RegionId, window_id: u32 },
    /// 영역 모니터링 종료 (`error`가 있으면 캡처 에러로 중단)
    RegionStopped {
        region: RegionId,
        error: Option<String>,
    },
    /// 사이클 결과가 오버레이에 적용됨
    CycleCompleted {
        region: RegionId,
        seq: u64,
        boxes: usize,
        carried: usize,
    },
    /// 사이클 결과 폐기 (오래된 시퀀스 또는 닫힌 영역)
    CycleDiscarded { region: RegionId, seq: u64 },
    /// 텍스트 추출 실패 — 이번 사이클 포기
    ExtractionFailed { region: RegionId, reason: String },
    /// 모든 번역 티어 소진 — 같은 텍스트는 성공할 때까지 한 번만 보고
    TranslationFailed {
        region: RegionId,
        text: String,
        reason: String,
    },
}

/// 이벤트 버스 — 복제해서 여러 태스크가 발행
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PipelineEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// 이벤트 발행
    pub fn publish(&self, event: PipelineEvent) {
        debug!("이벤트 발행: {:?}", std::mem::discriminant(&event));
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
