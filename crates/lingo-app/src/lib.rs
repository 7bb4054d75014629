//! # lingo-app
//!
//! 파이프라인 오케스트레이션 라이브러리. `lingo` 바이너리가 이 위에서
//! 어댑터를 조립한다.
//!
//! - [`orchestrator`] — 영역별 폴링 태스크 + 사이클 워커, 시작/중단
//! - [`cycle`] — 추출 → 번역 → 렌더 한 사이클
//! - [`retry`] — 실패한 사이클 재시도 backoff
//! - [`state`] — 영역 상태 머신 (`watch` 채널로 게시)
//! - [`event_bus`] — 진단 이벤트 (`broadcast`)
//! - [`history`] — 번역 기록 수집기
//! - [`lifecycle`] — 종료 시그널 처리

pub mod cycle;
pub mod event_bus;
pub mod history;
pub mod lifecycle;
pub mod orchestrator;
pub mod retry;
pub mod state;

pub use cycle::{CycleOutcome, CycleRunner, CycleSettings, FailureLog};
pub use event_bus::{EventBus, PipelineEvent};
pub use orchestrator::{PipelineOrchestrator, PollSettings};
pub use retry::{RetryPolicy, RetryState};
pub use state::RegionState;
