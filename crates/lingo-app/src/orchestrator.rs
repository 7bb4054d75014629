//! 파이프라인 오케스트레이터.
//!
//! 모니터링 영역마다 두 개의 태스크를 띄운다.
//!
//! - 폴링 태스크: 고정 간격 캡처 + 변경 감지, 렌더 틱마다 창 위치 추적
//! - 사이클 워커: 변경된 프레임의 추출/번역/렌더
//!
//! 둘 사이는 깊이 1의 프레임 슬롯(`watch`)으로 연결된다. 사이클이 진행 중일
//! 때 새 변경이 감지되면 대기 중인 프레임을 덮어쓴다 (최신 프레임 우선).
//! 실패한 사이클은 [`RetryPolicy`]에 따라 대기 후 같은 화면을 다시 처리한다.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use lingo_core::config::AppConfig;
use lingo_core::error::CaptureError;
use lingo_core::models::capture::{Frame, RegionHandle, RegionId};
use lingo_core::ports::capture::CaptureSource;
use lingo_vision::change_detector::ChangeDetector;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, trace, warn};

use crate::cycle::{CycleRunner, FailureLog};
use crate::event_bus::{EventBus, PipelineEvent};
use crate::retry::{RetryPolicy, RetryState};
use crate::state::{RegionState, StateCell};

/// 폴링 설정
#[derive(Debug, Clone)]
pub struct PollSettings {
    pub poll_interval: Duration,
    pub render_interval: Duration,
    pub hash_size: u32,
    pub change_threshold: u32,
    pub retry: RetryPolicy,
}

impl PollSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            render_interval: config.render_interval(),
            hash_size: config.pipeline.hash_size,
            change_threshold: config.pipeline.change_threshold,
            retry: RetryPolicy::from_config(config),
        }
    }
}

struct RegionTask {
    handle: RegionHandle,
    state: StateCell,
    poller: JoinHandle<Result<(), CaptureError>>,
}

/// 파이프라인 오케스트레이터
pub struct PipelineOrchestrator {
    source: Arc<dyn CaptureSource>,
    runner: Arc<CycleRunner>,
    events: EventBus,
    settings: PollSettings,
    regions: Mutex<HashMap<RegionId, RegionTask>>,
}

impl PipelineOrchestrator {
    pub fn new(
        source: Arc<dyn CaptureSource>,
        runner: Arc<CycleRunner>,
        events: EventBus,
        settings: PollSettings,
    ) -> Self {
        Self {
            source,
            runner,
            events,
            settings,
            regions: Mutex::new(HashMap::new()),
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// 영역 모니터링 시작 — 상태 수신기 반환
    ///
    /// 이미 모니터링 중인 영역이면 기존 상태 수신기를 돌려준다.
    pub fn start_region(&self, handle: RegionHandle) -> watch::Receiver<RegionState> {
        let mut regions = self.regions.lock();
        if let Some(task) = regions.get(&handle.id) {
            return task.state.subscribe();
        }

        let (state, rx) = StateCell::new();
        let detector = Arc::new(Mutex::new(ChangeDetector::new(
            self.settings.hash_size,
            self.settings.change_threshold,
        )));
        let (frame_tx, frame_rx) = watch::channel::<Option<Frame>>(None);

        self.runner.renderer().open(&handle);

        tokio::spawn(cycle_worker(
            handle,
            self.runner.clone(),
            detector.clone(),
            state.clone(),
            frame_rx,
            self.settings.retry,
        ));
        let poller = tokio::spawn(poll_region(
            handle,
            self.source.clone(),
            self.runner.clone(),
            self.events.clone(),
            detector,
            state.clone(),
            frame_tx,
            self.settings.clone(),
        ));

        info!(
            region = %handle.id,
            window_id = handle.window_id,
            poll_ms = self.settings.poll_interval.as_millis() as u64,
            "영역 모니터링 시작"
        );
        self.events.publish(PipelineEvent::RegionStarted {
            region: handle.id,
            window_id: handle.window_id,
        });

        regions.insert(
            handle.id,
            RegionTask {
                handle,
                state,
                poller,
            },
        );
        rx
    }

    /// 영역 모니터링 중단 — 폴링 즉시 취소, 오버레이 제거
    ///
    /// 진행 중인 사이클은 끝까지 돌 수 있지만 결과는 적용되지 않는다.
    pub fn stop_region(&self, region: RegionId) -> bool {
        let regions = self.regions.lock();
        let Some(task) = regions.get(&region) else {
            return false;
        };

        task.poller.abort();
        self.runner.renderer().clear(region);
        if task.state.stop() {
            info!(%region, "영역 모니터링 중단");
            self.events.publish(PipelineEvent::RegionStopped {
                region,
                error: None,
            });
        }
        true
    }

    /// 모든 영역 중단
    pub fn stop_all(&self) {
        let ids: Vec<RegionId> = self.regions.lock().keys().copied().collect();
        for id in ids {
            self.stop_region(id);
        }
    }

    /// 영역 태스크 종료 대기 및 결과 회수
    ///
    /// 캡처 에러로 중단된 영역은 그 에러를, 정상 중단은 `Ok(())`를 돌려준다.
    /// 모르는 영역이면 None.
    pub async fn join_region(&self, region: RegionId) -> Option<Result<(), CaptureError>> {
        let task = self.regions.lock().remove(&region)?;
        let result = match task.poller.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Ok(()),
            Err(e) => Err(CaptureError::Task(e.to_string())),
        };
        Some(result)
    }

    /// 영역 현재 상태
    pub fn state(&self, region: RegionId) -> Option<RegionState> {
        self.regions.lock().get(&region).map(|t| t.state.current())
    }

    /// 모니터링 중인(종료되지 않은) 영역
    pub fn active_regions(&self) -> Vec<RegionHandle> {
        self.regions
            .lock()
            .values()
            .filter(|t| t.state.current() != RegionState::Stopped)
            .map(|t| t.handle)
            .collect()
    }
}

impl Drop for PipelineOrchestrator {
    fn drop(&mut self) {
        for task in self.regions.get_mut().values() {
            task.poller.abort();
        }
    }
}

/// 폴링 루프 — 캡처 에러로만 종료 (중단은 abort)
#[allow(clippy::too_many_arguments)]
async fn poll_region(
    handle: RegionHandle,
    source: Arc<dyn CaptureSource>,
    runner: Arc<CycleRunner>,
    events: EventBus,
    detector: Arc<Mutex<ChangeDetector>>,
    state: StateCell,
    frame_tx: watch::Sender<Option<Frame>>,
    settings: PollSettings,
) -> Result<(), CaptureError> {
    let mut poll = tokio::time::interval(settings.poll_interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut render = tokio::time::interval(settings.render_interval);
    render.set_missed_tick_behavior(MissedTickBehavior::Skip);

    state.poll_phase(RegionState::Polling);

    let result = loop {
        tokio::select! {
            _ = poll.tick() => {
                state.poll_phase(RegionState::Detecting);

                let source = source.clone();
                let detector = detector.clone();
                let captured = tokio::task::spawn_blocking(move || {
                    let frame = source.capture(&handle)?;
                    let decision = detector.lock().observe(&frame.image);
                    Ok::<_, CaptureError>((frame, decision))
                })
                .await
                .map_err(|e| CaptureError::Task(e.to_string()))
                .and_then(|r| r);

                match captured {
                    Ok((frame, decision)) if decision.changed => {
                        debug!(
                            region = %handle.id,
                            seq = frame.seq,
                            distance = ?decision.distance,
                            method = %frame.method,
                            "화면 변경 감지"
                        );
                        // 대기 중인 프레임이 있으면 덮어씀
                        frame_tx.send_replace(Some(frame));
                    }
                    Ok((frame, decision)) => {
                        trace!(region = %handle.id, seq = frame.seq, distance = ?decision.distance, "변경 없음");
                        state.poll_phase(RegionState::Skip);
                    }
                    Err(e) => break Err(e),
                }
                state.poll_phase(RegionState::Polling);
            }
            _ = render.tick() => {
                let renderer = runner.renderer().clone();
                let followed = tokio::task::spawn_blocking(move || renderer.follow(&handle))
                    .await
                    .map_err(|e| CaptureError::Task(e.to_string()))
                    .and_then(|r| r);
                if let Err(e) = followed {
                    break Err(e);
                }
            }
        }
    };

    if let Err(e) = &result {
        error!(region = %handle.id, "캡처 에러로 영역 중단: {e}");
        runner.renderer().clear(handle.id);
        if state.stop() {
            events.publish(PipelineEvent::RegionStopped {
                region: handle.id,
                error: Some(e.to_string()),
            });
        }
    }
    result
}

/// 사이클 워커 — 프레임 슬롯이 닫히면(폴링 종료) 끝난다
///
/// 실패한 사이클 뒤에는 backoff 대기 후 변경 감지기를 초기화한다. 그러면
/// 다음 폴링이 같은 화면도 변경으로 보고 다시 넘긴다. 대기 중에 새 화면이
/// 들어오면 예약은 취소된다.
async fn cycle_worker(
    handle: RegionHandle,
    runner: Arc<CycleRunner>,
    detector: Arc<Mutex<ChangeDetector>>,
    state: StateCell,
    mut frames: watch::Receiver<Option<Frame>>,
    policy: RetryPolicy,
) {
    let mut failures = FailureLog::new();
    let mut retry = RetryState::new(policy);
    let mut retry_at: Option<Instant> = None;
    // 다음 프레임이 재시도로 넘어온 것인지
    let mut retrying = false;

    loop {
        let deadline = retry_at.unwrap_or_else(Instant::now);
        tokio::select! {
            changed = frames.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::time::sleep_until(deadline), if retry_at.is_some() => {
                retry_at = None;
                retrying = true;
                detector.lock().reset();
                continue;
            }
        }

        let Some(frame) = frames.borrow_and_update().clone() else {
            continue;
        };
        retry_at = None;
        if !std::mem::take(&mut retrying) {
            retry.reset();
        }

        let outcome = runner.run(&handle, frame, &state, &mut failures).await;
        if outcome.needs_retry() {
            match retry.on_failure() {
                Some(delay) => {
                    debug!(
                        region = %handle.id,
                        attempt = retry.attempts(),
                        delay_ms = delay.as_millis() as u64,
                        "사이클 재시도 예약"
                    );
                    retry_at = Some(Instant::now() + delay);
                }
                None => {
                    warn!(
                        region = %handle.id,
                        attempts = retry.attempts(),
                        "재시도 한도 도달 — 화면이 바뀔 때까지 대기"
                    );
                }
            }
        } else {
            retry.reset();
        }
        state.cycle_phase(RegionState::Polling);
    }
    debug!(region = %handle.id, "사이클 워커 종료");
}
