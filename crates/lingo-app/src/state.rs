//! 영역 상태 머신.
//!
//! `Idle → Polling → Detecting → (Skip | Extracting) → Translating →
//! Rendering → Polling`, `Stopped`는 어느 상태에서든 도달하는 종료 상태.
//!
//! 폴링 태스크와 사이클 워커가 같은 채널에 상태를 쓴다. 사이클 단계
//! (추출/번역/렌더) 동안에는 폴링 단계 전이가 무시되고, `Stopped` 이후에는
//! 어떤 전이도 반영되지 않는다.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

/// 영역 파이프라인 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionState {
    Idle,
    Polling,
    Detecting,
    Skip,
    Extracting,
    Translating,
    Rendering,
    Stopped,
}

impl RegionState {
    /// 사이클 워커가 진행 중인 단계인지
    pub fn is_cycle_phase(&self) -> bool {
        matches!(
            self,
            RegionState::Extracting | RegionState::Translating | RegionState::Rendering
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RegionState::Idle => "idle",
            RegionState::Polling => "polling",
            RegionState::Detecting => "detecting",
            RegionState::Skip => "skip",
            RegionState::Extracting => "extracting",
            RegionState::Translating => "translating",
            RegionState::Rendering => "rendering",
            RegionState::Stopped => "stopped",
        }
    }
}

impl fmt::Display for RegionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 상태 게시 핸들 — 폴링 태스크, 사이클 워커, 오케스트레이터가 공유
#[derive(Debug, Clone)]
pub struct StateCell {
    tx: Arc<watch::Sender<RegionState>>,
}

impl StateCell {
    pub fn new() -> (Self, watch::Receiver<RegionState>) {
        let (tx, rx) = watch::channel(RegionState::Idle);
        (Self { tx: Arc::new(tx) }, rx)
    }

    pub fn current(&self) -> RegionState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<RegionState> {
        self.tx.subscribe()
    }

    /// 폴링 단계 전이 (Polling / Detecting / Skip)
    pub fn poll_phase(&self, next: RegionState) {
        self.tx.send_if_modified(|state| {
            if *state == RegionState::Stopped || state.is_cycle_phase() || *state == next {
                return false;
            }
            *state = next;
            true
        });
    }

    /// 사이클 단계 전이 (Extracting / Translating / Rendering, 종료 시 Polling)
    pub fn cycle_phase(&self, next: RegionState) {
        self.tx.send_if_modified(|state| {
            if *state == RegionState::Stopped || *state == next {
                return false;
            }
            *state = next;
            true
        });
    }

    /// 종료 상태로 전이. 이미 종료되었으면 false.
    pub fn stop(&self) -> bool {
        self.tx.send_if_modified(|state| {
            if *state == RegionState::Stopped {
                return false;
            }
            *state = RegionState::Stopped;
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle() {
        let (cell, rx) = StateCell::new();
        assert_eq!(cell.current(), RegionState::Idle);
        assert_eq!(*rx.borrow(), RegionState::Idle);
    }

    #[test]
    fn poll_phase_does_not_override_cycle() {
        let (cell, _rx) = StateCell::new();
        cell.poll_phase(RegionState::Polling);
        cell.cycle_phase(RegionState::Translating);
        cell.poll_phase(RegionState::Detecting);
        assert_eq!(cell.current(), RegionState::Translating);

        cell.cycle_phase(RegionState::Polling);
        cell.poll_phase(RegionState::Detecting);
        assert_eq!(cell.current(), RegionState::Detecting);
    }

    #[test]
    fn stopped_is_terminal() {
        let (cell, _rx) = StateCell::new();
        assert!(cell.stop());
        assert!(!cell.stop());
        cell.poll_phase(RegionState::Polling);
        cell.cycle_phase(RegionState::Rendering);
        assert_eq!(cell.current(), RegionState::Stopped);
    }

    #[tokio::test]
    async fn subscribers_observe_stop() {
        let (cell, mut rx) = StateCell::new();
        let waiter = tokio::spawn(async move {
            rx.wait_for(|s| *s == RegionState::Stopped).await.map(|s| *s)
        });
        cell.poll_phase(RegionState::Polling);
        cell.stop();
        assert_eq!(waiter.await.unwrap().unwrap(), RegionState::Stopped);
    }

    #[test]
    fn serializes_snake_case() {
        let json = serde_json::to_string(&RegionState::Extracting).unwrap();
        assert_eq!(json, "\"extracting\"");
    }
}
