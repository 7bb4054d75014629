//! 티어별 레이트 리미터.
//!
//! 두 가지 제약을 건다.
//! - 최소 호출 간격: 직전 호출 시각 + 간격 이전의 호출은 거부
//! - 쿨다운: 백엔드가 요청 한도 초과를 알리면 일정 시간 모든 호출 거부
//!
//! 검사와 호출 시각 기록은 하나의 임계 구역에서 수행된다.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Default)]
struct LimiterState {
    last_call: Option<Instant>,
    cooldown_until: Option<Instant>,
}

/// 티어 하나의 레이트 리미터
#[derive(Debug)]
pub struct TierLimiter {
    min_spacing: Duration,
    cooldown: Duration,
    state: Mutex<LimiterState>,
}

impl TierLimiter {
    pub fn new(min_spacing: Duration, cooldown: Duration) -> Self {
        Self {
            min_spacing,
            cooldown,
            state: Mutex::new(LimiterState::default()),
        }
    }

    /// 호출 허가 시도. 허가되면 호출 시각을 기록하고, 거부되면 남은 대기 시간 반환.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        let now = Instant::now();
        let mut state = self.state.lock();

        if let Some(until) = state.cooldown_until {
            if now < until {
                return Err(until - now);
            }
            state.cooldown_until = None;
        }

        if let Some(last) = state.last_call {
            let next = last + self.min_spacing;
            if now < next {
                return Err(next - now);
            }
        }

        state.last_call = Some(now);
        Ok(())
    }

    /// 백엔드의 요청 한도 초과 신호 — 쿨다운 시작
    ///
    /// 백엔드가 재시도 대기 시간을 주면 설정된 쿨다운과 비교해 긴 쪽을 쓴다.
    pub fn on_rate_limited(&self, retry_after: Option<Duration>) {
        let wait = retry_after.map_or(self.cooldown, |r| r.max(self.cooldown));
        let until = Instant::now() + wait;
        let mut state = self.state.lock();
        state.cooldown_until = Some(state.cooldown_until.map_or(until, |u| u.max(until)));
        debug!(wait_ms = wait.as_millis() as u64, "레이트 리밋 쿨다운 시작");
    }

    /// 쿨다운 중인지
    pub fn is_cooling_down(&self) -> bool {
        self.state
            .lock()
            .cooldown_until
            .is_some_and(|until| Instant::now() < until)
    }
}
