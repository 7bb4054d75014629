//! 실패한 사이클 재시도 — exponential backoff.
//!
//! 같은 화면에서 추출이나 번역이 실패하면 즉시 다시 돌리지 않고 대기 후
//! 변경 감지기를 초기화해 다음 폴링이 화면을 다시 넘기게 한다. 대기는
//! 두 배씩 늘어 상한에서 멈추고, 횟수 한도에 닿으면 화면이 바뀌거나
//! 사이클이 성공할 때까지 재시도하지 않는다.

use std::time::Duration;

use lingo_core::config::AppConfig;

/// 재시도 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub initial: Duration,
    pub max: Duration,
    pub max_retries: u32,
}

impl RetryPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            initial: config.retry_initial(),
            max: config.retry_max(),
            max_retries: config.pipeline.max_retries,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(30),
            max_retries: 5,
        }
    }
}

/// 영역별 재시도 진행 상태
#[derive(Debug)]
pub struct RetryState {
    policy: RetryPolicy,
    attempts: u32,
    delay: Duration,
}

impl RetryState {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
            delay: policy.initial,
        }
    }

    /// 실패 기록 — 다음 재시도까지 대기 시간, 한도를 넘으면 None
    pub fn on_failure(&mut self) -> Option<Duration> {
        if self.attempts >= self.policy.max_retries {
            return None;
        }
        self.attempts += 1;
        let delay = self.delay;
        self.delay = (self.delay * 2).min(self.policy.max);
        Some(delay)
    }

    /// 성공 또는 새 화면 — 처음부터
    pub fn reset(&mut self) {
        self.attempts = 0;
        self.delay = self.policy.initial;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}
