//! 번역 라우터.
//!
//! 1. 캐시 조회 (요청된 언어 쌍 그대로 키 구성)
//! 2. 품질 매트릭스 순서대로 티어 시도. 레이트 리미터가 막으면 건너뜀
//! 3. 백엔드 성공은 신뢰도와 무관하게 최종 결과. 실패/한도 초과면 다음 티어
//! 4. 전부 실패하면 티어별 사유를 담은 `TranslationFailure`
//! 5. 성공 결과는 캐시에 넣고 기록 관찰자에게 통지
//!
//! 한 사이클 안에서 폴백 체인 외의 재시도는 없다.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lingo_core::config::TranslationConfig;
use lingo_core::error::{BackendFailure, TierFailureReason, TranslationFailure};
use lingo_core::models::translation::{TierId, TranslationUnit, AUTO_LANG};
use lingo_core::ports::history::TranslationObserver;
use lingo_core::ports::translation::{BackendTranslation, TranslationBackend, Translator};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::cache::{CacheKey, TranslationCache};
use crate::detect::detect_language;
use crate::quality_matrix::QualityMatrix;
use crate::rate_limiter::TierLimiter;

/// 티어 호출 정책
#[derive(Debug, Clone, Copy, Default)]
pub struct TierPolicy {
    /// 연속 호출 최소 간격
    pub min_call_spacing: Duration,
    /// 한도 초과 신호 후 쿨다운
    pub cooldown_after_rate_limit: Duration,
    /// 동시 호출 불가 — 티어 게이트로 직렬화
    pub serialize_calls: bool,
}

struct TierSlot {
    backend: Arc<dyn TranslationBackend>,
    limiter: TierLimiter,
    /// `serialize_calls` 티어 전용 게이트 (이 백엔드 호출만 막는다)
    gate: Option<tokio::sync::Mutex<()>>,
    successes: AtomicU64,
    failures: AtomicU64,
    skipped: AtomicU64,
}

/// 티어별 통계
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierStats {
    pub tier: TierId,
    pub backend: String,
    pub successes: u64,
    pub failures: u64,
    /// 로컬 레이트 리밋으로 건너뛴 횟수
    pub skipped: u64,
}

/// 라우터 통계
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouterStats {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_len: usize,
    pub tiers: Vec<TierStats>,
}

/// 티어별 번역 라우터
pub struct TranslationRouter {
    tiers: HashMap<TierId, TierSlot>,
    matrix: QualityMatrix,
    cache: TranslationCache,
    backend_timeout: Duration,
    detect_source: bool,
    observer: Option<Arc<dyn TranslationObserver>>,
}

impl TranslationRouter {
    pub fn new(matrix: QualityMatrix, cache_capacity: usize, backend_timeout: Duration) -> Self {
        Self {
            tiers: HashMap::new(),
            matrix,
            cache: TranslationCache::new(cache_capacity),
            backend_timeout,
            detect_source: true,
            observer: None,
        }
    }

    /// 설정 + 티어별 백엔드로 라우터 구성
    ///
    /// 비활성화된 티어와 백엔드가 없는 티어는 등록하지 않는다
    /// (매트릭스에 있으면 "구성되지 않은 티어"로 보고됨).
    pub fn from_config(
        config: &TranslationConfig,
        mut backends: HashMap<TierId, Arc<dyn TranslationBackend>>,
    ) -> Self {
        let mut router = Self::new(
            QualityMatrix::from_config(config),
            config.cache_capacity,
            config.backend_timeout(),
        );
        for tier in config.tiers.iter().filter(|t| t.enabled) {
            let Some(backend) = backends.remove(&tier.id) else {
                warn!(tier = %tier.id, "백엔드 없는 티어 — 건너뜀");
                continue;
            };
            router = router.with_tier(
                tier.id,
                backend,
                TierPolicy {
                    min_call_spacing: tier.min_call_spacing(),
                    cooldown_after_rate_limit: tier.cooldown_after_rate_limit(),
                    serialize_calls: tier.serialize_calls,
                },
            );
        }
        info!(tiers = router.tiers.len(), "번역 라우터 구성 완료");
        router
    }

    /// 티어 등록 (같은 티어면 교체)
    pub fn with_tier(
        mut self,
        tier: TierId,
        backend: Arc<dyn TranslationBackend>,
        policy: TierPolicy,
    ) -> Self {
        self.tiers.insert(
            tier,
            TierSlot {
                backend,
                limiter: TierLimiter::new(policy.min_call_spacing, policy.cooldown_after_rate_limit),
                gate: policy.serialize_calls.then(|| tokio::sync::Mutex::new(())),
                successes: AtomicU64::new(0),
                failures: AtomicU64::new(0),
                skipped: AtomicU64::new(0),
            },
        );
        self
    }

    /// 번역 완료 관찰자 등록
    pub fn with_observer(mut self, observer: Arc<dyn TranslationObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// "auto" 원문 언어 감지 여부 (기본 켜짐)
    pub fn with_language_detection(mut self, enabled: bool) -> Self {
        self.detect_source = enabled;
        self
    }

    pub fn matrix(&self) -> &QualityMatrix {
        &self.matrix
    }

    /// 캐시/티어 통계
    pub fn stats(&self) -> RouterStats {
        let mut tiers: Vec<_> = self
            .tiers
            .iter()
            .map(|(tier, slot)| TierStats {
                tier: *tier,
                backend: slot.backend.name().to_string(),
                successes: slot.successes.load(Ordering::Relaxed),
                failures: slot.failures.load(Ordering::Relaxed),
                skipped: slot.skipped.load(Ordering::Relaxed),
            })
            .collect();
        tiers.sort_by_key(|t| t.tier.rank());
        RouterStats {
            cache_hits: self.cache.hits(),
            cache_misses: self.cache.misses(),
            cache_len: self.cache.len(),
            tiers,
        }
    }

    /// 매트릭스 조회 및 백엔드 전달용 원문 언어
    fn resolve_source<'a>(&self, text: &str, source_lang: &'a str) -> &'a str {
        if source_lang != AUTO_LANG || !self.detect_source {
            return source_lang;
        }
        match detect_language(text) {
            Some(lang) => {
                debug!(lang, "원문 언어 감지");
                lang
            }
            None => AUTO_LANG,
        }
    }

    async fn call_tier(
        &self,
        slot: &TierSlot,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<(BackendTranslation, Duration), BackendFailure> {
        let _permit = match &slot.gate {
            Some(gate) => Some(gate.lock().await),
            None => None,
        };

        let started = Instant::now();
        let timeout = self.backend_timeout;
        tokio::time::timeout(
            timeout,
            slot.backend.translate(text, source_lang, target_lang, timeout),
        )
        .await
        .unwrap_or(Err(BackendFailure::Timeout(timeout)))
        .map(|t| (t, started.elapsed()))
    }
}

#[async_trait]
impl Translator for TranslationRouter {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<TranslationUnit, TranslationFailure> {
        if text.trim().is_empty() {
            return Err(TranslationFailure::empty(source_lang, target_lang));
        }

        let key = CacheKey::new(text, source_lang, target_lang);
        if let Some(unit) = self.cache.get(&key) {
            debug!(text, "번역 캐시 적중");
            return Ok(unit);
        }

        let effective_source = self.resolve_source(text, source_lang);
        let order = self.matrix.lookup(effective_source, target_lang);
        let mut attempts = Vec::with_capacity(order.len());

        for &tier in order {
            let Some(slot) = self.tiers.get(&tier) else {
                attempts.push((tier, TierFailureReason::NotConfigured));
                continue;
            };

            if let Err(wait) = slot.limiter.try_acquire() {
                slot.skipped.fetch_add(1, Ordering::Relaxed);
                debug!(%tier, wait_ms = wait.as_millis() as u64, "로컬 레이트 리밋으로 티어 건너뜀");
                attempts.push((tier, TierFailureReason::RateLimitedLocally { wait }));
                continue;
            }

            match self
                .call_tier(slot, text, effective_source, target_lang)
                .await
            {
                Ok((translation, latency)) => {
                    slot.successes.fetch_add(1, Ordering::Relaxed);
                    let unit = TranslationUnit {
                        source_text: text.to_string(),
                        target_text: translation.text,
                        source_lang: effective_source.to_string(),
                        target_lang: target_lang.to_string(),
                        backend_tier_used: tier,
                        confidence: translation.confidence.clamp(0.0, 1.0),
                        latency,
                    };
                    debug!(
                        %tier,
                        latency_ms = latency.as_millis() as u64,
                        "번역 완료"
                    );
                    self.cache.put(key, unit.clone());
                    if let Some(observer) = &self.observer {
                        observer.on_translation_completed(&unit);
                    }
                    return Ok(unit);
                }
                Err(failure) => {
                    slot.failures.fetch_add(1, Ordering::Relaxed);
                    if let BackendFailure::RateLimited { retry_after } = &failure {
                        slot.limiter.on_rate_limited(*retry_after);
                    }
                    warn!(%tier, backend = slot.backend.name(), "번역 티어 실패: {failure}");
                    attempts.push((tier, TierFailureReason::Backend(failure)));
                }
            }
        }

        Err(TranslationFailure {
            text: text.to_string(),
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            attempts,
            empty_text: false,
        })
    }
}
