//! 번역 기록 수집기.
//!
//! 라우터가 새로 번역한 결과(캐시 제외)를 통지받는다. 모두 논블로킹.

use std::sync::Arc;

use lingo_core::models::translation::TranslationUnit;
use lingo_core::ports::history::TranslationObserver;
use tokio::sync::mpsc;
use tracing::info;

/// tracing 로그로 기록
#[derive(Debug, Default)]
pub struct TracingHistorySink;

impl TranslationObserver for TracingHistorySink {
    fn on_translation_completed(&self, unit: &TranslationUnit) {
        info!(
            tier = %unit.backend_tier_used,
            from = %unit.source_lang,
            to = %unit.target_lang,
            latency_ms = unit.latency.as_millis() as u64,
            confidence = unit.confidence,
            "번역 완료: {} → {}",
            unit.source_text,
            unit.target_text
        );
    }
}

/// 무제한 채널로 전달 — 수신 측이 기록/동기화 담당
#[derive(Debug, Clone)]
pub struct ChannelHistorySink {
    tx: mpsc::UnboundedSender<TranslationUnit>,
}

impl ChannelHistorySink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TranslationUnit>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl TranslationObserver for ChannelHistorySink {
    fn on_translation_completed(&self, unit: &TranslationUnit) {
        // 수신 측이 닫혔으면 버림
        let _ = self.tx.send(unit.clone());
    }
}

/// 여러 수집기에 차례로 전달
#[derive(Default)]
pub struct FanoutHistory {
    sinks: Vec<Arc<dyn TranslationObserver>>,
}

impl FanoutHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn TranslationObserver>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl TranslationObserver for FanoutHistory {
    fn on_translation_completed(&self, unit: &TranslationUnit) {
        for sink in &self.sinks {
            sink.on_translation_completed(unit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingo_core::models::translation::TierId;
    use std::time::Duration;

    fn unit(text: &str) -> TranslationUnit {
        TranslationUnit {
            source_text: text.to_string(),
            target_text: format!("{text}_vi"),
            source_lang: "en".to_string(),
            target_lang: "vi".to_string(),
            backend_tier_used: TierId::LocalLarge,
            confidence: 0.8,
            latency: Duration::from_millis(120),
        }
    }

    #[test]
    fn channel_sink_forwards_units() {
        let (sink, mut rx) = ChannelHistorySink::new();
        sink.on_translation_completed(&unit("Save"));
        let got = rx.try_recv().unwrap();
        assert_eq!(got.target_text, "Save_vi");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn channel_sink_ignores_closed_receiver() {
        let (sink, rx) = ChannelHistorySink::new();
        drop(rx);
        sink.on_translation_completed(&unit("Open"));
    }

    #[test]
    fn fanout_reaches_every_sink() {
        let (a, mut rx_a) = ChannelHistorySink::new();
        let (b, mut rx_b) = ChannelHistorySink::new();
        let fanout = FanoutHistory::new()
            .with(Arc::new(a))
            .with(Arc::new(b))
            .with(Arc::new(TracingHistorySink));
        assert_eq!(fanout.len(), 3);

        fanout.on_translation_completed(&unit("Quit"));
        assert_eq!(rx_a.try_recv().unwrap().source_text, "Quit");
        assert_eq!(rx_b.try_recv().unwrap().source_text, "Quit");
    }
}
