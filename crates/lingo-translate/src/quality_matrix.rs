//! 품질 매트릭스 — 언어 쌍 → 티어 시도 순서.
//!
//! 조회 순서: 정확한 쌍 → ("auto", 대상) 와일드카드 → 기본 목록.

use std::collections::HashMap;

use lingo_core::config::{QualityMatrixEntry, TranslationConfig};
use lingo_core::models::translation::{TierId, AUTO_LANG};

#[derive(Debug, Clone)]
pub struct QualityMatrix {
    rows: HashMap<(String, String), Vec<TierId>>,
    default: Vec<TierId>,
}

impl QualityMatrix {
    /// 같은 쌍이 여러 번 나오면 나중 행이 이긴다
    pub fn new(entries: &[QualityMatrixEntry], default: Vec<TierId>) -> Self {
        let rows = entries
            .iter()
            .map(|e| ((e.source.clone(), e.target.clone()), dedup(&e.tiers)))
            .collect();
        Self {
            rows,
            default: dedup(&default),
        }
    }

    pub fn from_config(config: &TranslationConfig) -> Self {
        Self::new(&config.quality_matrix, config.default_tiers.clone())
    }

    /// 쌍에 대한 티어 순서
    pub fn lookup(&self, source: &str, target: &str) -> &[TierId] {
        let key = |s: &str| (s.to_string(), target.to_string());
        self.rows
            .get(&key(source))
            .or_else(|| self.rows.get(&key(AUTO_LANG)))
            .map(Vec::as_slice)
            .unwrap_or(&self.default)
    }

    /// 쌍 갱신 (런타임 튜닝)
    pub fn set(&mut self, source: &str, target: &str, tiers: Vec<TierId>) {
        self.rows
            .insert((source.to_string(), target.to_string()), dedup(&tiers));
    }

    /// 매트릭스에 정의된 쌍 목록
    pub fn pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<_> = self.rows.keys().cloned().collect();
        pairs.sort();
        pairs
    }
}

/// 순서를 유지한 중복 제거
fn dedup(tiers: &[TierId]) -> Vec<TierId> {
    let mut out = Vec::with_capacity(tiers.len());
    for tier in tiers {
        if !out.contains(tier) {
            out.push(*tier);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use TierId::*;

    fn matrix() -> QualityMatrix {
        QualityMatrix::new(
            &[
                QualityMatrixEntry::new("en", "vi", &[Cloud, LocalLarge, LocalLite]),
                QualityMatrixEntry::new("vi", "zh", &[LocalLarge, Cloud, LocalLite]),
                QualityMatrixEntry::new("auto", "vi", &[LocalLite, Cloud]),
            ],
            vec![Cloud, LocalLite],
        )
    }

    #[test]
    fn exact_pair_wins() {
        assert_eq!(matrix().lookup("vi", "zh"), &[LocalLarge, Cloud, LocalLite]);
    }

    #[test]
    fn auto_row_is_wildcard() {
        let m = matrix();
        assert_eq!(m.lookup("auto", "vi"), &[LocalLite, Cloud]);
        // 매트릭스에 없는 원문 언어 → 와일드카드
        assert_eq!(m.lookup("ko", "vi"), &[LocalLite, Cloud]);
    }

    #[test]
    fn default_when_nothing_matches() {
        assert_eq!(matrix().lookup("ko", "ja"), &[Cloud, LocalLite]);
    }

    #[test]
    fn duplicates_are_removed() {
        let m = QualityMatrix::new(
            &[QualityMatrixEntry::new("en", "fr", &[Cloud, Cloud, LocalLite, Cloud])],
            vec![],
        );
        assert_eq!(m.lookup("en", "fr"), &[Cloud, LocalLite]);
        assert!(m.lookup("fr", "en").is_empty());
    }

    #[test]
    fn runtime_update() {
        let mut m = matrix();
        m.set("en", "vi", vec![LocalLite]);
        assert_eq!(m.lookup("en", "vi"), &[LocalLite]);
        assert_eq!(m.pairs().len(), 3);
    }

    #[test]
    fn default_config_matrix() {
        let m = QualityMatrix::from_config(&TranslationConfig::default());
        assert_eq!(m.lookup("en", "vi")[0], Cloud);
        assert_eq!(m.lookup("zh", "vi")[0], LocalLarge);
    }
}
