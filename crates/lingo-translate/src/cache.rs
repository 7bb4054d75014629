//! 번역 결과 LRU 캐시.
//!
//! 모든 모니터링 영역이 공유한다. 키는 UTF-8 원문과 요청된 언어 쌍의
//! 정확한 일치다.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

use lingo_core::models::translation::TranslationUnit;
use lru::LruCache;
use parking_lot::Mutex;

/// 캐시 키 — (원문, 원문 언어, 대상 언어)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub text: String,
    pub source_lang: String,
    pub target_lang: String,
}

impl CacheKey {
    pub fn new(text: &str, source_lang: &str, target_lang: &str) -> Self {
        Self {
            text: text.to_string(),
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
        }
    }
}

/// 번역 캐시
pub struct TranslationCache {
    entries: Mutex<LruCache<CacheKey, TranslationUnit>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TranslationCache {
    /// 용량 0은 1로 올린다
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// 조회 (적중 시 최근 사용으로 갱신)
    pub fn get(&self, key: &CacheKey) -> Option<TranslationUnit> {
        let found = self.entries.lock().get(key).cloned();
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    /// 삽입 (용량 초과 시 가장 오래된 항목 제거)
    pub fn put(&self, key: CacheKey, unit: TranslationUnit) {
        self.entries.lock().put(key, unit);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}
