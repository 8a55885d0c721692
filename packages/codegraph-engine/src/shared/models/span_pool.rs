//! Process-wide span interning pool
//!
//! Identical spans share one allocation. The pool is bounded; once the cap
//! is reached new spans are returned without being retained. `clear()` exists
//! for test teardown.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;

use super::span::Span;

const DEFAULT_CAPACITY: usize = 1 << 20;

static GLOBAL_POOL: Lazy<SpanPool> = Lazy::new(|| SpanPool::with_capacity(DEFAULT_CAPACITY));

#[derive(Debug)]
pub struct SpanPool {
    spans: DashMap<Span, Arc<Span>>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanPoolStats {
    pub interned: usize,
    pub hits: u64,
    pub misses: u64,
}

impl SpanPool {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            spans: DashMap::new(),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Shared process-wide instance used by the IR builders.
    pub fn global() -> &'static SpanPool {
        &GLOBAL_POOL
    }

    /// Intern a span, sharing storage with every identical span seen before.
    pub fn intern(&self, span: Span) -> Arc<Span> {
        if let Some(existing) = self.spans.get(&span) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Arc::clone(existing.value());
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let arc = Arc::new(span);
        if self.spans.len() < self.capacity {
            self.spans.insert(span, Arc::clone(&arc));
        }
        arc
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn stats(&self) -> SpanPoolStats {
        SpanPoolStats {
            interned: self.spans.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Drop all interned spans. Intended for test teardown.
    pub fn clear(&self) {
        self.spans.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_shares_storage() {
        let pool = SpanPool::with_capacity(16);
        let a = pool.intern(Span::new(1, 0, 1, 5));
        let b = pool.intern(Span::new(1, 0, 1, 5));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_capacity_bound() {
        let pool = SpanPool::with_capacity(2);
        pool.intern(Span::new(1, 0, 1, 1));
        pool.intern(Span::new(2, 0, 2, 1));
        pool.intern(Span::new(3, 0, 3, 1));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_clear_resets_stats() {
        let pool = SpanPool::with_capacity(16);
        pool.intern(Span::new(1, 0, 1, 1));
        pool.intern(Span::new(1, 0, 1, 1));
        pool.clear();
        assert!(pool.is_empty());
        assert_eq!(pool.stats().hits, 0);
    }
}
