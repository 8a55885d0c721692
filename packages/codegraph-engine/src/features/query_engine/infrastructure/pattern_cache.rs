//! Shared glob-pattern result cache
//!
//! Pattern lookups over the semantic index are O(names); the full result
//! (node ids) is cached in a process-wide bounded LRU. Safe because the
//! semantic index is immutable after construction; `clear()` exists for
//! tests and snapshot swaps.

use std::num::NonZeroUsize;

use lru::LruCache;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;

const CACHE_CAPACITY: usize = 1024;

static GLOBAL_PATTERN_CACHE: Lazy<PatternCache> = Lazy::new(PatternCache::new);

pub struct PatternCache {
    entries: Mutex<LruCache<String, Vec<String>>>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(LruCache::new(NonZeroUsize::new(CACHE_CAPACITY).unwrap())),
        }
    }

    pub fn global() -> &'static PatternCache {
        &GLOBAL_PATTERN_CACHE
    }

    /// Cached ids for `key`, computing via `compute` on a miss.
    pub fn get_or_compute<F>(&self, key: &str, compute: F) -> Vec<String>
    where
        F: FnOnce() -> Vec<String>,
    {
        let mut entries = self.entries.lock();
        if let Some(ids) = entries.get(key) {
            return ids.clone();
        }
        drop(entries);

        let ids = compute();
        self.entries.lock().put(key.to_string(), ids.clone());
        ids
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Default for PatternCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Compile a glob pattern (`*`, `?`) into an anchored regex.
pub fn glob_to_regex(pattern: &str) -> Option<Regex> {
    let mut regex = String::with_capacity(pattern.len() + 8);
    regex.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => regex.push_str(".*"),
            '?' => regex.push('.'),
            c if "\\.+()[]{}|^$".contains(c) => {
                regex.push('\\');
                regex.push(c);
            }
            c => regex.push(c),
        }
    }
    regex.push('$');
    Regex::new(&regex).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_matching() {
        let re = glob_to_regex("core.*").unwrap();
        assert!(re.is_match("core.auth"));
        assert!(re.is_match("core.db.models"));
        assert!(!re.is_match("app.core"));

        let re = glob_to_regex("*_handler").unwrap();
        assert!(re.is_match("login_handler"));
        assert!(!re.is_match("handler_factory"));
    }

    #[test]
    fn test_cache_hit_returns_same_result() {
        let cache = PatternCache::new();
        let first = cache.get_or_compute("vars:user_*", || vec!["a".into(), "b".into()]);
        let second = cache.get_or_compute("vars:user_*", || panic!("must be cached"));
        assert_eq!(first, second);
    }

    #[test]
    fn test_clear() {
        let cache = PatternCache::new();
        cache.get_or_compute("k", || vec!["x".into()]);
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
