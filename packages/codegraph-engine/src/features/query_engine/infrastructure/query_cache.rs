//! Query result cache
//!
//! LRU bounded by both entry count (500) and estimated bytes (100 MiB).
//! Keys are SHA-256 over a structural representation of the flow (source,
//! target, and edge descriptors: union operands sorted), the mode, and
//! the option fields that affect results.

use std::num::NonZeroUsize;

use lru::LruCache;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::features::query_engine::domain::{PathQuery, PathSet, QueryMode, QueryOptions};

const CACHE_MAX_ENTRIES: usize = 500;
const CACHE_MAX_BYTES: usize = 100 * 1024 * 1024;

pub struct QueryCache {
    entries: LruCache<String, PathSet>,
    total_bytes: usize,
    max_bytes: usize,
    hits: u64,
    misses: u64,
}

impl QueryCache {
    pub fn new() -> Self {
        Self {
            entries: LruCache::new(NonZeroUsize::new(CACHE_MAX_ENTRIES).unwrap()),
            total_bytes: 0,
            max_bytes: CACHE_MAX_BYTES,
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(&mut self, key: &str) -> Option<PathSet> {
        match self.entries.get(key) {
            Some(result) => {
                self.hits += 1;
                Some(result.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn put(&mut self, key: String, result: PathSet) {
        let size = estimate_pathset_size(&result);
        if let Some((_, evicted)) = self.entries.push(key, result) {
            self.total_bytes = self
                .total_bytes
                .saturating_sub(estimate_pathset_size(&evicted));
        }
        self.total_bytes += size;

        // byte-bound eviction on top of the count bound
        while self.total_bytes > self.max_bytes {
            match self.entries.pop_lru() {
                Some((key, evicted)) => {
                    let evicted_size = estimate_pathset_size(&evicted);
                    self.total_bytes = self.total_bytes.saturating_sub(evicted_size);
                    debug!(key = key.get(..16).unwrap_or(&key), evicted_size, "cache_evicted");
                }
                None => break,
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.total_bytes = 0;
        self.hits = 0;
        self.misses = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Structural cache key for a query + mode + options.
pub fn make_cache_key(query: &PathQuery, mode: QueryMode, options: &QueryOptions) -> String {
    let flow = &query.flow;
    let expr = format!(
        "{}>>{}{}",
        flow.source.cache_descriptor(),
        flow.target.cache_descriptor(),
        flow.edge_type
            .as_ref()
            .map(|e| format!(">>{}", e.cache_descriptor()))
            .unwrap_or_default()
    );
    let option_fields = format!(
        "depth:{}|paths:{}|nodes:{}|timeout:{}|ctx:{}|k:{}|alias:{}",
        options.max_depth,
        options.max_paths,
        options.max_nodes,
        options.timeout_ms,
        options.context_sensitive,
        options.k_limit,
        options.alias_analysis,
    );
    let safety = format!(
        "sp:{:?}|sn:{:?}|st:{:?}|dr:{:?}|c:{}",
        query.safety.max_paths,
        query.safety.max_nodes,
        query.safety.timeout_ms,
        flow.depth_range,
        query.constraints.len(),
    );
    let combined = format!("{}::{}::{}::{}", expr, mode.as_str(), option_fields, safety);
    format!("{:x}", Sha256::digest(combined.as_bytes()))
}

/// Rough size: path overhead plus per-node/edge costs.
fn estimate_pathset_size(result: &PathSet) -> usize {
    let mut size = 1024;
    for path in &result.paths {
        size += 1024;
        size += path.nodes.len() * 200;
        size += path.edges.len() * 100;
    }
    size += result.diagnostics.len() * 50;
    size
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::query_engine::domain::{PathQuery, Q, StopReason};

    fn query() -> PathQuery {
        PathQuery::from_flow_expr(Q::var("x") >> Q::call("eval"))
    }

    #[test]
    fn test_key_is_stable() {
        let options = QueryOptions::preset(QueryMode::Pr);
        let a = make_cache_key(&query(), QueryMode::Pr, &options);
        let b = make_cache_key(&query(), QueryMode::Pr, &options);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_key_varies_by_mode_and_options() {
        let pr = QueryOptions::preset(QueryMode::Pr);
        let realtime = QueryOptions::preset(QueryMode::Realtime);
        let a = make_cache_key(&query(), QueryMode::Pr, &pr);
        let b = make_cache_key(&query(), QueryMode::Realtime, &realtime);
        assert_ne!(a, b);
    }

    #[test]
    fn test_union_operand_order_is_canonical() {
        let options = QueryOptions::default();
        let q1 = PathQuery::from_flow_expr((Q::var("a") | Q::var("b")) >> Q::call("eval"));
        let q2 = PathQuery::from_flow_expr((Q::var("b") | Q::var("a")) >> Q::call("eval"));
        assert_eq!(
            make_cache_key(&q1, QueryMode::Pr, &options),
            make_cache_key(&q2, QueryMode::Pr, &options)
        );
    }

    #[test]
    fn test_put_get_and_clear() {
        let mut cache = QueryCache::new();
        cache.put("k1".into(), PathSet::empty(StopReason::Complete));
        assert!(cache.get("k1").is_some());
        assert!(cache.get("k2").is_none());
        cache.clear();
        assert!(cache.is_empty());
    }
}
