//! Reachability indexes
//!
//! `ReachabilityIndex` keeps a per-source transitive closure
//! (`source → {target → distance}`) with a depth cap, computed lazily per
//! source or in bulk, fronted by a low-FPR Bloom filter for negative
//! answers. `BidirectionalReachabilityIndex` meets forward and backward
//! frontiers in the middle and exposes the meeting points.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use super::bloom_filter::ReachabilityBloomFilter;
use super::edge_index::EdgeIndex;

pub struct ReachabilityIndex {
    max_depth: usize,
    max_sources: usize,
    /// source → (target → hop distance)
    closure: FxHashMap<String, FxHashMap<String, usize>>,
    bloom: ReachabilityBloomFilter,
    sources_indexed: FxHashSet<String>,
    built: bool,
}

impl ReachabilityIndex {
    pub fn new(max_depth: usize, max_sources: usize) -> Self {
        Self {
            max_depth,
            max_sources,
            closure: FxHashMap::default(),
            bloom: ReachabilityBloomFilter::new(max_sources * 100),
            sources_indexed: FxHashSet::default(),
            built: false,
        }
    }

    /// Bulk-build the closure for a source set (or every node when `None`,
    /// capped at `max_sources`).
    pub fn build(&mut self, edges: &EdgeIndex, sources: &[String]) {
        for source in sources.iter().take(self.max_sources) {
            self.build_for_source(edges, source);
        }
        self.built = true;
        debug!(
            sources = self.sources_indexed.len(),
            pairs = self.closure.values().map(FxHashMap::len).sum::<usize>(),
            "reachability_index_built"
        );
    }

    pub fn build_for_source(&mut self, edges: &EdgeIndex, source: &str) {
        if self.sources_indexed.contains(source) {
            return;
        }
        let reachable = self.bfs(edges, source);
        for target in reachable.keys() {
            self.bloom.add_reachable(source, target);
        }
        self.closure.insert(source.to_string(), reachable);
        self.sources_indexed.insert(source.to_string());
    }

    fn bfs(&self, edges: &EdgeIndex, source: &str) -> FxHashMap<String, usize> {
        let mut reachable = FxHashMap::default();
        let mut visited: FxHashSet<String> = FxHashSet::default();
        let mut queue: VecDeque<(String, usize)> = VecDeque::new();
        visited.insert(source.to_string());
        queue.push_back((source.to_string(), 0));

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= self.max_depth {
                continue;
            }
            for edge in edges.get_outgoing(&current, None) {
                if visited.insert(edge.to_node.clone()) {
                    reachable.insert(edge.to_node.clone(), depth + 1);
                    queue.push_back((edge.to_node, depth + 1));
                }
            }
        }
        reachable
    }

    /// O(1) after build; lazy per-source BFS otherwise.
    pub fn can_reach(&mut self, edges: &EdgeIndex, source: &str, target: &str, lazy: bool) -> bool {
        if self.built && self.bloom.definitely_unreachable(source, target) {
            return false;
        }
        if let Some(targets) = self.closure.get(source) {
            return targets.contains_key(target);
        }
        if lazy {
            self.build_for_source(edges, source);
            return self
                .closure
                .get(source)
                .is_some_and(|t| t.contains_key(target));
        }
        false
    }

    pub fn get_distance(&self, source: &str, target: &str) -> Option<usize> {
        self.closure.get(source)?.get(target).copied()
    }

    pub fn get_reachable_from(&mut self, edges: &EdgeIndex, source: &str) -> FxHashSet<String> {
        if !self.closure.contains_key(source) {
            self.build_for_source(edges, source);
        }
        self.closure
            .get(source)
            .map(|t| t.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn invalidate(&mut self) {
        self.closure.clear();
        self.sources_indexed.clear();
        self.bloom = ReachabilityBloomFilter::new(self.max_sources * 100);
        self.built = false;
    }
}

/// Forward-from-source and backward-from-sink frontiers; `can_reach`
/// answers by intersection.
pub struct BidirectionalReachabilityIndex {
    max_depth: usize,
    forward: FxHashMap<String, FxHashSet<String>>,
    backward: FxHashMap<String, FxHashSet<String>>,
}

impl BidirectionalReachabilityIndex {
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            forward: FxHashMap::default(),
            backward: FxHashMap::default(),
        }
    }

    fn frontier(
        &self,
        edges: &EdgeIndex,
        start: &str,
        backward: bool,
    ) -> FxHashSet<String> {
        let mut reachable = FxHashSet::default();
        let mut visited: FxHashSet<String> = FxHashSet::default();
        let mut queue: VecDeque<(String, usize)> = VecDeque::new();
        visited.insert(start.to_string());
        queue.push_back((start.to_string(), 0));

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= self.max_depth {
                continue;
            }
            let next_edges = if backward {
                edges.get_incoming(&current, None)
            } else {
                edges.get_outgoing(&current, None)
            };
            for edge in next_edges {
                let next = if backward { edge.from_node } else { edge.to_node };
                if visited.insert(next.clone()) {
                    reachable.insert(next.clone());
                    queue.push_back((next, depth + 1));
                }
            }
        }
        reachable
    }

    fn forward_set(&mut self, edges: &EdgeIndex, source: &str) -> &FxHashSet<String> {
        if !self.forward.contains_key(source) {
            let set = self.frontier(edges, source, false);
            self.forward.insert(source.to_string(), set);
        }
        &self.forward[source]
    }

    fn backward_set(&mut self, edges: &EdgeIndex, sink: &str) -> &FxHashSet<String> {
        if !self.backward.contains_key(sink) {
            let set = self.frontier(edges, sink, true);
            self.backward.insert(sink.to_string(), set);
        }
        &self.backward[sink]
    }

    /// Meet-in-the-middle reachability.
    pub fn can_reach(&mut self, edges: &EdgeIndex, source: &str, sink: &str) -> bool {
        let forward = self.forward_set(edges, source).clone();
        if forward.contains(sink) {
            return true;
        }
        let backward = self.backward_set(edges, sink);
        if backward.contains(source) {
            return true;
        }
        forward.iter().any(|n| backward.contains(n))
    }

    /// Intermediate nodes lying on some source → sink path.
    pub fn get_meeting_points(
        &mut self,
        edges: &EdgeIndex,
        source: &str,
        sink: &str,
    ) -> FxHashSet<String> {
        let forward = self.forward_set(edges, source).clone();
        let backward = self.backward_set(edges, sink);
        forward.intersection(backward).cloned().collect()
    }

    pub fn invalidate(&mut self) {
        self.forward.clear();
        self.backward.clear();
    }
}
