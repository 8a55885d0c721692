//! UnifiedGraphIndex: facade over the three specialised indexes
//!
//! Immutable after construction; supports concurrent reads. The advanced
//! indexes (edge Bloom filter, transitive closure, bidirectional
//! reachability) build lazily behind a lock and drop together on
//! `invalidate_caches`.

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::info;

use crate::errors::{EngineError, Result};
use crate::features::ir_generation::domain::IRDocument;
use crate::features::query_engine::domain::{EdgeType, UnifiedEdge, UnifiedNode};

use super::bloom_filter::EdgeBloomFilter;
use super::edge_index::EdgeIndex;
use super::node_index::NodeIndex;
use super::reachability_index::{BidirectionalReachabilityIndex, ReachabilityIndex};
use super::semantic_index::SemanticIndex;

const REACHABILITY_DEPTH_CAP: usize = 20;
const REACHABILITY_MAX_SOURCES: usize = 1000;

pub struct UnifiedGraphIndex {
    node_index: Arc<NodeIndex>,
    edge_index: EdgeIndex,
    semantic_index: SemanticIndex,

    edge_bloom: Mutex<Option<EdgeBloomFilter>>,
    reachability: Mutex<Option<ReachabilityIndex>>,
    bidirectional: Mutex<Option<BidirectionalReachabilityIndex>>,
}

impl UnifiedGraphIndex {
    /// Build from a completed IR document. Construction fails only on
    /// malformed IR; queries never do.
    pub fn build(doc: &IRDocument) -> Result<Self> {
        if doc.repo_id.is_empty() {
            return Err(EngineError::Internal(
                "cannot index a document without a repo id".into(),
            ));
        }

        let node_index = Arc::new(NodeIndex::build(doc));
        let edge_index = EdgeIndex::build(doc);
        let semantic_index = SemanticIndex::build(doc, Arc::clone(&node_index));

        // graph completeness: after synthesis every interprocedural edge
        // endpoint resolves to a node (real or synthesised)
        for edge in &doc.interprocedural_edges {
            for endpoint in [&edge.from_var_id, &edge.to_var_id] {
                if !node_index.exists(endpoint) {
                    return Err(EngineError::Internal(format!(
                        "dangling edge endpoint not recoverable via synthesis: {}",
                        endpoint
                    )));
                }
            }
        }

        info!(
            nodes = node_index.count(),
            edges = edge_index.total_edges(),
            "unified_graph_index_built"
        );

        Ok(Self {
            node_index,
            edge_index,
            semantic_index,
            edge_bloom: Mutex::new(None),
            reachability: Mutex::new(None),
            bidirectional: Mutex::new(None),
        })
    }

    // ============================================================
    // Delegated lookups
    // ============================================================

    pub fn get_node(&self, node_id: &str) -> Option<UnifiedNode> {
        self.node_index.get(node_id)
    }

    pub fn get_all_nodes(&self) -> Vec<UnifiedNode> {
        self.node_index.get_all()
    }

    pub fn node_count(&self) -> usize {
        self.node_index.count()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_index.total_edges()
    }

    pub fn get_edges_from(&self, node_id: &str, edge_type: Option<EdgeType>) -> Vec<UnifiedEdge> {
        self.edge_index.get_outgoing(node_id, edge_type)
    }

    pub fn get_edges_to(&self, node_id: &str, edge_type: Option<EdgeType>) -> Vec<UnifiedEdge> {
        self.edge_index.get_incoming(node_id, edge_type)
    }

    pub fn find_vars_by_name(&self, name: &str) -> Vec<UnifiedNode> {
        self.semantic_index.find_vars_by_name(name)
    }

    pub fn find_funcs_by_name(&self, name: &str) -> Vec<UnifiedNode> {
        self.semantic_index.find_funcs_by_name(name)
    }

    pub fn find_classes_by_name(&self, name: &str) -> Vec<UnifiedNode> {
        self.semantic_index.find_classes_by_name(name)
    }

    pub fn find_call_sites_by_name(&self, callee_name: &str) -> Vec<UnifiedNode> {
        self.semantic_index.find_call_sites_by_name(callee_name)
    }

    pub fn find_vars_by_name_and_type(&self, name: &str, type_id: &str) -> Vec<UnifiedNode> {
        self.semantic_index.find_vars_by_name_and_type(name, type_id)
    }

    pub fn find_vars_by_name_and_scope(&self, name: &str, scope_id: &str) -> Vec<UnifiedNode> {
        self.semantic_index.find_vars_by_name_and_scope(name, scope_id)
    }

    pub fn find_funcs_in_class(&self, class_name: &str, method_name: &str) -> Vec<UnifiedNode> {
        self.semantic_index.find_funcs_in_class(class_name, method_name)
    }

    pub fn find_vars_by_pattern(&self, pattern: &str) -> Vec<UnifiedNode> {
        self.semantic_index.find_vars_by_pattern(pattern)
    }

    pub fn find_funcs_by_pattern(&self, pattern: &str) -> Vec<UnifiedNode> {
        self.semantic_index.find_funcs_by_pattern(pattern)
    }

    pub fn find_blocks_by_function(&self, function_node_id: &str) -> Vec<UnifiedNode> {
        self.semantic_index.find_blocks_by_function(function_node_id)
    }

    // ============================================================
    // Advanced (lazy) indexes
    // ============================================================

    /// Fast negative edge-existence check. False positives are possible and
    /// must be re-checked against the adjacency; false negatives are not.
    pub fn might_have_edge(&self, from_node: &str, to_node: &str) -> bool {
        let mut bloom_slot = self.edge_bloom.lock();
        let bloom = bloom_slot.get_or_insert_with(|| {
            let mut bloom = EdgeBloomFilter::new(self.edge_index.total_edges().max(1));
            for node in self.node_index.get_all() {
                for edge in self.edge_index.get_outgoing(&node.id, None) {
                    bloom.add_edge(&edge.from_node, &edge.to_node);
                }
            }
            bloom
        });
        bloom.might_have_edge(from_node, to_node)
    }

    /// Transitive-closure reachability (depth cap 20). O(1) once the
    /// source is indexed, O(V+E) for the lazy first computation.
    pub fn can_reach(&self, source: &str, target: &str, lazy: bool) -> bool {
        let mut slot = self.reachability.lock();
        let index = slot.get_or_insert_with(|| {
            ReachabilityIndex::new(REACHABILITY_DEPTH_CAP, REACHABILITY_MAX_SOURCES)
        });
        index.can_reach(&self.edge_index, source, target, lazy)
    }

    pub fn get_distance(&self, source: &str, target: &str) -> Option<usize> {
        let mut slot = self.reachability.lock();
        let index = slot.get_or_insert_with(|| {
            ReachabilityIndex::new(REACHABILITY_DEPTH_CAP, REACHABILITY_MAX_SOURCES)
        });
        index.build_for_source(&self.edge_index, source);
        index.get_distance(source, target)
    }

    pub fn get_reachable_from(&self, source: &str) -> rustc_hash::FxHashSet<String> {
        let mut slot = self.reachability.lock();
        let index = slot.get_or_insert_with(|| {
            ReachabilityIndex::new(REACHABILITY_DEPTH_CAP, REACHABILITY_MAX_SOURCES)
        });
        index.get_reachable_from(&self.edge_index, source)
    }

    /// Meet-in-the-middle reachability for specific source/sink pairs.
    pub fn can_reach_bidirectional(&self, source: &str, sink: &str) -> bool {
        let mut slot = self.bidirectional.lock();
        let index = slot
            .get_or_insert_with(|| BidirectionalReachabilityIndex::new(REACHABILITY_DEPTH_CAP / 2));
        index.can_reach(&self.edge_index, source, sink)
    }

    pub fn get_meeting_points(&self, source: &str, sink: &str) -> rustc_hash::FxHashSet<String> {
        let mut slot = self.bidirectional.lock();
        let index = slot
            .get_or_insert_with(|| BidirectionalReachabilityIndex::new(REACHABILITY_DEPTH_CAP / 2));
        index.get_meeting_points(&self.edge_index, source, sink)
    }

    /// Drop all lazy indexes (overlay transaction commit/rollback).
    pub fn invalidate_caches(&self) {
        *self.edge_bloom.lock() = None;
        if let Some(index) = self.reachability.lock().as_mut() {
            index.invalidate();
        }
        if let Some(index) = self.bidirectional.lock().as_mut() {
            index.invalidate();
        }
    }

    pub fn stats(&self) -> FxHashMap<&'static str, usize> {
        let mut stats = self.semantic_index.stats();
        stats.insert("total_nodes", self.node_index.count());
        stats.insert("total_edges", self.edge_index.total_edges());
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{Node, NodeKind, Span};

    #[test]
    fn test_build_and_lookup() {
        let mut doc = IRDocument::new("repo", "snap");
        doc.nodes.push(
            Node::new("function:m.f", NodeKind::Function, "m.f", "m.py", Span::line(1))
                .with_name("f"),
        );
        let index = UnifiedGraphIndex::build(&doc).unwrap();
        assert!(index.get_node("function:m.f").is_some());
        assert_eq!(index.find_funcs_by_name("f").len(), 1);
        assert_eq!(index.node_count(), 1);
    }

    #[test]
    fn test_missing_repo_id_is_malformed() {
        let doc = IRDocument::new("", "snap");
        assert!(UnifiedGraphIndex::build(&doc).is_err());
    }

    #[test]
    fn test_invalidate_caches_is_idempotent() {
        let doc = IRDocument::new("repo", "snap");
        let index = UnifiedGraphIndex::build(&doc).unwrap();
        index.invalidate_caches();
        index.invalidate_caches();
        assert!(!index.might_have_edge("a", "b"));
    }
}
