//! EdgeResolver: selector-directed edge fetch
//!
//! Effective direction is the selector's own direction XOR the traversal
//! direction; type filters (including unions) apply on top.

use crate::features::query_engine::domain::{EdgeSelector, EdgeType, UnifiedEdge};

use super::graph_index::UnifiedGraphIndex;

pub struct EdgeResolver;

impl EdgeResolver {
    pub fn resolve(
        graph: &UnifiedGraphIndex,
        node_id: &str,
        selector: &EdgeSelector,
        backward: bool,
    ) -> Vec<UnifiedEdge> {
        let effective_backward = selector.is_backward ^ backward;

        let type_filter = if selector.operands.is_empty() {
            match selector.edge_type {
                EdgeType::All => None,
                t => Some(t),
            }
        } else {
            // unions fetch everything and filter per edge
            None
        };

        let edges = if effective_backward {
            graph.get_edges_to(node_id, type_filter)
        } else {
            graph.get_edges_from(node_id, type_filter)
        };

        if selector.operands.is_empty() {
            edges
        } else {
            edges
                .into_iter()
                .filter(|e| selector.matches(e.edge_type))
                .collect()
        }
    }
}
