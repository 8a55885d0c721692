//! TraversalEngine: budgeted path discovery
//!
//! BFS yields shortest paths first; DFS is used when the strategy selector
//! estimates a deep query. Both share the `PathCollector` budgets, the
//! wildcard-self-loop rule, per-path cycle prevention, and SCCP
//! unreachable-block pruning.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::errors::Result;
use crate::features::query_engine::domain::{
    EdgeSelector, ExecutionMode, NodeSelector, PathResult, QueryOptions, StopReason,
    StrategySelector, TraversalDirection, UnifiedEdge, UnifiedNode,
};

use super::edge_resolver::EdgeResolver;
use super::graph_index::UnifiedGraphIndex;
use super::node_matcher::NodeMatcher;
use super::path_collector::{PathCollector, TraversalFlow};
use super::sccp::SccpResult;

const DEFAULT_EDGE_MAX_DEPTH: usize = 10;

pub struct TraversalRequest<'a> {
    pub source: &'a NodeSelector,
    pub target: &'a NodeSelector,
    pub edge: &'a EdgeSelector,
    pub direction: TraversalDirection,
    pub options: &'a QueryOptions,
    pub sccp: Option<&'a SccpResult>,
}

#[derive(Debug)]
pub struct TraversalOutcome {
    pub paths: Vec<PathResult>,
    pub stop_reason: StopReason,
    pub nodes_visited: usize,
    pub elapsed_ms: u64,
}

impl TraversalOutcome {
    fn no_match() -> Self {
        Self {
            paths: Vec::new(),
            stop_reason: StopReason::NoMatch,
            nodes_visited: 0,
            elapsed_ms: 0,
        }
    }
}

pub struct TraversalEngine;

impl TraversalEngine {
    pub fn find_paths(
        graph: &UnifiedGraphIndex,
        matcher: &NodeMatcher,
        request: &TraversalRequest<'_>,
    ) -> Result<TraversalOutcome> {
        let source_nodes = matcher.match_nodes(graph, request.source)?;
        let target_nodes = matcher.match_nodes(graph, request.target)?;
        if source_nodes.is_empty() || target_nodes.is_empty() {
            debug!(
                sources = source_nodes.len(),
                targets = target_nodes.len(),
                "find_paths_no_match"
            );
            return Ok(TraversalOutcome::no_match());
        }

        let backward = request.direction == TraversalDirection::Backward;
        let (start_nodes, end_ids): (Vec<UnifiedNode>, FxHashSet<String>) = if backward {
            (
                target_nodes,
                source_nodes.into_iter().map(|n| n.id).collect(),
            )
        } else {
            (
                source_nodes,
                target_nodes.into_iter().map(|n| n.id).collect(),
            )
        };

        let end_is_wildcard = if backward {
            request.source.is_wildcard()
        } else {
            request.target.is_wildcard()
        };
        let outcome = Self::traverse(
            graph,
            request,
            start_nodes,
            end_ids,
            backward,
            end_is_wildcard,
        );
        debug!(
            paths = outcome.paths.len(),
            visited = outcome.nodes_visited,
            stop = outcome.stop_reason.as_str(),
            "find_paths_complete"
        );
        Ok(outcome)
    }

    fn traverse(
        graph: &UnifiedGraphIndex,
        request: &TraversalRequest<'_>,
        start_nodes: Vec<UnifiedNode>,
        end_ids: FxHashSet<String>,
        backward: bool,
        end_is_wildcard: bool,
    ) -> TraversalOutcome {
        let options = request.options;
        let mut collector = PathCollector::new(options);
        let depth_first = Self::pick_mode(options, start_nodes.len()) == ExecutionMode::DepthFirst;

        // wildcard-self-loop rule: drop the start/end overlap so 0-length
        // paths do not count, unless the removal would empty the target
        // set (both ends the same wildcard): then restore and require
        // depth > 0
        let start_ids: FxHashSet<String> = start_nodes.iter().map(|n| n.id.clone()).collect();
        let mut actual_end_ids: FxHashSet<String> =
            end_ids.difference(&start_ids).cloned().collect();
        let mut require_positive_depth = false;
        if actual_end_ids.is_empty() {
            actual_end_ids = end_ids;
            require_positive_depth = true;
        }

        let min_depth = request.edge.min_depth.max(usize::from(require_positive_depth));
        // an explicit E.X.depth(n) caps the traversal; the selector's
        // untouched default does not override the mode budget
        let max_depth = if request.edge.max_depth == DEFAULT_EDGE_MAX_DEPTH {
            options.max_depth
        } else {
            options.max_depth.min(request.edge.max_depth)
        };

        let mut visited_global: FxHashSet<String> = FxHashSet::default();
        // (node id, path node ids, path edges, depth)
        let mut queue: VecDeque<(String, Vec<String>, Vec<UnifiedEdge>, usize)> = VecDeque::new();

        for node in &start_nodes {
            if visited_global.insert(node.id.clone()) {
                collector.increment_visited();
            }
            queue.push_back((node.id.clone(), vec![node.id.clone()], Vec::new(), 0));
        }

        while let Some((current, path_nodes, path_edges, depth)) = if depth_first {
            queue.pop_back()
        } else {
            queue.pop_front()
        } {
            if let TraversalFlow::StopBudget(reason) = collector.check() {
                debug!(reason = reason.as_str(), "traversal_stopped");
                break;
            }

            let next_edges = if depth < max_depth {
                EdgeResolver::resolve(graph, &current, request.edge, backward)
            } else {
                Vec::new()
            };

            if actual_end_ids.contains(&current) && depth >= min_depth {
                if end_is_wildcard {
                    // wildcard end: every node qualifies, so only terminal
                    // paths are recorded and exploration continues: the
                    // node budget, not the path budget, governs the sweep
                    if next_edges.is_empty() {
                        if let Some(path) = materialize(graph, &path_nodes, &path_edges, backward) {
                            collector.add_path(path);
                        }
                        continue;
                    }
                } else {
                    if let Some(path) = materialize(graph, &path_nodes, &path_edges, backward) {
                        collector.add_path(path);
                    }
                    continue; // found a target; do not expand past it
                }
            }

            if depth >= max_depth {
                continue;
            }

            for edge in next_edges {
                let next = if backward {
                    edge.from_node.clone()
                } else {
                    edge.to_node.clone()
                };

                let Some(next_node) = graph.get_node(&next) else {
                    continue;
                };
                if Self::is_unreachable(request.sccp, &next_node) {
                    continue;
                }
                if Self::context_conflict(options, &edge, &next_node) {
                    continue;
                }
                if path_nodes.contains(&next) {
                    continue; // cycle within this path
                }
                if visited_global.insert(next.clone()) {
                    collector.increment_visited();
                }

                let mut new_nodes = path_nodes.clone();
                new_nodes.push(next.clone());
                let mut new_edges = path_edges.clone();
                new_edges.push(edge);
                queue.push_back((next, new_nodes, new_edges, depth + 1));
            }
        }

        TraversalOutcome {
            stop_reason: collector.stop_reason(),
            nodes_visited: collector.nodes_visited(),
            elapsed_ms: collector.elapsed_ms(),
            paths: collector.paths,
        }
    }

    fn pick_mode(options: &QueryOptions, source_count: usize) -> ExecutionMode {
        if options.algorithm == "dfs" {
            return ExecutionMode::DepthFirst;
        }
        StrategySelector::default().select_cost_based(
            options.max_depth,
            source_count,
            options.max_nodes,
        )
    }

    /// SCCP pruning: skip nodes whose block is proven unreachable under
    /// constant propagation, and unreachable blocks themselves.
    fn is_unreachable(sccp: Option<&SccpResult>, node: &UnifiedNode) -> bool {
        let Some(result) = sccp else { return false };
        if result.is_unreachable(&node.id) {
            return true;
        }
        node.attr_str("block_id")
            .is_some_and(|block| result.is_unreachable(block))
    }

    /// Context-sensitive override filtering: a return-to-caller edge tagged
    /// with its callee's class is skipped when the binding call site has
    /// been narrowed to a different receiver class.
    fn context_conflict(options: &QueryOptions, edge: &UnifiedEdge, next_node: &UnifiedNode) -> bool {
        if !options.context_sensitive {
            return false;
        }
        let Some(callee_fqn) = edge.attr_str("callee_fqn") else {
            return false;
        };
        let Some(receiver_class) = next_node.attr_str("receiver_class") else {
            return false;
        };
        match class_of_fqn(callee_fqn) {
            Some(callee_class) => callee_class != receiver_class,
            None => false,
        }
    }
}

/// Class segment of a dotted method FQN (`m.Child.run` → `Child`);
/// module-level functions have none.
fn class_of_fqn(fqn: &str) -> Option<&str> {
    let parts: Vec<&str> = fqn.split('.').collect();
    if parts.len() < 2 {
        return None;
    }
    let candidate = parts[parts.len() - 2];
    candidate
        .chars()
        .next()
        .filter(|c| c.is_uppercase())
        .map(|_| candidate)
}

fn materialize(
    graph: &UnifiedGraphIndex,
    node_ids: &[String],
    edges: &[UnifiedEdge],
    backward: bool,
) -> Option<PathResult> {
    let mut nodes: Vec<UnifiedNode> = node_ids
        .iter()
        .map(|id| graph.get_node(id))
        .collect::<Option<Vec<_>>>()?;
    let mut edges = edges.to_vec();
    if backward {
        nodes.reverse();
        edges.reverse();
    }
    Some(PathResult::new(nodes, edges))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::ir_generation::domain::IRDocument;
    use crate::features::query_engine::domain::{E, Q};
    use crate::shared::models::{DataflowEdge, DataflowEdgeKind, DfgSnapshot, Span, VariableEntity, VariableKind};

    fn var(name: &str, line: u32) -> VariableEntity {
        VariableEntity {
            id: VariableEntity::make_id("t.py", "m", name, line, 0),
            name: name.into(),
            function_fqn: "m".into(),
            file_path: "t.py".into(),
            kind: VariableKind::Local,
            type_id: None,
            scope_id: Some("m".into()),
            decl_span: Some(Span::line(line)),
        }
    }

    fn chain_graph() -> UnifiedGraphIndex {
        let mut doc = IRDocument::new("repo", "snap");
        let a = var("a", 1);
        let b = var("b", 2);
        let c = var("c", 3);
        let edges = vec![
            DataflowEdge::new(&a.id, &b.id, DataflowEdgeKind::DefUse),
            DataflowEdge::new(&b.id, &c.id, DataflowEdgeKind::DefUse),
        ];
        doc.dfg = Some(DfgSnapshot {
            variables: vec![a, b, c],
            edges,
        });
        UnifiedGraphIndex::build(&doc).unwrap()
    }

    fn run(
        graph: &UnifiedGraphIndex,
        source: &NodeSelector,
        target: &NodeSelector,
        direction: TraversalDirection,
        options: &QueryOptions,
    ) -> TraversalOutcome {
        let edge = E::dfg();
        let request = TraversalRequest {
            source,
            target,
            edge: &edge,
            direction,
            options,
            sccp: None,
        };
        TraversalEngine::find_paths(graph, &NodeMatcher::with_default_config(), &request).unwrap()
    }

    #[test]
    fn test_forward_chain() {
        let graph = chain_graph();
        let outcome = run(
            &graph,
            &Q::var("a"),
            &Q::var("c"),
            TraversalDirection::Forward,
            &QueryOptions::default(),
        );
        assert_eq!(outcome.paths.len(), 1);
        assert_eq!(outcome.paths[0].nodes.len(), 3);
        assert_eq!(outcome.stop_reason, StopReason::Complete);
    }

    #[test]
    fn test_backward_paths_are_reversed() {
        let graph = chain_graph();
        let outcome = run(
            &graph,
            &Q::var("a"),
            &Q::var("c"),
            TraversalDirection::Backward,
            &QueryOptions::default(),
        );
        assert_eq!(outcome.paths.len(), 1);
        let first = &outcome.paths[0].nodes[0];
        assert_eq!(first.name.as_deref(), Some("a"));
    }

    #[test]
    fn test_no_match() {
        let graph = chain_graph();
        let outcome = run(
            &graph,
            &Q::var("missing"),
            &Q::var("c"),
            TraversalDirection::Forward,
            &QueryOptions::default(),
        );
        assert_eq!(outcome.stop_reason, StopReason::NoMatch);
        assert!(outcome.paths.is_empty());
    }

    #[test]
    fn test_wildcard_self_loop_rule() {
        let graph = chain_graph();
        // both ends the same wildcard: zero-length paths must not count
        let outcome = run(
            &graph,
            &Q::var_any(),
            &Q::var_any(),
            TraversalDirection::Forward,
            &QueryOptions::default(),
        );
        assert!(outcome.paths.iter().all(|p| p.nodes.len() > 1));
        assert!(!outcome.paths.is_empty());
    }

    #[test]
    fn test_depth_limit() {
        let graph = chain_graph();
        let options = QueryOptions {
            max_depth: 1,
            ..Default::default()
        };
        let outcome = run(
            &graph,
            &Q::var("a"),
            &Q::var("c"),
            TraversalDirection::Forward,
            &options,
        );
        assert!(outcome.paths.is_empty());
        assert_eq!(outcome.stop_reason, StopReason::Complete);
    }
}
