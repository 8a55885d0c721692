//! QueryExecutor: constraint pipeline around traversal
//!
//! (a) auto-convert flows, (b) extract safety limits with defaults,
//! (c) traverse with budget stops, (d) apply constraints in attachment
//! order, (e) derive the stop reason. Universal queries run the same
//! pipeline with multiplied limits.

use once_cell::sync::OnceCell;
use rustc_hash::FxHashSet;
use tracing::{info, warn};

use crate::errors::Result;
use crate::features::query_engine::domain::{
    Constraint, ConstraintMode, NodeSelector, PathQuery, PathResult, PathSet, QueryOptions,
    StopReason, TraversalDirection, UncertainReason, VerificationResult,
};

use super::graph_index::UnifiedGraphIndex;
use super::node_matcher::NodeMatcher;
use super::sccp::SccpResult;
use super::traversal_engine::{TraversalEngine, TraversalRequest};

const DEFAULT_DEPTH_RANGE: (usize, usize) = (1, 10);
const UNIVERSAL_PATH_FACTOR: usize = 100;
const UNIVERSAL_NODE_FACTOR: usize = 10;

static WITHIN_PRUNE_NOTICE: OnceCell<()> = OnceCell::new();

pub struct QueryExecutor;

impl QueryExecutor {
    /// Existential query (∃): first N paths satisfying every constraint.
    pub fn execute_any_path(
        graph: &UnifiedGraphIndex,
        matcher: &NodeMatcher,
        query: &PathQuery,
        options: &QueryOptions,
        sccp: Option<&SccpResult>,
    ) -> Result<PathSet> {
        let effective = Self::effective_options(query, options);
        let edge = query.flow.edge_type.clone().unwrap_or_default();

        let direction = Self::pick_direction(graph, matcher, query, &effective)?;

        let request = TraversalRequest {
            source: &query.flow.source,
            target: &query.flow.target,
            edge: &edge,
            direction,
            options: &effective,
            sccp,
        };
        let outcome = TraversalEngine::find_paths(graph, matcher, &request)?;

        let mut paths = outcome.paths;
        Self::apply_constraints(graph, matcher, query, &mut paths)?;
        Self::mark_heap_uncertainty(&mut paths);

        let mut result = PathSet::new(paths, outcome.stop_reason);
        result.elapsed_ms = outcome.elapsed_ms;
        result.nodes_visited = outcome.nodes_visited;
        if result.stop_reason != StopReason::Complete {
            result
                .diagnostics
                .push(format!("stop: {}", result.stop_reason.as_str()));
            result
                .diagnostics
                .push(format!("nodes_visited: {}", result.nodes_visited));
        }

        info!(
            paths = result.len(),
            stop = result.stop_reason.as_str(),
            elapsed_ms = result.elapsed_ms,
            "query_executed"
        );
        Ok(result)
    }

    /// Universal query (∀): limits are multiplied; incomplete exploration
    /// fails the verification, as does any constraint-violating path.
    pub fn execute_all_paths(
        graph: &UnifiedGraphIndex,
        matcher: &NodeMatcher,
        query: &PathQuery,
        options: &QueryOptions,
        sccp: Option<&SccpResult>,
    ) -> Result<VerificationResult> {
        let mut widened = options.clone();
        widened.max_paths = options.max_paths.saturating_mul(UNIVERSAL_PATH_FACTOR);
        widened.max_nodes = options.max_nodes.saturating_mul(UNIVERSAL_NODE_FACTOR);

        let effective = Self::effective_options(query, &widened);
        let edge = query.flow.edge_type.clone().unwrap_or_default();
        let request = TraversalRequest {
            source: &query.flow.source,
            target: &query.flow.target,
            edge: &edge,
            direction: query.flow.direction,
            options: &effective,
            sccp,
        };
        let outcome = TraversalEngine::find_paths(graph, matcher, &request)?;

        if outcome.stop_reason != StopReason::Complete
            && outcome.stop_reason != StopReason::NoMatch
        {
            // not all paths explored; cannot verify
            return Ok(VerificationResult {
                ok: false,
                violation_path: None,
            });
        }

        let mut paths = outcome.paths;
        let removed = Self::apply_constraints(graph, matcher, query, &mut paths)?;
        Ok(VerificationResult {
            ok: removed.is_empty(),
            violation_path: removed.into_iter().next(),
        })
    }

    /// Merge the flow's own depth range and the query's safety limits over
    /// the mode options.
    fn effective_options(query: &PathQuery, options: &QueryOptions) -> QueryOptions {
        let mut effective = options.clone();
        if query.flow.depth_range != DEFAULT_DEPTH_RANGE {
            // explicit .depth() on the flow wins over the preset
            effective.max_depth = query.flow.depth_range.1;
        }
        if let Some(max_paths) = query.safety.max_paths {
            effective.max_paths = max_paths;
        }
        if let Some(max_nodes) = query.safety.max_nodes {
            effective.max_nodes = max_nodes;
        }
        if let Some(timeout_ms) = query.safety.timeout_ms {
            effective.timeout_ms = timeout_ms;
        }
        if let Some((k, _)) = query.sensitivity.context {
            effective.context_sensitive = true;
            effective.k_limit = k.min(effective.k_limit.max(1));
        }
        if query.sensitivity.alias.is_some() {
            effective.alias_analysis = true;
        }
        effective
    }

    /// Cardinality-based direction flip: a forward flow whose source set
    /// is at least `flip_ratio`× the target set runs backward for the
    /// same semantics at lower cost.
    fn pick_direction(
        graph: &UnifiedGraphIndex,
        matcher: &NodeMatcher,
        query: &PathQuery,
        options: &QueryOptions,
    ) -> Result<TraversalDirection> {
        if query.flow.direction != TraversalDirection::Forward {
            return Ok(query.flow.direction);
        }
        let sources = matcher.match_nodes(graph, &query.flow.source)?.len();
        let targets = matcher.match_nodes(graph, &query.flow.target)?.len();
        if sources > 0 && targets > 0 {
            let ratio = sources as f64 / targets as f64;
            if ratio > options.flip_ratio {
                info!(
                    sources,
                    targets,
                    ratio = format!("{:.1}", ratio),
                    "query_direction_flipped"
                );
                return Ok(TraversalDirection::Backward);
            }
        }
        Ok(TraversalDirection::Forward)
    }

    /// Apply constraints in attachment order; returns the removed paths
    /// (used as verification violations).
    fn apply_constraints(
        graph: &UnifiedGraphIndex,
        matcher: &NodeMatcher,
        query: &PathQuery,
        paths: &mut Vec<PathResult>,
    ) -> Result<Vec<PathResult>> {
        let mut removed = Vec::new();
        for constraint in &query.constraints {
            match constraint {
                Constraint::Where(predicate) => {
                    let (kept, dropped): (Vec<_>, Vec<_>) =
                        std::mem::take(paths).into_iter().partition(|p| predicate(p));
                    *paths = kept;
                    removed.extend(dropped);
                }
                Constraint::Excluding(selector) => {
                    let excluded = Self::match_ids(graph, matcher, selector)?;
                    let (kept, dropped): (Vec<_>, Vec<_>) = std::mem::take(paths)
                        .into_iter()
                        .partition(|p| !p.nodes.iter().any(|n| excluded.contains(&n.id)));
                    *paths = kept;
                    removed.extend(dropped);
                }
                Constraint::CleansedBy(selector) => {
                    let sanitizers = Self::match_ids(graph, matcher, selector)?;
                    let (kept, dropped): (Vec<_>, Vec<_>) = std::mem::take(paths)
                        .into_iter()
                        .partition(|p| p.nodes.iter().any(|n| sanitizers.contains(&n.id)));
                    let mut kept = kept;
                    for path in &mut kept {
                        path.is_sanitized = true;
                    }
                    *paths = kept;
                    removed.extend(dropped);
                }
                Constraint::Within { scope, mode } => {
                    if *mode == ConstraintMode::Prune {
                        WITHIN_PRUNE_NOTICE.get_or_init(|| {
                            warn!("within(PRUNE) runs as a post-filter");
                        });
                    }
                    let scope_files = Self::scope_files(graph, matcher, scope)?;
                    let (kept, dropped): (Vec<_>, Vec<_>) =
                        std::mem::take(paths).into_iter().partition(|p| {
                            p.nodes
                                .iter()
                                .all(|n| n.file_path.is_empty() || scope_files.contains(&n.file_path))
                        });
                    *paths = kept;
                    removed.extend(dropped);
                }
            }
        }
        Ok(removed)
    }

    fn match_ids(
        graph: &UnifiedGraphIndex,
        matcher: &NodeMatcher,
        selector: &NodeSelector,
    ) -> Result<FxHashSet<String>> {
        Ok(matcher
            .match_nodes(graph, selector)?
            .into_iter()
            .map(|n| n.id)
            .collect())
    }

    fn scope_files(
        graph: &UnifiedGraphIndex,
        matcher: &NodeMatcher,
        scope: &NodeSelector,
    ) -> Result<FxHashSet<String>> {
        Ok(matcher
            .match_nodes(graph, scope)?
            .into_iter()
            .map(|n| n.file_path)
            .filter(|p| !p.is_empty())
            .collect())
    }

    /// Collection analysis does not distinguish same-typed collections;
    /// paths through `[*]` abstract elements carry the heap-cutoff marker.
    fn mark_heap_uncertainty(paths: &mut [PathResult]) {
        for path in paths {
            if path.nodes.iter().any(|n| n.id.contains("[*]")) {
                path.mark_uncertain(UncertainReason::HeapCutoff);
            }
        }
    }
}
