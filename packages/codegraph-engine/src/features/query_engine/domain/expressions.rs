//! Flow expressions and executable queries
//!
//! A `FlowExpr` is structural only. Attaching the first constraint or
//! safety limit promotes it to a `PathQuery`, which the engine executes.
//! Direct execution outside the engine is an invalid query.

use crate::errors::{EngineError, Result};

use super::results::{PathResult, PathSet, VerificationResult};
use super::selectors::{EdgeSelector, NodeSelector};
use super::types::{ConstraintMode, ContextStrategy, SensitivityMode, TraversalDirection};

/// Path predicate for `where` constraints.
pub type PathPredicate = Box<dyn Fn(&PathResult) -> bool + Send + Sync>;

/// Structural flow expression created by `>>`, `<<`, or `.direct()`.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowExpr {
    pub source: NodeSelector,
    pub target: NodeSelector,
    pub direction: TraversalDirection,
    pub edge_type: Option<EdgeSelector>,
    /// (min, max) hop counts.
    pub depth_range: (usize, usize),
}

impl FlowExpr {
    pub fn new(source: NodeSelector, target: NodeSelector, direction: TraversalDirection) -> Self {
        Self {
            source,
            target,
            direction,
            edge_type: None,
            depth_range: (1, 10),
        }
    }

    pub fn via(mut self, edge: EdgeSelector) -> Self {
        self.edge_type = Some(edge);
        self
    }

    pub fn depth(mut self, max_hops: usize, min_hops: usize) -> Self {
        self.depth_range = (min_hops, max_hops);
        self
    }

    // ============================================================
    // Auto-promotion to PathQuery
    // ============================================================

    pub fn where_path<F>(self, predicate: F) -> PathQuery
    where
        F: Fn(&PathResult) -> bool + Send + Sync + 'static,
    {
        PathQuery::from_flow_expr(self).where_path(predicate)
    }

    pub fn within(self, scope: NodeSelector, mode: ConstraintMode) -> PathQuery {
        PathQuery::from_flow_expr(self).within(scope, mode)
    }

    pub fn excluding(self, nodes: NodeSelector) -> PathQuery {
        PathQuery::from_flow_expr(self).excluding(nodes)
    }

    pub fn cleansed_by(self, sanitizer: NodeSelector) -> PathQuery {
        PathQuery::from_flow_expr(self).cleansed_by(sanitizer)
    }

    pub fn context_sensitive(self, k: u32, strategy: ContextStrategy) -> PathQuery {
        PathQuery::from_flow_expr(self).context_sensitive(k, strategy)
    }

    pub fn alias_sensitive(self, mode: SensitivityMode) -> PathQuery {
        PathQuery::from_flow_expr(self).alias_sensitive(mode)
    }

    pub fn limit_paths(self, n: usize) -> PathQuery {
        PathQuery::from_flow_expr(self).limit_paths(n)
    }

    pub fn limit_nodes(self, n: usize) -> PathQuery {
        PathQuery::from_flow_expr(self).limit_nodes(n)
    }

    pub fn timeout(self, ms: u64) -> PathQuery {
        PathQuery::from_flow_expr(self).timeout(ms)
    }
}

/// One attached constraint; applied in attachment order after traversal.
pub enum Constraint {
    Where(PathPredicate),
    Within {
        scope: NodeSelector,
        mode: ConstraintMode,
    },
    Excluding(NodeSelector),
    /// Keep only paths passing through the sanitizer (the opposite of
    /// `Excluding`).
    CleansedBy(NodeSelector),
}

impl std::fmt::Debug for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Constraint::Where(_) => write!(f, "Where(<predicate>)"),
            Constraint::Within { scope, mode } => {
                write!(f, "Within({:?}, {:?})", scope.selector_type, mode)
            }
            Constraint::Excluding(sel) => write!(f, "Excluding({:?})", sel.selector_type),
            Constraint::CleansedBy(sel) => write!(f, "CleansedBy({:?})", sel.selector_type),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sensitivity {
    pub context: Option<(u32, ContextStrategy)>,
    pub alias: Option<SensitivityMode>,
}

/// Per-query safety overrides; unset fields fall back to the mode preset.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SafetyLimits {
    pub max_paths: Option<usize>,
    pub max_nodes: Option<usize>,
    pub timeout_ms: Option<u64>,
}

/// Executable query: a flow expression plus constraints and limits.
#[derive(Debug)]
pub struct PathQuery {
    pub flow: FlowExpr,
    pub constraints: Vec<Constraint>,
    pub sensitivity: Sensitivity,
    pub safety: SafetyLimits,
}

impl PathQuery {
    pub fn from_flow_expr(flow: FlowExpr) -> Self {
        Self {
            flow,
            constraints: Vec::new(),
            sensitivity: Sensitivity::default(),
            safety: SafetyLimits::default(),
        }
    }

    pub fn where_path<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&PathResult) -> bool + Send + Sync + 'static,
    {
        self.constraints.push(Constraint::Where(Box::new(predicate)));
        self
    }

    pub fn within(mut self, scope: NodeSelector, mode: ConstraintMode) -> Self {
        self.constraints.push(Constraint::Within { scope, mode });
        self
    }

    pub fn excluding(mut self, nodes: NodeSelector) -> Self {
        self.constraints.push(Constraint::Excluding(nodes));
        self
    }

    pub fn cleansed_by(mut self, sanitizer: NodeSelector) -> Self {
        self.constraints.push(Constraint::CleansedBy(sanitizer));
        self
    }

    pub fn context_sensitive(mut self, k: u32, strategy: ContextStrategy) -> Self {
        self.sensitivity.context = Some((k, strategy));
        self
    }

    pub fn alias_sensitive(mut self, mode: SensitivityMode) -> Self {
        self.sensitivity.alias = Some(mode);
        self
    }

    pub fn limit_paths(mut self, n: usize) -> Self {
        self.safety.max_paths = Some(n);
        self
    }

    pub fn limit_nodes(mut self, n: usize) -> Self {
        self.safety.max_nodes = Some(n);
        self
    }

    pub fn timeout(mut self, ms: u64) -> Self {
        self.safety.timeout_ms = Some(ms);
        self
    }

    // ============================================================
    // Execution stubs: queries run through the engine only
    // ============================================================

    /// Existential query. Must be executed through `QueryEngine`.
    pub fn any_path(&self) -> Result<PathSet> {
        Err(EngineError::invalid_query(
            "PathQuery::any_path() must be executed through the query engine",
            "use QueryEngine::execute_any_path(query)",
        ))
    }

    /// Universal query. Must be executed through `QueryEngine`.
    pub fn all_paths(&self) -> Result<VerificationResult> {
        Err(EngineError::invalid_query(
            "PathQuery::all_paths() must be executed through the query engine",
            "use QueryEngine::execute_all_paths(query)",
        ))
    }

    pub fn explain(&self) -> String {
        let mut parts = vec![
            format!(
                "Flow: {} -> {}",
                self.flow.source.cache_descriptor(),
                self.flow.target.cache_descriptor()
            ),
            format!("Direction: {:?}", self.flow.direction),
            format!(
                "Edge: {}",
                self.flow
                    .edge_type
                    .as_ref()
                    .map(|e| e.cache_descriptor())
                    .unwrap_or_else(|| "via:all".to_string())
            ),
            format!(
                "Depth: {}-{} hops",
                self.flow.depth_range.0, self.flow.depth_range.1
            ),
        ];
        if !self.constraints.is_empty() {
            parts.push(format!("Constraints: {}", self.constraints.len()));
        }
        parts.join("\n")
    }
}

impl From<FlowExpr> for PathQuery {
    fn from(flow: FlowExpr) -> Self {
        PathQuery::from_flow_expr(flow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::query_engine::domain::factories::{E, Q};

    #[test]
    fn test_flow_expr_defaults() {
        let expr = Q::var("user") >> Q::call("execute");
        assert_eq!(expr.direction, TraversalDirection::Forward);
        assert_eq!(expr.depth_range, (1, 10));
        assert!(expr.edge_type.is_none());
    }

    #[test]
    fn test_promotion_accumulates() {
        let query = (Q::source("request") >> Q::sink("execute"))
            .via(E::dfg())
            .limit_paths(20)
            .timeout(5000)
            .where_path(|p| p.len() > 2);

        assert_eq!(query.safety.max_paths, Some(20));
        assert_eq!(query.safety.timeout_ms, Some(5000));
        assert_eq!(query.constraints.len(), 1);
    }

    #[test]
    fn test_direct_execution_is_invalid() {
        let query = (Q::var("x") >> Q::any()).limit_paths(1);
        let err = query.any_path().unwrap_err();
        assert!(matches!(err, EngineError::InvalidQuery { .. }));
    }
}
