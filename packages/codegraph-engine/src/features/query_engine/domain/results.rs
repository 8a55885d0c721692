//! Query results
//!
//! `UnifiedNode`/`UnifiedEdge` are read-only projections over IR entities;
//! `PathSet` carries the stop reason plus metrics, with the legacy
//! `complete`/`truncation_reason` pair derived for compatibility.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::shared::models::{NodeKind, Span};

use super::types::EdgeType;

/// Why query execution stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StopReason {
    Complete,
    Timeout,
    MaxPaths,
    MaxNodes,
    MaxDepth,
    ScopeLimit,
    NoMatch,
    Error,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::Complete => "complete",
            StopReason::Timeout => "timeout",
            StopReason::MaxPaths => "max_paths",
            StopReason::MaxNodes => "max_nodes",
            StopReason::MaxDepth => "max_depth",
            StopReason::ScopeLimit => "scope_limit",
            StopReason::NoMatch => "no_match",
            StopReason::Error => "error",
        }
    }
}

/// Legacy truncation reason, derived from `StopReason`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TruncationReason {
    Timeout,
    NodeLimit,
    PathLimit,
}

/// Why a path is marked uncertain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UncertainReason {
    MayAlias,
    ContextCutoff,
    SummaryApprox,
    HeapCutoff,
    ExternalCall,
}

/// Read-only projection of any IR entity for the query layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedNode {
    pub id: String,
    pub kind: NodeKind,
    pub name: Option<String>,
    pub file_path: String,
    pub span: Option<Span>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attrs: HashMap<String, Value>,
}

impl UnifiedNode {
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedEdge {
    pub from_node: String,
    pub to_node: String,
    pub edge_type: EdgeType,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attrs: HashMap<String, Value>,
}

impl UnifiedEdge {
    pub fn new(from_node: impl Into<String>, to_node: impl Into<String>, edge_type: EdgeType) -> Self {
        Self {
            from_node: from_node.into(),
            to_node: to_node.into(),
            edge_type,
            attrs: HashMap::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attrs.insert(key.into(), value);
        self
    }

    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(Value::as_str)
    }
}

/// One discovered path: ordered nodes and the edges between them
/// (`edges.len() == nodes.len() - 1` unless empty).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PathResult {
    pub nodes: Vec<UnifiedNode>,
    pub edges: Vec<UnifiedEdge>,
    pub uncertain: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uncertain_reasons: Vec<UncertainReason>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tainted_variables: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub call_context_ids: Vec<u64>,
    pub is_sanitized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
}

impl PathResult {
    pub fn new(nodes: Vec<UnifiedNode>, edges: Vec<UnifiedEdge>) -> Self {
        Self {
            nodes,
            edges,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains_node_id(&self, node_id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == node_id)
    }

    pub fn has_edge_type(&self, edge_type: EdgeType) -> bool {
        if edge_type == EdgeType::All {
            return !self.edges.is_empty();
        }
        self.edges.iter().any(|e| e.edge_type == edge_type)
    }

    pub fn subpath(&self, start: usize, end: usize) -> PathResult {
        let nodes = self.nodes[start..end].to_vec();
        let edges = if end > start + 1 {
            self.edges[start..end - 1].to_vec()
        } else {
            Vec::new()
        };
        PathResult {
            nodes,
            edges,
            uncertain: self.uncertain,
            uncertain_reasons: self.uncertain_reasons.clone(),
            ..Default::default()
        }
    }

    pub fn mark_uncertain(&mut self, reason: UncertainReason) {
        self.uncertain = true;
        if !self.uncertain_reasons.contains(&reason) {
            self.uncertain_reasons.push(reason);
        }
    }
}

/// Existential query result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSet {
    pub paths: Vec<PathResult>,
    pub stop_reason: StopReason,
    pub elapsed_ms: u64,
    pub nodes_visited: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

impl PathSet {
    pub fn new(paths: Vec<PathResult>, stop_reason: StopReason) -> Self {
        Self {
            paths,
            stop_reason,
            elapsed_ms: 0,
            nodes_visited: 0,
            diagnostics: Vec::new(),
        }
    }

    pub fn empty(stop_reason: StopReason) -> Self {
        Self::new(Vec::new(), stop_reason)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Legacy field: fully explored?
    pub fn complete(&self) -> bool {
        self.stop_reason == StopReason::Complete || self.stop_reason == StopReason::NoMatch
    }

    /// Legacy field derived from the stop reason.
    pub fn truncation_reason(&self) -> Option<TruncationReason> {
        match self.stop_reason {
            StopReason::Timeout => Some(TruncationReason::Timeout),
            StopReason::MaxNodes => Some(TruncationReason::NodeLimit),
            StopReason::MaxPaths | StopReason::MaxDepth => Some(TruncationReason::PathLimit),
            _ => None,
        }
    }

    pub fn is_partial(&self) -> bool {
        matches!(
            self.stop_reason,
            StopReason::Timeout | StopReason::MaxPaths | StopReason::MaxNodes | StopReason::MaxDepth
        )
    }

    pub fn shortest(&self) -> Option<&PathResult> {
        self.paths.iter().min_by_key(|p| p.len())
    }

    pub fn longest(&self) -> Option<&PathResult> {
        self.paths.iter().max_by_key(|p| p.len())
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.paths.truncate(n);
        self
    }

    pub fn describe(&self) -> String {
        if self.complete() {
            format!("PathSet: {} paths, complete", self.len())
        } else {
            format!(
                "PathSet: {} paths, truncated ({})",
                self.len(),
                self.stop_reason.as_str()
            )
        }
    }
}

/// Universal query result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violation_path: Option<PathResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str) -> UnifiedNode {
        UnifiedNode {
            id: id.into(),
            kind: NodeKind::Variable,
            name: Some(id.into()),
            file_path: "t.py".into(),
            span: None,
            attrs: HashMap::new(),
        }
    }

    #[test]
    fn test_legacy_fields_derived() {
        let complete = PathSet::empty(StopReason::Complete);
        assert!(complete.complete());
        assert_eq!(complete.truncation_reason(), None);

        let truncated = PathSet::empty(StopReason::MaxNodes);
        assert!(!truncated.complete());
        assert_eq!(truncated.truncation_reason(), Some(TruncationReason::NodeLimit));
        assert!(truncated.is_partial());
    }

    #[test]
    fn test_shortest_longest() {
        let set = PathSet::new(
            vec![
                PathResult::new(vec![node("a"), node("b"), node("c")], vec![]),
                PathResult::new(vec![node("a"), node("c")], vec![]),
            ],
            StopReason::Complete,
        );
        assert_eq!(set.shortest().unwrap().len(), 2);
        assert_eq!(set.longest().unwrap().len(), 3);
    }

    #[test]
    fn test_mark_uncertain_dedups() {
        let mut path = PathResult::new(vec![node("a")], vec![]);
        path.mark_uncertain(UncertainReason::HeapCutoff);
        path.mark_uncertain(UncertainReason::HeapCutoff);
        assert!(path.uncertain);
        assert_eq!(path.uncertain_reasons.len(), 1);
    }
}
