//! Structural IR edge

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    Contains,
    Calls,
    Imports,
    Inherits,
    Overrides,
    Reads,
    Writes,
    DataFlow,
    ControlFlow,
    Binds,
    Renders,
    Escapes,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Contains => "contains",
            EdgeKind::Calls => "calls",
            EdgeKind::Imports => "imports",
            EdgeKind::Inherits => "inherits",
            EdgeKind::Overrides => "overrides",
            EdgeKind::Reads => "reads",
            EdgeKind::Writes => "writes",
            EdgeKind::DataFlow => "data_flow",
            EdgeKind::ControlFlow => "control_flow",
            EdgeKind::Binds => "binds",
            EdgeKind::Renders => "renders",
            EdgeKind::Escapes => "escapes",
        }
    }

    pub fn is_data_flow(&self) -> bool {
        matches!(self, EdgeKind::DataFlow | EdgeKind::Reads | EdgeKind::Writes)
    }

    pub fn is_control_flow(&self) -> bool {
        matches!(self, EdgeKind::ControlFlow)
    }
}

/// Structural IR edge.
///
/// The id is deterministic from (kind, source, target, occurrence) so
/// duplicate kind+source+target edges coexist: two calls from A to B get
/// occurrence 1 and 2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub kind: EdgeKind,
    pub source_id: String,
    pub target_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attrs: HashMap<String, Value>,
}

impl Edge {
    pub fn new(
        kind: EdgeKind,
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        occurrence: u32,
    ) -> Self {
        let source_id = source_id.into();
        let target_id = target_id.into();
        let id = Self::make_id(kind, &source_id, &target_id, occurrence);
        Self {
            id,
            kind,
            source_id,
            target_id,
            span: None,
            attrs: HashMap::new(),
        }
    }

    pub fn make_id(kind: EdgeKind, source_id: &str, target_id: &str, occurrence: u32) -> String {
        format!(
            "edge:{}:{}\u{2192}{}@{}",
            kind.as_str(),
            source_id,
            target_id,
            occurrence
        )
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attrs.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_id_disambiguates_occurrences() {
        let first = Edge::new(EdgeKind::Calls, "function:m.a", "function:m.b", 1);
        let second = Edge::new(EdgeKind::Calls, "function:m.a", "function:m.b", 2);
        assert_ne!(first.id, second.id);
        assert!(first.id.starts_with("edge:calls:"));
        assert!(first.id.ends_with("@1"));
    }

    #[test]
    fn test_edge_kind_categories() {
        assert!(EdgeKind::DataFlow.is_data_flow());
        assert!(EdgeKind::Reads.is_data_flow());
        assert!(EdgeKind::ControlFlow.is_control_flow());
        assert!(!EdgeKind::Calls.is_data_flow());
    }
}
