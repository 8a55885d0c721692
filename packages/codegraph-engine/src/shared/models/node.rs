//! Structural IR node

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::span::Span;

/// Canonical node kinds across every supported language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Module,
    File,
    Class,
    Interface,
    Function,
    Method,
    Lambda,
    Parameter,
    Variable,
    Field,
    Property,
    Import,
    Expression,
    Block,
    TemplateSlot,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Module => "module",
            NodeKind::File => "file",
            NodeKind::Class => "class",
            NodeKind::Interface => "interface",
            NodeKind::Function => "function",
            NodeKind::Method => "method",
            NodeKind::Lambda => "lambda",
            NodeKind::Parameter => "parameter",
            NodeKind::Variable => "variable",
            NodeKind::Field => "field",
            NodeKind::Property => "property",
            NodeKind::Import => "import",
            NodeKind::Expression => "expression",
            NodeKind::Block => "block",
            NodeKind::TemplateSlot => "template_slot",
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, NodeKind::Function | NodeKind::Method | NodeKind::Lambda)
    }
}

/// Per-function control-flow summary, computed during the IR walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ControlFlowSummary {
    pub cyclomatic_complexity: u32,
    pub has_loop: bool,
    pub has_try: bool,
    pub branch_count: u32,
}

/// Structural IR node.
///
/// `id` is deterministic from `{kind}:{fqn}` (content hashes for anonymous
/// constructs) and stable across snapshots for unchanged symbols. `kind`
/// determines which attrs are meaningful.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    pub fqn: String,
    pub file_path: String,
    pub span: Span,
    pub language: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_span: Option<Span>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_classes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_annotation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_flow: Option<ControlFlowSummary>,

    /// Untyped attribute bag; which keys are meaningful depends on `kind`.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attrs: HashMap<String, Value>,
}

impl Node {
    pub fn new(
        id: impl Into<String>,
        kind: NodeKind,
        fqn: impl Into<String>,
        file_path: impl Into<String>,
        span: Span,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            fqn: fqn.into(),
            file_path: file_path.into(),
            span,
            language: String::new(),
            name: None,
            module_path: None,
            parent_id: None,
            body_span: None,
            docstring: None,
            base_classes: None,
            return_type: None,
            type_annotation: None,
            content_hash: None,
            control_flow: None,
            attrs: HashMap::new(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_module_path(mut self, module_path: impl Into<String>) -> Self {
        self.module_path = Some(module_path.into());
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attrs.insert(key.into(), value);
        self
    }

    pub fn is_external(&self) -> bool {
        self.attrs
            .get("is_external")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Simple name, falling back to the last FQN segment.
    pub fn simple_name(&self) -> &str {
        if let Some(name) = &self.name {
            return name;
        }
        self.fqn.rsplit('.').next().unwrap_or(&self.fqn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_builder_chain() {
        let node = Node::new("function:m.f", NodeKind::Function, "m.f", "m.py", Span::line(3))
            .with_language("python")
            .with_name("f")
            .with_module_path("m");

        assert_eq!(node.kind, NodeKind::Function);
        assert_eq!(node.simple_name(), "f");
        assert_eq!(node.module_path.as_deref(), Some("m"));
        assert!(!node.is_external());
    }

    #[test]
    fn test_external_flag() {
        let node = Node::new(
            "function:external.eval",
            NodeKind::Function,
            "external.eval",
            "",
            Span::zero(),
        )
        .with_attr("is_external", Value::Bool(true));
        assert!(node.is_external());
    }

    #[test]
    fn test_simple_name_falls_back_to_fqn() {
        let node = Node::new("class:a.b.C", NodeKind::Class, "a.b.C", "a/b.py", Span::line(1));
        assert_eq!(node.simple_name(), "C");
    }
}
