//! Q and E selector factories

use serde_json::Value;

use super::selectors::{EdgeSelector, NodeSelector};
use super::types::{EdgeType, SelectorType};

/// Node selector factory.
///
/// ```
/// use codegraph_engine::features::query_engine::domain::{E, Q};
///
/// let flow = (Q::call("input") >> Q::call("conn.execute")).via(E::dfg());
/// ```
pub struct Q;

impl Q {
    /// Variable by name: `Q::var("input")`.
    pub fn var(name: impl Into<String>) -> NodeSelector {
        NodeSelector::new(SelectorType::Var).with_name(name)
    }

    /// Wildcard variable (every variable).
    pub fn var_any() -> NodeSelector {
        NodeSelector::new(SelectorType::Var)
    }

    /// Variable with a type constraint.
    pub fn var_with_type(name: impl Into<String>, type_name: impl Into<String>) -> NodeSelector {
        NodeSelector::new(SelectorType::Var)
            .with_name(name)
            .with_attr("type", Value::String(type_name.into()))
    }

    /// Variable constrained to a scope (function FQN).
    pub fn var_in_scope(name: impl Into<String>, scope: impl Into<String>) -> NodeSelector {
        NodeSelector::new(SelectorType::Var)
            .with_name(name)
            .with_attr("scope", Value::String(scope.into()))
    }

    /// Function or method; accepts dotted `Class.method` names.
    pub fn func(name: impl Into<String>) -> NodeSelector {
        NodeSelector::new(SelectorType::Func).with_name(name)
    }

    pub fn func_any() -> NodeSelector {
        NodeSelector::new(SelectorType::Func)
    }

    /// Call site by callee name; dotless names suffix-match
    /// (`"execute"` matches `conn.execute`).
    pub fn call(name: impl Into<String>) -> NodeSelector {
        NodeSelector::new(SelectorType::Call).with_name(name)
    }

    pub fn call_any() -> NodeSelector {
        NodeSelector::new(SelectorType::Call)
    }

    /// CFG block by kind (`"Condition"`, `"LoopHeader"`, …).
    pub fn block(kind: impl Into<String>) -> NodeSelector {
        let kind = kind.into();
        NodeSelector::new(SelectorType::Block)
            .with_name(kind.clone())
            .with_attr("block_kind", Value::String(kind))
    }

    pub fn block_any() -> NodeSelector {
        NodeSelector::new(SelectorType::Block)
    }

    /// Module/file by glob pattern: `Q::module("core.*")`.
    pub fn module(pattern: impl Into<String>) -> NodeSelector {
        NodeSelector::new(SelectorType::Module).with_pattern(pattern)
    }

    pub fn class(name: impl Into<String>) -> NodeSelector {
        NodeSelector::new(SelectorType::Class).with_name(name)
    }

    /// Field-sensitive selector: `Q::field("user", "id")` matches `user.id`.
    pub fn field(obj: impl Into<String>, field: impl Into<String>) -> NodeSelector {
        let obj = obj.into();
        let field = field.into();
        NodeSelector::new(SelectorType::Field)
            .with_name(format!("{}.{}", obj, field))
            .with_attr("obj_name", Value::String(obj))
            .with_attr("field_name", Value::String(field))
    }

    /// Taint source: a category (`"request"`), a YAML atom id
    /// (`"input.http.flask"`), or a direct expression id (`"expr:…"`).
    pub fn source(category: impl Into<String>) -> NodeSelector {
        NodeSelector::new(SelectorType::Source).with_name(category)
    }

    /// Taint sink: a category, a YAML atom id, or an expression id.
    pub fn sink(category: impl Into<String>) -> NodeSelector {
        NodeSelector::new(SelectorType::Sink).with_name(category)
    }

    /// Expression by kind name: `Q::expr_kind("Call")`.
    pub fn expr_kind(kind: impl Into<String>) -> NodeSelector {
        NodeSelector::new(SelectorType::Expr)
            .with_attr("expr_kind", Value::String(kind.into()))
    }

    /// Expression by direct id.
    pub fn expr_id(id: impl Into<String>) -> NodeSelector {
        NodeSelector::new(SelectorType::Expr).with_name(id)
    }

    pub fn expr_any() -> NodeSelector {
        NodeSelector::new(SelectorType::Expr)
    }

    /// All aliases of a variable via points-to analysis; falls back to the
    /// original variable when alias info is unavailable.
    pub fn alias_of(var_name: impl Into<String>) -> NodeSelector {
        NodeSelector::new(SelectorType::Alias).with_name(var_name)
    }

    /// Template slot selector for XSS-style queries.
    pub fn template_slot(context_kind: Option<&str>, is_sink: Option<bool>) -> NodeSelector {
        let mut selector = NodeSelector::new(SelectorType::TemplateSlot);
        if let Some(kind) = context_kind {
            selector = selector.with_attr("context_kind", Value::String(kind.to_string()));
        }
        if let Some(sink) = is_sink {
            selector = selector.with_attr("is_sink", Value::Bool(sink));
        }
        selector
    }

    /// Wildcard: every node. Expensive; wildcard flows only.
    pub fn any() -> NodeSelector {
        NodeSelector::new(SelectorType::Any)
    }
}

/// Edge selector factory.
pub struct E;

impl E {
    /// Data-flow edges (def-use, reads, writes, interprocedural bridges).
    pub fn dfg() -> EdgeSelector {
        EdgeSelector::new(EdgeType::Dfg)
    }

    /// Control-flow edges between CFG blocks.
    pub fn cfg() -> EdgeSelector {
        EdgeSelector::new(EdgeType::Cfg)
    }

    /// Call-graph edges.
    pub fn call() -> EdgeSelector {
        EdgeSelector::new(EdgeType::Call)
    }

    /// Template binding edges (variable → slot).
    pub fn binds() -> EdgeSelector {
        EdgeSelector::new(EdgeType::Binds)
    }

    /// Template rendering edges (function → template).
    pub fn renders() -> EdgeSelector {
        EdgeSelector::new(EdgeType::Renders)
    }

    /// Template escaping edges (sanitizer → slot).
    pub fn escapes() -> EdgeSelector {
        EdgeSelector::new(EdgeType::Escapes)
    }

    /// Every edge class.
    pub fn all() -> EdgeSelector {
        EdgeSelector::new(EdgeType::All)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_q_var() {
        let selector = Q::var("user");
        assert_eq!(selector.selector_type, SelectorType::Var);
        assert_eq!(selector.name.as_deref(), Some("user"));
    }

    #[test]
    fn test_q_var_with_type() {
        let selector = Q::var_with_type("x", "str");
        assert_eq!(selector.attr_str("type"), Some("str"));
    }

    #[test]
    fn test_q_field_composite_name() {
        let selector = Q::field("user", "id");
        assert_eq!(selector.name.as_deref(), Some("user.id"));
        assert_eq!(selector.attr_str("obj_name"), Some("user"));
    }

    #[test]
    fn test_q_source_sink() {
        assert_eq!(Q::source("request").selector_type, SelectorType::Source);
        assert_eq!(Q::sink("execute").selector_type, SelectorType::Sink);
    }

    #[test]
    fn test_e_factories() {
        assert_eq!(E::dfg().edge_type, EdgeType::Dfg);
        assert_eq!(E::all().edge_type, EdgeType::All);
        let modified = E::dfg().backward().depth(5, 1);
        assert!(modified.is_backward);
        assert_eq!(modified.max_depth, 5);
    }
}
