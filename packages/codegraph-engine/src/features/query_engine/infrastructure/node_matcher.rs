//! NodeMatcher: selectors to node sets
//!
//! Each selector type dispatches to a typed matcher returning
//! `UnifiedNode`s. Source/Sink resolve in priority order: direct
//! expression id (`expr:` prefix), taint-config category, then atom id /
//! simple-name fallback. Unions and intersections deduplicate by node id.

use rustc_hash::FxHashSet;
use serde_json::Value;
use tracing::debug;

use crate::errors::{EngineError, Result};
use crate::features::query_engine::domain::{NodeSelector, SelectorType, UnifiedNode};
use crate::features::taint::domain::TaintConfig;
use crate::shared::models::NodeKind;

use super::graph_index::UnifiedGraphIndex;
use super::pattern_cache::glob_to_regex;

pub struct NodeMatcher {
    taint_config: TaintConfig,
}

impl NodeMatcher {
    pub fn new(taint_config: TaintConfig) -> Self {
        Self { taint_config }
    }

    pub fn with_default_config() -> Self {
        Self::new(TaintConfig::default_config())
    }

    pub fn match_nodes(
        &self,
        graph: &UnifiedGraphIndex,
        selector: &NodeSelector,
    ) -> Result<Vec<UnifiedNode>> {
        let mut nodes = self.match_by_type(graph, selector)?;

        // structural .within(scope): keep matches inside the scope's files
        if let Some(scope_value) = selector.attrs.get("scope_selector") {
            if let Ok(scope) = serde_json::from_value::<NodeSelector>(scope_value.clone()) {
                let scope_files: FxHashSet<String> = self
                    .match_nodes(graph, &scope)?
                    .into_iter()
                    .map(|n| n.file_path)
                    .filter(|p| !p.is_empty())
                    .collect();
                nodes.retain(|n| scope_files.contains(&n.file_path));
            }
        }
        Ok(nodes)
    }

    fn match_by_type(
        &self,
        graph: &UnifiedGraphIndex,
        selector: &NodeSelector,
    ) -> Result<Vec<UnifiedNode>> {
        match selector.selector_type {
            SelectorType::Var => Ok(self.match_var(graph, selector)),
            SelectorType::Func => Ok(self.match_func(graph, selector)),
            SelectorType::Call => Ok(self.match_call(graph, selector)),
            SelectorType::Block => Ok(self.match_block(graph, selector)),
            SelectorType::Expr => Ok(self.match_expr(graph, selector)),
            SelectorType::Class => Ok(self.match_class(graph, selector)),
            SelectorType::Module => Ok(self.match_module(graph, selector)),
            SelectorType::Field => Ok(self.match_field(graph, selector)),
            SelectorType::Source => Ok(self.match_source(graph, selector)),
            SelectorType::Sink => Ok(self.match_sink(graph, selector)),
            SelectorType::Alias => Ok(self.match_alias(graph, selector)),
            SelectorType::TemplateSlot => Ok(self.match_template_slot(graph, selector)),
            SelectorType::Any => Ok(graph.get_all_nodes()),
            SelectorType::Union => self.match_union(graph, selector),
            SelectorType::Intersection => self.match_intersection(graph, selector),
        }
    }

    fn match_var(&self, graph: &UnifiedGraphIndex, selector: &NodeSelector) -> Vec<UnifiedNode> {
        let mut nodes = match (&selector.name, selector.attr_str("type"), selector.attr_str("scope")) {
            (Some(name), Some(type_id), _) => graph.find_vars_by_name_and_type(name, type_id),
            (Some(name), _, Some(scope)) => graph.find_vars_by_name_and_scope(name, scope),
            (Some(name), None, None) => graph.find_vars_by_name(name),
            (None, _, _) => graph
                .get_all_nodes()
                .into_iter()
                .filter(|n| n.kind == NodeKind::Variable)
                .collect(),
        };

        if let Some(context) = &selector.context {
            nodes.retain(|n| n.attr_str("context") == Some(context.as_str()));
        }
        nodes
    }

    fn match_func(&self, graph: &UnifiedGraphIndex, selector: &NodeSelector) -> Vec<UnifiedNode> {
        match &selector.name {
            Some(name) => graph.find_funcs_by_name(name),
            None => graph
                .get_all_nodes()
                .into_iter()
                .filter(|n| matches!(n.kind, NodeKind::Function | NodeKind::Method))
                .collect(),
        }
    }

    fn match_call(&self, graph: &UnifiedGraphIndex, selector: &NodeSelector) -> Vec<UnifiedNode> {
        match &selector.name {
            Some(name) => graph.find_call_sites_by_name(name),
            None => graph
                .get_all_nodes()
                .into_iter()
                .filter(|n| {
                    n.kind == NodeKind::Expression && n.attr_str("expr_kind") == Some("Call")
                })
                .collect(),
        }
    }

    fn match_block(&self, graph: &UnifiedGraphIndex, selector: &NodeSelector) -> Vec<UnifiedNode> {
        let mut nodes: Vec<UnifiedNode> = graph
            .get_all_nodes()
            .into_iter()
            .filter(|n| n.kind == NodeKind::Block)
            .collect();
        if let Some(kind) = selector
            .attr_str("block_kind")
            .or(selector.name.as_deref())
        {
            nodes.retain(|n| n.attr_str("block_kind") == Some(kind));
        }
        nodes
    }

    fn match_expr(&self, graph: &UnifiedGraphIndex, selector: &NodeSelector) -> Vec<UnifiedNode> {
        // direct id first
        if let Some(id) = &selector.name {
            return match graph.get_node(id) {
                Some(node) if node.kind == NodeKind::Expression => vec![node],
                _ => Vec::new(),
            };
        }
        let mut nodes: Vec<UnifiedNode> = graph
            .get_all_nodes()
            .into_iter()
            .filter(|n| n.kind == NodeKind::Expression)
            .collect();
        if let Some(kind) = selector.attr_str("expr_kind") {
            nodes.retain(|n| n.attr_str("expr_kind") == Some(kind));
        }
        nodes
    }

    fn match_class(&self, graph: &UnifiedGraphIndex, selector: &NodeSelector) -> Vec<UnifiedNode> {
        match &selector.name {
            Some(name) => graph.find_classes_by_name(name),
            None => graph
                .get_all_nodes()
                .into_iter()
                .filter(|n| matches!(n.kind, NodeKind::Class | NodeKind::Interface))
                .collect(),
        }
    }

    fn match_module(&self, graph: &UnifiedGraphIndex, selector: &NodeSelector) -> Vec<UnifiedNode> {
        let nodes: Vec<UnifiedNode> = graph
            .get_all_nodes()
            .into_iter()
            .filter(|n| matches!(n.kind, NodeKind::Module | NodeKind::File))
            .collect();
        match &selector.pattern {
            Some(pattern) => match glob_to_regex(pattern) {
                Some(regex) => nodes
                    .into_iter()
                    .filter(|n| {
                        n.attr_str("module_path")
                            .or(n.attr_str("fqn"))
                            .is_some_and(|m| regex.is_match(m))
                    })
                    .collect(),
                None => Vec::new(),
            },
            None => nodes,
        }
    }

    fn match_field(&self, graph: &UnifiedGraphIndex, selector: &NodeSelector) -> Vec<UnifiedNode> {
        let (Some(obj), Some(field)) = (
            selector.attr_str("obj_name"),
            selector.attr_str("field_name"),
        ) else {
            return Vec::new();
        };

        let composite = format!("{}.{}", obj, field);
        let mut nodes = graph.find_vars_by_name(&composite);

        // attr-based field tracking on plain variables
        for node in graph.get_all_nodes() {
            if node.kind == NodeKind::Variable
                && node.name.as_deref() == Some(obj)
                && node.attr_str("field_path") == Some(field)
            {
                nodes.push(node);
            }
        }
        dedup_by_id(nodes)
    }

    fn match_source(&self, graph: &UnifiedGraphIndex, selector: &NodeSelector) -> Vec<UnifiedNode> {
        let Some(source_id) = &selector.name else {
            return Vec::new();
        };

        // (0) direct expression id
        if source_id.starts_with("expr:") {
            return graph.get_node(source_id).into_iter().collect();
        }

        // (1) taint-config category
        if self.taint_config.has_source_category(source_id) {
            let mut nodes = Vec::new();
            for name in self.taint_config.get_sources(source_id) {
                nodes.extend(graph.find_call_sites_by_name(name));
                nodes.extend(graph.find_vars_by_name(name));
            }
            return dedup_by_id(nodes);
        }

        // (2) atom id, then simple-name fallback
        let mut nodes = Vec::new();
        if let Some(names) = self.taint_config.atom_names(source_id) {
            for name in names {
                nodes.extend(graph.find_call_sites_by_name(name));
                nodes.extend(graph.find_vars_by_name(name));
            }
        }
        if nodes.is_empty() {
            nodes.extend(graph.find_call_sites_by_name(source_id));
            nodes.extend(graph.find_vars_by_name(source_id));
        }
        dedup_by_id(nodes)
    }

    fn match_sink(&self, graph: &UnifiedGraphIndex, selector: &NodeSelector) -> Vec<UnifiedNode> {
        let Some(sink_id) = &selector.name else {
            return Vec::new();
        };

        if sink_id.starts_with("expr:") {
            return graph.get_node(sink_id).into_iter().collect();
        }

        if self.taint_config.has_sink_category(sink_id) {
            let mut nodes = Vec::new();
            for name in self.taint_config.get_sinks(sink_id) {
                nodes.extend(graph.find_call_sites_by_name(name));
            }
            return dedup_by_id(nodes);
        }

        let mut nodes = Vec::new();
        if let Some(names) = self.taint_config.atom_names(sink_id) {
            for name in names {
                nodes.extend(graph.find_call_sites_by_name(name));
            }
        }
        if nodes.is_empty() {
            nodes.extend(graph.find_call_sites_by_name(sink_id));
        }
        dedup_by_id(nodes)
    }

    /// Aliases via the points-to map in the document meta; falls back to
    /// the original variables when alias info is unavailable.
    fn match_alias(&self, graph: &UnifiedGraphIndex, selector: &NodeSelector) -> Vec<UnifiedNode> {
        let Some(var_name) = &selector.name else {
            return Vec::new();
        };
        let original = graph.find_vars_by_name(var_name);
        if original.is_empty() {
            return original;
        }

        let mut nodes = original.clone();
        for node in &original {
            if let Some(Value::Array(aliases)) = node.attrs.get("aliases") {
                for alias_id in aliases.iter().filter_map(Value::as_str) {
                    if let Some(alias_node) = graph.get_node(alias_id) {
                        nodes.push(alias_node);
                    }
                }
            }
        }
        if nodes.len() == original.len() {
            debug!(var = var_name, "points_to_not_available");
        }
        dedup_by_id(nodes)
    }

    fn match_template_slot(
        &self,
        graph: &UnifiedGraphIndex,
        selector: &NodeSelector,
    ) -> Vec<UnifiedNode> {
        let mut nodes: Vec<UnifiedNode> = graph
            .get_all_nodes()
            .into_iter()
            .filter(|n| n.kind == NodeKind::TemplateSlot)
            .collect();
        if let Some(context_kind) = selector.attr_str("context_kind") {
            nodes.retain(|n| n.attr_str("context_kind") == Some(context_kind));
        }
        if let Some(Value::Bool(is_sink)) = selector.attrs.get("is_sink") {
            nodes.retain(|n| n.attrs.get("is_sink") == Some(&Value::Bool(*is_sink)));
        }
        nodes
    }

    fn match_union(
        &self,
        graph: &UnifiedGraphIndex,
        selector: &NodeSelector,
    ) -> Result<Vec<UnifiedNode>> {
        if selector.operands.is_empty() {
            return Err(EngineError::invalid_query(
                "union selector without operands",
                "combine selectors with `|`",
            ));
        }
        let mut nodes = Vec::new();
        for operand in &selector.operands {
            nodes.extend(self.match_nodes(graph, operand)?);
        }
        Ok(dedup_by_id(nodes))
    }

    fn match_intersection(
        &self,
        graph: &UnifiedGraphIndex,
        selector: &NodeSelector,
    ) -> Result<Vec<UnifiedNode>> {
        if selector.operands.is_empty() {
            return Err(EngineError::invalid_query(
                "intersection selector without operands",
                "combine selectors with `&`",
            ));
        }
        let mut result = self.match_nodes(graph, &selector.operands[0])?;
        for operand in &selector.operands[1..] {
            let ids: FxHashSet<String> = self
                .match_nodes(graph, operand)?
                .into_iter()
                .map(|n| n.id)
                .collect();
            result.retain(|n| ids.contains(&n.id));
        }
        Ok(result)
    }
}

fn dedup_by_id(nodes: Vec<UnifiedNode>) -> Vec<UnifiedNode> {
    let mut seen = FxHashSet::default();
    nodes
        .into_iter()
        .filter(|n| seen.insert(n.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::ir_generation::domain::IRDocument;
    use crate::features::query_engine::domain::Q;
    use crate::shared::models::{ExprKind, Expression, Span};

    fn graph_with_input_call() -> UnifiedGraphIndex {
        let mut doc = IRDocument::new("repo", "snap");
        doc.expressions.push(Expression::new(
            "expr:t.py:1:13:0",
            ExprKind::Call {
                callee: "input".into(),
                args: vec![],
                receiver: None,
            },
            Span::line(1),
            "t.py",
        ));
        UnifiedGraphIndex::build(&doc).unwrap()
    }

    #[test]
    fn test_source_category_matches_call_sites() {
        let graph = graph_with_input_call();
        let matcher = NodeMatcher::with_default_config();
        let nodes = matcher.match_nodes(&graph, &Q::source("request")).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].id, "expr:t.py:1:13:0");
    }

    #[test]
    fn test_source_direct_expression_id() {
        let graph = graph_with_input_call();
        let matcher = NodeMatcher::with_default_config();
        let nodes = matcher
            .match_nodes(&graph, &Q::source("expr:t.py:1:13:0"))
            .unwrap();
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn test_union_dedups() {
        let graph = graph_with_input_call();
        let matcher = NodeMatcher::with_default_config();
        let union = Q::call("input") | Q::source("request");
        let nodes = matcher.match_nodes(&graph, &union).unwrap();
        assert_eq!(nodes.len(), 1);
    }
}
