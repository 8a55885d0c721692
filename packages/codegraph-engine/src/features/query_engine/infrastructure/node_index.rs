//! NodeIndex: O(1) node lookup
//!
//! Projects every IR entity (nodes, DFG variables, CFG blocks,
//! expressions) into `UnifiedNode`, and synthesises abstract nodes for
//! heap-element (`…[*]`) and callee-target (`callee:{name}:param:{n}`) ids
//! discovered in edges, so every edge endpoint resolves.

use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;

use crate::features::ir_generation::domain::IRDocument;
use crate::features::query_engine::domain::UnifiedNode;
use crate::shared::models::{CFGBlock, Expression, NodeKind, VariableEntity};

#[derive(Debug)]
pub struct NodeIndex {
    nodes: DashMap<String, UnifiedNode>,
}

impl NodeIndex {
    pub fn build(doc: &IRDocument) -> Self {
        let index = Self {
            nodes: DashMap::new(),
        };

        for node in &doc.nodes {
            index.nodes.insert(node.id.clone(), convert_ir_node(node));
        }

        if let Some(dfg) = &doc.dfg {
            for var in &dfg.variables {
                index.nodes.insert(var.id.clone(), convert_variable(var));
            }
        }

        for block in &doc.cfg_blocks {
            index.nodes.insert(block.id.clone(), convert_block(block, doc));
        }

        for expr in &doc.expressions {
            index.nodes.insert(expr.id.clone(), convert_expression(expr));
        }

        // abstract heap elements from interprocedural edges
        for edge in &doc.interprocedural_edges {
            index.ensure_abstract(&edge.from_var_id);
            index.ensure_abstract(&edge.to_var_id);
        }

        // callee targets (and any other synthetic endpoint) from DFG edges
        if let Some(dfg) = &doc.dfg {
            for edge in &dfg.edges {
                index.ensure_abstract(&edge.from_variable_id);
                index.ensure_abstract(&edge.to_variable_id);
            }
        }

        debug!(nodes = index.nodes.len(), "node_index_built");
        index
    }

    fn ensure_abstract(&self, node_id: &str) {
        if node_id.is_empty() || self.nodes.contains_key(node_id) {
            return;
        }
        self.nodes
            .insert(node_id.to_string(), create_abstract_node(node_id));
    }

    pub fn get(&self, node_id: &str) -> Option<UnifiedNode> {
        self.nodes.get(node_id).map(|n| n.value().clone())
    }

    pub fn exists(&self, node_id: &str) -> bool {
        self.nodes.contains_key(node_id)
    }

    /// Every node. Expensive; `Q.Any()` only.
    pub fn get_all(&self) -> Vec<UnifiedNode> {
        self.nodes.iter().map(|e| e.value().clone()).collect()
    }

    pub fn count(&self) -> usize {
        self.nodes.len()
    }
}

fn convert_ir_node(node: &crate::shared::models::Node) -> UnifiedNode {
    let mut attrs = node.attrs.clone();
    attrs.insert("fqn".to_string(), Value::String(node.fqn.clone()));
    if let Some(parent) = &node.parent_id {
        attrs.insert("parent_id".to_string(), Value::String(parent.clone()));
    }
    if let Some(module) = &node.module_path {
        attrs.insert("module_path".to_string(), Value::String(module.clone()));
    }
    UnifiedNode {
        id: node.id.clone(),
        kind: node.kind,
        name: node.name.clone(),
        file_path: node.file_path.clone(),
        span: Some(node.span),
        attrs,
    }
}

fn convert_variable(var: &VariableEntity) -> UnifiedNode {
    let mut attrs = std::collections::HashMap::new();
    attrs.insert(
        "function_fqn".to_string(),
        Value::String(var.function_fqn.clone()),
    );
    attrs.insert(
        "var_kind".to_string(),
        Value::String(format!("{:?}", var.kind)),
    );
    if let Some(type_id) = &var.type_id {
        attrs.insert("type_id".to_string(), Value::String(type_id.clone()));
    }
    if let Some(scope_id) = &var.scope_id {
        attrs.insert("scope_id".to_string(), Value::String(scope_id.clone()));
    }
    UnifiedNode {
        id: var.id.clone(),
        kind: NodeKind::Variable,
        name: Some(var.name.clone()),
        file_path: var.file_path.clone(),
        span: var.decl_span,
        attrs,
    }
}

fn convert_block(block: &CFGBlock, doc: &IRDocument) -> UnifiedNode {
    let file_path = doc
        .get_node(&block.function_node_id)
        .map(|n| n.file_path.clone())
        .unwrap_or_default();
    let mut attrs = std::collections::HashMap::new();
    attrs.insert(
        "block_kind".to_string(),
        Value::String(block.kind.as_str().to_string()),
    );
    attrs.insert(
        "function_node_id".to_string(),
        Value::String(block.function_node_id.clone()),
    );
    attrs.insert(
        "function_fqn".to_string(),
        Value::String(block.function_fqn.clone()),
    );
    UnifiedNode {
        id: block.id.clone(),
        kind: NodeKind::Block,
        name: Some(block.kind.as_str().to_string()),
        file_path,
        span: block.span,
        attrs,
    }
}

fn convert_expression(expr: &Expression) -> UnifiedNode {
    let mut attrs = expr.attrs.clone();
    attrs.insert(
        "expr_kind".to_string(),
        Value::String(expr.kind.kind_name().to_string()),
    );
    if let Some(fqn) = &expr.function_fqn {
        attrs.insert("function_fqn".to_string(), Value::String(fqn.clone()));
    }
    if let Some(block_id) = &expr.block_id {
        attrs.insert("block_id".to_string(), Value::String(block_id.clone()));
    }
    if let Some(callee) = expr.kind.callee_name() {
        attrs.insert("callee_name".to_string(), Value::String(callee.to_string()));
    }
    UnifiedNode {
        id: expr.id.clone(),
        kind: NodeKind::Expression,
        name: expr.kind.callee_name().map(str::to_string),
        file_path: expr.file_path.clone(),
        span: Some(expr.span),
        attrs,
    }
}

/// Synthetic node for an abstract endpoint id.
fn create_abstract_node(node_id: &str) -> UnifiedNode {
    let (kind, name) = if node_id.contains("[*]") {
        let base = node_id
            .rsplit(':')
            .next()
            .unwrap_or(node_id)
            .split('@')
            .next()
            .unwrap_or(node_id);
        (NodeKind::Variable, format!("<heap:{}[*]>", base))
    } else if node_id.starts_with("callee:") {
        (NodeKind::Function, node_id.to_string())
    } else if node_id.starts_with("var:") {
        let base = node_id
            .rsplit(':')
            .next()
            .unwrap_or(node_id)
            .split('@')
            .next()
            .unwrap_or(node_id)
            .to_string();
        (NodeKind::Variable, base)
    } else {
        (NodeKind::Variable, node_id.to_string())
    };

    let mut attrs = std::collections::HashMap::new();
    attrs.insert("abstract".to_string(), Value::Bool(true));
    attrs.insert("synthetic".to_string(), Value::Bool(true));
    UnifiedNode {
        id: node_id.to_string(),
        kind,
        name: Some(name),
        file_path: String::new(),
        span: None,
        attrs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{
        DataflowEdge, DataflowEdgeKind, DfgSnapshot, InterproceduralEdge, InterproceduralEdgeKind,
        Span,
    };

    #[test]
    fn test_synthesises_callee_targets() {
        let mut doc = IRDocument::new("repo", "snap");
        doc.dfg = Some(DfgSnapshot {
            variables: vec![],
            edges: vec![DataflowEdge::new(
                "var:t.py:m:x@1:0",
                "callee:os.system:param:0",
                DataflowEdgeKind::ParamBind,
            )],
        });

        let index = NodeIndex::build(&doc);
        let callee = index.get("callee:os.system:param:0").unwrap();
        assert_eq!(callee.kind, NodeKind::Function);
        assert_eq!(callee.attrs.get("synthetic"), Some(&Value::Bool(true)));
        assert!(index.exists("var:t.py:m:x@1:0"));
    }

    #[test]
    fn test_synthesises_heap_elements() {
        let mut doc = IRDocument::new("repo", "snap");
        doc.interprocedural_edges.push(InterproceduralEdge::new(
            "interproc:m:1",
            InterproceduralEdgeKind::CollectionLoad,
            "var:t.py:m:xs@1:0[*]",
            "var:t.py:m:y@3:4",
        ));

        let index = NodeIndex::build(&doc);
        let element = index.get("var:t.py:m:xs@1:0[*]").unwrap();
        assert_eq!(element.kind, NodeKind::Variable);
        assert!(element.name.unwrap().contains("[*]"));
    }
}
