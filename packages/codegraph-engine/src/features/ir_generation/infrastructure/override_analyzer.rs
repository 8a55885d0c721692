//! Override derivation
//!
//! Post-IR pass: match method names along resolved inheritance chains and
//! emit OVERRIDES edges. Dunder methods are excluded.

use rustc_hash::FxHashMap;

use crate::features::ir_generation::domain::IRDocument;
use crate::shared::models::{Edge, EdgeKind, Node, NodeKind};
use crate::shared::utils::IdGenerator;

fn is_dunder(name: &str) -> bool {
    name.starts_with("__") && name.ends_with("__")
}

/// Derive OVERRIDES edges for every (child method, parent method) pair with
/// a matching name along the inheritance chain.
pub fn derive_override_edges(doc: &IRDocument) -> Vec<Edge> {
    // class simple name → node, and class id → methods by name
    let mut classes_by_name: FxHashMap<&str, &Node> = FxHashMap::default();
    let mut methods_by_class: FxHashMap<&str, FxHashMap<&str, &str>> = FxHashMap::default();

    for node in &doc.nodes {
        match node.kind {
            NodeKind::Class => {
                classes_by_name.insert(node.simple_name(), node);
            }
            NodeKind::Method => {
                if let Some(parent_id) = &node.parent_id {
                    methods_by_class
                        .entry(parent_id.as_str())
                        .or_default()
                        .insert(node.simple_name(), node.id.as_str());
                }
            }
            _ => {}
        }
    }

    let mut edges = Vec::new();
    for node in &doc.nodes {
        if node.kind != NodeKind::Class {
            continue;
        }
        let Some(bases) = &node.base_classes else {
            continue;
        };
        let Some(child_methods) = methods_by_class.get(node.id.as_str()) else {
            continue;
        };

        for base in bases {
            let base_simple = base.rsplit('.').next().unwrap_or(base);
            let Some(parent_class) = classes_by_name.get(base_simple) else {
                continue;
            };
            let Some(parent_methods) = methods_by_class.get(parent_class.id.as_str()) else {
                continue;
            };

            for (name, child_id) in child_methods {
                if is_dunder(name) {
                    continue;
                }
                if let Some(parent_method_id) = parent_methods.get(name) {
                    let occurrence = IdGenerator::global().next_edge_occurrence(
                        EdgeKind::Overrides,
                        child_id,
                        parent_method_id,
                    );
                    edges.push(Edge::new(
                        EdgeKind::Overrides,
                        *child_id,
                        *parent_method_id,
                        occurrence,
                    ));
                }
            }
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::Span;

    fn class(fqn: &str, name: &str, bases: Option<Vec<String>>) -> Node {
        let mut node = Node::new(
            format!("class:{}", fqn),
            NodeKind::Class,
            fqn,
            "m.py",
            Span::line(1),
        )
        .with_name(name);
        node.base_classes = bases;
        node
    }

    fn method(class_fqn: &str, name: &str) -> Node {
        Node::new(
            format!("method:{}.{}", class_fqn, name),
            NodeKind::Method,
            format!("{}.{}", class_fqn, name),
            "m.py",
            Span::line(2),
        )
        .with_name(name)
        .with_parent(format!("class:{}", class_fqn))
    }

    #[test]
    fn test_override_edge_derived() {
        let mut doc = IRDocument::new("repo", "snap");
        doc.nodes.push(class("m.Parent", "Parent", None));
        doc.nodes.push(class("m.Child", "Child", Some(vec!["Parent".into()])));
        doc.nodes.push(method("m.Parent", "run"));
        doc.nodes.push(method("m.Child", "run"));
        doc.nodes.push(method("m.Child", "__init__"));
        doc.nodes.push(method("m.Parent", "__init__"));

        let edges = derive_override_edges(&doc);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].source_id, "method:m.Child.run");
        assert_eq!(edges[0].target_id, "method:m.Parent.run");
    }
}
