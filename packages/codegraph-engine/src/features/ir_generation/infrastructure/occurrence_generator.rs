//! Occurrence generation
//!
//! Runs after the structural IR is complete: definitions from symbol nodes,
//! imports from import nodes, reads/writes from the data-flow layer.

use rustc_hash::FxHashSet;

use crate::features::ir_generation::domain::IRDocument;
use crate::shared::models::{
    NodeKind, Occurrence, Span, SpanPool, SymbolRole, SymbolRoles, VariableKind,
};

/// Occurrence spans repeat heavily (one per reference); intern them so
/// identical spans share storage process-wide.
fn interned(span: Span) -> Span {
    *SpanPool::global().intern(span)
}

fn is_symbol_kind(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::Module
            | NodeKind::Class
            | NodeKind::Interface
            | NodeKind::Function
            | NodeKind::Method
            | NodeKind::Lambda
            | NodeKind::Variable
            | NodeKind::Field
    )
}

fn is_test_path(file_path: &str) -> bool {
    let lowered = file_path.to_lowercase();
    lowered.contains("/tests/")
        || lowered.contains("/test/")
        || lowered.rsplit('/').next().is_some_and(|f| {
            f.starts_with("test_") || f.ends_with("_test.py") || f.ends_with("_test.rs")
        })
}

fn importance_for(kind: NodeKind, name: &str, is_test: bool) -> f32 {
    let base: f32 = match kind {
        NodeKind::Class | NodeKind::Interface => 0.9,
        NodeKind::Function | NodeKind::Method => 0.7,
        NodeKind::Module => 0.6,
        NodeKind::Field => 0.5,
        _ => 0.4,
    };
    let visibility_penalty = if name.starts_with('_') { 0.2 } else { 0.0 };
    let test_penalty = if is_test { 0.2 } else { 0.0 };
    (base - visibility_penalty - test_penalty).clamp(0.0, 1.0)
}

/// Generate occurrences for a completed document.
pub fn generate_occurrences(doc: &IRDocument) -> Vec<Occurrence> {
    let mut occurrences = Vec::new();
    let mut seq: u64 = 0;
    // at most one Definition per (symbol, file)
    let mut seen_defs: FxHashSet<(String, String)> = FxHashSet::default();

    for node in &doc.nodes {
        let is_test = is_test_path(&node.file_path);

        if node.kind == NodeKind::Import {
            seq += 1;
            occurrences.push(Occurrence {
                id: format!("occ:imp:{}:{}", node.id, seq),
                symbol_id: node.id.clone(),
                span: interned(node.span),
                roles: SymbolRoles::import(),
                file_path: node.file_path.clone(),
                importance_score: 0.3,
                parent_symbol_id: node.parent_id.clone(),
                enclosing_range: None,
            });
            continue;
        }

        if !is_symbol_kind(node.kind) || node.is_external() {
            continue;
        }
        let key = (node.id.clone(), node.file_path.clone());
        if !seen_defs.insert(key) {
            continue;
        }

        seq += 1;
        let mut roles = SymbolRoles::definition();
        if is_test {
            roles.add(SymbolRole::Test);
        }
        occurrences.push(Occurrence {
            id: format!("occ:def:{}:{}", node.id, seq),
            symbol_id: node.id.clone(),
            span: interned(node.span),
            roles,
            file_path: node.file_path.clone(),
            importance_score: importance_for(node.kind, node.simple_name(), is_test),
            parent_symbol_id: node.parent_id.clone(),
            enclosing_range: node.body_span,
        });
    }

    // variable writes from DFG versions, reads from expression loads
    if let Some(dfg) = &doc.dfg {
        for var in &dfg.variables {
            if var.is_call_temp() {
                continue;
            }
            if let Some(span) = var.decl_span {
                seq += 1;
                let roles = match var.kind {
                    VariableKind::Param => SymbolRoles::definition(),
                    _ => SymbolRoles::write_access(),
                };
                occurrences.push(Occurrence {
                    id: format!("occ:var:{}:{}", var.id, seq),
                    symbol_id: var.id.clone(),
                    span: interned(span),
                    roles,
                    file_path: var.file_path.clone(),
                    importance_score: 0.3,
                    parent_symbol_id: None,
                    enclosing_range: None,
                });
            }
        }
    }

    for expr in &doc.expressions {
        if expr.reads_vars.is_empty() {
            continue;
        }
        seq += 1;
        occurrences.push(Occurrence {
            id: format!("occ:read:{}:{}", expr.id, seq),
            symbol_id: expr.id.clone(),
            span: interned(expr.span),
            roles: SymbolRoles::read_access(),
            file_path: expr.file_path.clone(),
            importance_score: 0.2,
            parent_symbol_id: expr.function_fqn.clone(),
            enclosing_range: None,
        });
    }

    occurrences
}
