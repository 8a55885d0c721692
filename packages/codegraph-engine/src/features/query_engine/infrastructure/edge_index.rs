//! EdgeIndex: bidirectional adjacency with synthetic bridge edges
//!
//! Besides projecting the IR's own edges, construction closes the gaps
//! that would otherwise break path finding across representation layers:
//!
//! 1. DFG snapshot edges (variable → variable)
//! 2. CFG edges between blocks
//! 3. expression ↔ variable edges resolved from `reads_vars`/`defines_var`
//!    names (every matching variable version)
//! 4. CALLS edges from the structural IR
//! 5. expression-tree edges (child → parent) so taint flows from arguments
//!    into their containing call
//! 6. interprocedural edges, plus a container → `[*]` element bridge for
//!    collection loads
//! 7. return-to-caller edges from every expression inside a callee to the
//!    call expression that binds its result
//! 8. callee-target (`callee:{name}:param:{n}`) → call-expression bridges
//! 9. call-expression → defined-variable edges, including the same-line
//!    `<call>` temporary heuristic for nested calls
//! 10. `callee:{lambda}:param:{n}` → lambda parameter variable bindings
//!
//! Duplicate (from, to, type) edges are collapsed so layered synthesis
//! never manufactures parallel paths.

use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::Value;
use tracing::debug;

use crate::features::ir_generation::domain::IRDocument;
use crate::features::query_engine::domain::{EdgeType, UnifiedEdge};
use crate::shared::models::{
    callee_param_id, EdgeKind, ExprKind, InterproceduralEdgeKind, VariableEntity,
};

#[derive(Debug, Default)]
pub struct EdgeIndex {
    edges_from: FxHashMap<String, Vec<UnifiedEdge>>,
    edges_to: FxHashMap<String, Vec<UnifiedEdge>>,
    dfg_from: FxHashMap<String, Vec<UnifiedEdge>>,
    cfg_from: FxHashMap<String, Vec<UnifiedEdge>>,
    call_from: FxHashMap<String, Vec<UnifiedEdge>>,
    seen: FxHashSet<(String, String, EdgeType)>,
    total: usize,
}

impl EdgeIndex {
    pub fn build(doc: &IRDocument) -> Self {
        let mut index = Self::default();

        index.add_dfg_snapshot_edges(doc);
        index.add_cfg_edges(doc);
        index.add_expr_var_edges(doc);
        index.add_structural_edges(doc);
        index.add_expr_tree_edges(doc);
        index.add_interprocedural_edges(doc);
        index.add_return_to_caller_edges(doc);
        index.add_callee_to_expr_edges(doc);
        index.add_expr_to_var_edges(doc);
        index.add_lambda_param_edges(doc);

        debug!(edges = index.total, "edge_index_built");
        index
    }

    fn add(&mut self, edge: UnifiedEdge) {
        let key = (edge.from_node.clone(), edge.to_node.clone(), edge.edge_type);
        if !self.seen.insert(key) {
            return;
        }
        self.total += 1;

        let typed = match edge.edge_type {
            EdgeType::Dfg => Some(&mut self.dfg_from),
            EdgeType::Cfg => Some(&mut self.cfg_from),
            EdgeType::Call => Some(&mut self.call_from),
            _ => None,
        };
        if let Some(map) = typed {
            map.entry(edge.from_node.clone()).or_default().push(edge.clone());
        }

        self.edges_to
            .entry(edge.to_node.clone())
            .or_default()
            .push(edge.clone());
        self.edges_from
            .entry(edge.from_node.clone())
            .or_default()
            .push(edge);
    }

    // 1. DFG snapshot
    fn add_dfg_snapshot_edges(&mut self, doc: &IRDocument) {
        let Some(dfg) = &doc.dfg else { return };
        for edge in &dfg.edges {
            self.add(
                UnifiedEdge::new(&edge.from_variable_id, &edge.to_variable_id, EdgeType::Dfg)
                    .with_attr("kind", Value::String(format!("{:?}", edge.kind))),
            );
        }
    }

    // 2. CFG
    fn add_cfg_edges(&mut self, doc: &IRDocument) {
        for edge in &doc.cfg_edges {
            self.add(
                UnifiedEdge::new(&edge.source_block_id, &edge.target_block_id, EdgeType::Cfg)
                    .with_attr("kind", Value::String(format!("{:?}", edge.kind))),
            );
        }
    }

    // 3. expression ↔ variable, resolved by variable NAME (all versions)
    fn add_expr_var_edges(&mut self, doc: &IRDocument) {
        let Some(dfg) = &doc.dfg else { return };
        let mut by_name: FxHashMap<&str, Vec<&str>> = FxHashMap::default();
        for var in &dfg.variables {
            by_name.entry(var.name.as_str()).or_default().push(&var.id);
        }

        for expr in &doc.expressions {
            for read in &expr.reads_vars {
                if let Some(ids) = by_name.get(read.as_str()) {
                    for var_id in ids {
                        self.add(
                            UnifiedEdge::new(*var_id, &expr.id, EdgeType::Dfg)
                                .with_attr("kind", Value::String("read".into())),
                        );
                    }
                }
            }
            if let Some(defined) = &expr.defines_var {
                // prefer the resolved version id the builder recorded
                if let Some(var_id) = expr.defines_var_id() {
                    self.add(
                        UnifiedEdge::new(&expr.id, var_id, EdgeType::Dfg)
                            .with_attr("kind", Value::String("define".into())),
                    );
                } else if let Some(ids) = by_name.get(defined.as_str()) {
                    for var_id in ids {
                        self.add(
                            UnifiedEdge::new(&expr.id, *var_id, EdgeType::Dfg)
                                .with_attr("kind", Value::String("define".into())),
                        );
                    }
                }
            }
        }
    }

    // 4. structural edges that have a flow meaning
    fn add_structural_edges(&mut self, doc: &IRDocument) {
        for edge in &doc.edges {
            let edge_type = match edge.kind {
                EdgeKind::Calls => EdgeType::Call,
                EdgeKind::Binds => EdgeType::Binds,
                EdgeKind::Renders => EdgeType::Renders,
                EdgeKind::Escapes => EdgeType::Escapes,
                _ => continue,
            };
            let mut unified = UnifiedEdge::new(&edge.source_id, &edge.target_id, edge_type);
            if let Some(callee) = edge.attrs.get("callee_name") {
                unified.attrs.insert("callee_name".to_string(), callee.clone());
            }
            self.add(unified);
        }
    }

    // 5. expression tree: child → parent (argument into containing call)
    fn add_expr_tree_edges(&mut self, doc: &IRDocument) {
        for expr in &doc.expressions {
            if let Some(parent) = &expr.parent_expr_id {
                self.add(
                    UnifiedEdge::new(&expr.id, parent, EdgeType::Dfg)
                        .with_attr("kind", Value::String("arg_to_call".into()))
                        .with_attr("expr_tree", Value::Bool(true)),
                );
            }
        }
    }

    // 6. interprocedural + collection element bridge
    fn add_interprocedural_edges(&mut self, doc: &IRDocument) {
        for edge in &doc.interprocedural_edges {
            let mut unified =
                UnifiedEdge::new(&edge.from_var_id, &edge.to_var_id, EdgeType::Dfg)
                    .with_attr(
                        "interproc_kind",
                        Value::String(format!("{:?}", edge.kind)),
                    );
            if let Some(callee) = &edge.callee_func_fqn {
                unified
                    .attrs
                    .insert("callee_fqn".to_string(), Value::String(callee.clone()));
            }
            self.add(unified);

            // container variable → abstract element, so iterators connect
            // to container taint
            if edge.kind == InterproceduralEdgeKind::CollectionLoad {
                if let Some(container) = &edge.collection_var_id {
                    let element = VariableEntity::element_id(container);
                    if edge.from_var_id == element {
                        self.add(
                            UnifiedEdge::new(container, &element, EdgeType::Dfg)
                                .with_attr("kind", Value::String("collection_element".into())),
                        );
                    }
                }
            }
        }
    }

    // 7. return-to-caller: taint emerging inside a callee reaches the
    // caller's binding site
    fn add_return_to_caller_edges(&mut self, doc: &IRDocument) {
        let mut func_to_exprs: FxHashMap<&str, Vec<&str>> = FxHashMap::default();
        for expr in &doc.expressions {
            if let Some(fqn) = &expr.function_fqn {
                func_to_exprs.entry(fqn.as_str()).or_default().push(&expr.id);
            }
        }
        let mut simple_to_fqns: FxHashMap<&str, Vec<&str>> = FxHashMap::default();
        for fqn in func_to_exprs.keys() {
            let simple = fqn.rsplit('.').next().unwrap_or(fqn);
            simple_to_fqns.entry(simple).or_default().push(fqn);
        }

        let mut bridges = Vec::new();
        for expr in &doc.expressions {
            if !expr.kind.is_call() || expr.defines_var.is_none() {
                continue;
            }
            let Some(callee) = expr.kind.callee_name() else {
                continue;
            };
            let simple = callee.rsplit('.').next().unwrap_or(callee);
            let Some(fqns) = simple_to_fqns.get(simple) else {
                continue;
            };
            for callee_fqn in fqns {
                // a function's own calls must not loop back into itself
                if expr.function_fqn.as_deref() == Some(*callee_fqn) {
                    continue;
                }
                let Some(callee_exprs) = func_to_exprs.get(*callee_fqn) else {
                    continue;
                };
                for callee_expr in callee_exprs {
                    bridges.push(
                        UnifiedEdge::new(*callee_expr, &expr.id, EdgeType::Dfg)
                            .with_attr("kind", Value::String("return_to_caller".into()))
                            .with_attr("interproc", Value::Bool(true))
                            .with_attr(
                                "callee_fqn",
                                Value::String((*callee_fqn).to_string()),
                            ),
                    );
                }
            }
        }
        for bridge in bridges {
            self.add(bridge);
        }
    }

    // 8. callee targets point at the call expressions the DSL matches -
    // only for callee names that actually receive DFG argument bindings,
    // so synthesis never manufactures a second route for plain calls
    fn add_callee_to_expr_edges(&mut self, doc: &IRDocument) {
        let Some(dfg) = &doc.dfg else { return };
        let mut bound_callees: FxHashSet<&str> = FxHashSet::default();
        for edge in &dfg.edges {
            if let Some(rest) = edge.to_variable_id.strip_prefix("callee:") {
                if let Some(idx) = rest.rfind(":param:") {
                    bound_callees.insert(&rest[..idx]);
                }
            }
        }
        if bound_callees.is_empty() {
            return;
        }

        let mut bridges = Vec::new();
        for expr in &doc.expressions {
            if let ExprKind::Call { callee, args, .. } = &expr.kind {
                if !bound_callees.contains(callee.as_str()) {
                    continue;
                }
                let num_args = args.len().max(1);
                for position in 0..num_args {
                    bridges.push(
                        UnifiedEdge::new(
                            callee_param_id(callee, position),
                            &expr.id,
                            EdgeType::Dfg,
                        )
                        .with_attr("kind", Value::String("callee_to_expr".into())),
                    );
                }
            }
        }
        for bridge in bridges {
            self.add(bridge);
        }
    }

    // 9. same-line `<call>` temporaries for nested calls without a binding
    fn add_expr_to_var_edges(&mut self, doc: &IRDocument) {
        let Some(dfg) = &doc.dfg else { return };
        let mut call_temps_by_line: FxHashMap<u32, Vec<&str>> = FxHashMap::default();
        for var in &dfg.variables {
            if var.is_call_temp() {
                if let Some(span) = var.decl_span {
                    call_temps_by_line
                        .entry(span.start_line)
                        .or_default()
                        .push(&var.id);
                }
            }
        }

        let mut bridges = Vec::new();
        for expr in &doc.expressions {
            // only nested calls own a <call> temporary; the enclosing
            // statement call is not the producer of that value
            if !expr.kind.is_call() || expr.defines_var.is_some() || expr.parent_expr_id.is_none() {
                continue;
            }
            if let Some(temps) = call_temps_by_line.get(&expr.span.start_line) {
                for temp in temps {
                    bridges.push(
                        UnifiedEdge::new(&expr.id, *temp, EdgeType::Dfg)
                            .with_attr("kind", Value::String("expr_to_call_var".into())),
                    );
                }
            }
        }
        for bridge in bridges {
            self.add(bridge);
        }
    }

    // 10. lambda parameter bindings
    fn add_lambda_param_edges(&mut self, doc: &IRDocument) {
        let Some(dfg) = &doc.dfg else { return };
        let mut bridges = Vec::new();
        for expr in &doc.expressions {
            let ExprKind::Lambda { params } = &expr.kind else {
                continue;
            };
            let Some(lambda_name) = &expr.defines_var else {
                continue;
            };
            let Some(lambda_fqn) = expr.attrs.get("lambda_fqn").and_then(Value::as_str) else {
                continue;
            };
            for (position, param) in params.iter().enumerate() {
                let param_var = dfg
                    .variables
                    .iter()
                    .find(|v| v.name == *param && v.scope_id.as_deref() == Some(lambda_fqn));
                if let Some(var) = param_var {
                    bridges.push(
                        UnifiedEdge::new(
                            callee_param_id(lambda_name, position),
                            &var.id,
                            EdgeType::Dfg,
                        )
                        .with_attr("kind", Value::String("lambda_param_bind".into()))
                        .with_attr("param_name", Value::String(param.clone())),
                    );
                }
            }
        }
        for bridge in bridges {
            self.add(bridge);
        }
    }

    // ============================================================
    // Lookups
    // ============================================================

    pub fn get_outgoing(&self, node_id: &str, edge_type: Option<EdgeType>) -> Vec<UnifiedEdge> {
        match edge_type {
            None | Some(EdgeType::All) => self
                .edges_from
                .get(node_id)
                .cloned()
                .unwrap_or_default(),
            Some(EdgeType::Dfg) => self.dfg_from.get(node_id).cloned().unwrap_or_default(),
            Some(EdgeType::Cfg) => self.cfg_from.get(node_id).cloned().unwrap_or_default(),
            Some(EdgeType::Call) => self.call_from.get(node_id).cloned().unwrap_or_default(),
            Some(other) => self
                .edges_from
                .get(node_id)
                .map(|edges| {
                    edges
                        .iter()
                        .filter(|e| e.edge_type == other)
                        .cloned()
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    pub fn get_incoming(&self, node_id: &str, edge_type: Option<EdgeType>) -> Vec<UnifiedEdge> {
        let edges = self.edges_to.get(node_id).cloned().unwrap_or_default();
        match edge_type {
            None | Some(EdgeType::All) => edges,
            Some(filter) => edges
                .into_iter()
                .filter(|e| e.edge_type == filter)
                .collect(),
        }
    }

    pub fn total_edges(&self) -> usize {
        self.total
    }
}
