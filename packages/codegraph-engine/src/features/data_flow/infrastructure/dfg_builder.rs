//! Per-function DFG construction
//!
//! Assignments create fresh variable versions; the name → versions mapping
//! is resolved against expression reads at index time. Nested-call results
//! get `<call>` temporaries; collection stores/loads go through abstract
//! `[*]` element ids.

use rustc_hash::FxHashMap;

use crate::shared::models::{
    callee_param_id, DataflowEdge, DataflowEdgeKind, InterproceduralEdge, InterproceduralEdgeKind,
    Span, VariableEntity, VariableKind,
};

pub struct DfgBuilder {
    file_path: String,
    function_fqn: String,
    variables: Vec<VariableEntity>,
    edges: Vec<DataflowEdge>,
    interproc: Vec<InterproceduralEdge>,
    /// name → id of its latest version in this function
    latest: FxHashMap<String, String>,
    interproc_seq: u32,
}

impl DfgBuilder {
    pub fn new(file_path: impl Into<String>, function_fqn: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            function_fqn: function_fqn.into(),
            variables: Vec::new(),
            edges: Vec::new(),
            interproc: Vec::new(),
            latest: FxHashMap::default(),
            interproc_seq: 0,
        }
    }

    fn push_variable(
        &mut self,
        name: &str,
        scope_fqn: &str,
        span: Span,
        kind: VariableKind,
    ) -> String {
        let id = VariableEntity::make_id(&self.file_path, scope_fqn, name, span.start_line, span.start_col);
        self.variables.push(VariableEntity {
            id: id.clone(),
            name: name.to_string(),
            function_fqn: self.function_fqn.clone(),
            file_path: self.file_path.clone(),
            kind,
            type_id: None,
            scope_id: Some(scope_fqn.to_string()),
            decl_span: Some(span),
        });
        self.latest.insert(name.to_string(), id.clone());
        id
    }

    pub fn declare_param(&mut self, name: &str, span: Span) -> String {
        let scope = self.function_fqn.clone();
        self.push_variable(name, &scope, span, VariableKind::Param)
    }

    /// Parameter of a nested lambda; scoped to the lambda's FQN.
    pub fn declare_lambda_param(&mut self, lambda_fqn: &str, name: &str, span: Span) -> String {
        self.push_variable(name, &lambda_fqn.to_string(), span, VariableKind::Param)
    }

    /// New version of a local at an assignment site.
    pub fn define(&mut self, name: &str, span: Span) -> String {
        let scope = self.function_fqn.clone();
        self.push_variable(name, &scope, span, VariableKind::Local)
    }

    /// Temporary holding a nested-call result on a given line.
    pub fn call_temp(&mut self, span: Span) -> String {
        let scope = self.function_fqn.clone();
        self.push_variable("<call>", &scope, span, VariableKind::Temp)
    }

    pub fn latest(&self, name: &str) -> Option<&str> {
        self.latest.get(name).map(String::as_str)
    }

    pub fn def_use(&mut self, from_id: &str, to_id: &str) {
        if from_id == to_id {
            return;
        }
        self.edges
            .push(DataflowEdge::new(from_id, to_id, DataflowEdgeKind::DefUse));
    }

    /// Argument at `position` flows into the callee's parameter target.
    pub fn param_bind(&mut self, from_var_id: &str, callee_name: &str, position: usize) {
        self.edges.push(DataflowEdge::new(
            from_var_id,
            callee_param_id(callee_name, position),
            DataflowEdgeKind::ParamBind,
        ));
    }

    /// A value flows into the abstract element of a container.
    pub fn collection_store(&mut self, from_var_id: &str, container_var_id: &str) {
        self.edges.push(DataflowEdge::new(
            from_var_id,
            VariableEntity::element_id(container_var_id),
            DataflowEdgeKind::CollectionStore,
        ));
    }

    /// Iteration binds container elements to the loop target.
    pub fn collection_load(&mut self, container_var_id: &str, target_var_id: &str) {
        self.interproc_seq += 1;
        let element = VariableEntity::element_id(container_var_id);
        let mut edge = InterproceduralEdge::new(
            format!("interproc:{}:{}", self.function_fqn, self.interproc_seq),
            InterproceduralEdgeKind::CollectionLoad,
            element,
            target_var_id,
        );
        edge.collection_var_id = Some(container_var_id.to_string());
        edge.caller_func_fqn = Some(self.function_fqn.clone());
        self.interproc.push(edge);
    }

    pub fn finish(self) -> (Vec<VariableEntity>, Vec<DataflowEdge>, Vec<InterproceduralEdge>) {
        (self.variables, self.edges, self.interproc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_get_distinct_ids() {
        let mut dfg = DfgBuilder::new("t.py", "m.f");
        let v1 = dfg.define("x", Span::new(1, 0, 1, 5));
        let v2 = dfg.define("x", Span::new(2, 0, 2, 5));
        assert_ne!(v1, v2);
        assert_eq!(dfg.latest("x"), Some(v2.as_str()));
    }

    #[test]
    fn test_no_self_loop_def_use() {
        let mut dfg = DfgBuilder::new("t.py", "m.f");
        let v = dfg.define("x", Span::new(1, 0, 1, 5));
        dfg.def_use(&v, &v);
        let (_, edges, _) = dfg.finish();
        assert!(edges.is_empty());
    }

    #[test]
    fn test_collection_load_produces_element_bridge_data() {
        let mut dfg = DfgBuilder::new("t.py", "m.f");
        let xs = dfg.define("xs", Span::new(1, 0, 1, 2));
        let y = dfg.define("y", Span::new(3, 4, 3, 5));
        dfg.collection_load(&xs, &y);
        let (_, _, interproc) = dfg.finish();
        assert_eq!(interproc.len(), 1);
        assert!(interproc[0].from_var_id.ends_with("[*]"));
        assert_eq!(interproc[0].collection_var_id.as_deref(), Some(xs.as_str()));
    }

    #[test]
    fn test_param_bind_target_format() {
        let mut dfg = DfgBuilder::new("t.py", "m.f");
        let cmd = dfg.define("cmd", Span::new(1, 0, 1, 3));
        dfg.param_bind(&cmd, "execute", 0);
        let (_, edges, _) = dfg.finish();
        assert_eq!(edges[0].to_variable_id, "callee:execute:param:0");
    }
}
