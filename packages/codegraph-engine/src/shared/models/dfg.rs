//! Data-flow graph entities
//!
//! Variable ids encode their scope and declaration position
//! (`var:{file}:{scope}:{name}@{line}:{col}`) so shadowing and reassignment
//! produce distinct versions. `<call>` names represent nested-call results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariableKind {
    Local,
    Param,
    Global,
    Field,
    Temp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableEntity {
    pub id: String,
    pub name: String,
    pub function_fqn: String,
    pub file_path: String,
    pub kind: VariableKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decl_span: Option<Span>,
}

impl VariableEntity {
    /// Scope-encoded id; distinct declaration sites get distinct ids.
    pub fn make_id(file_path: &str, scope_fqn: &str, name: &str, line: u32, col: u32) -> String {
        format!("var:{}:{}:{}@{}:{}", file_path, scope_fqn, name, line, col)
    }

    /// Abstract element id for the contents of a collection variable.
    pub fn element_id(container_var_id: &str) -> String {
        format!("{}[*]", container_var_id)
    }

    pub fn is_call_temp(&self) -> bool {
        self.name == "<call>"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataflowEdgeKind {
    DefUse,
    Read,
    Write,
    CollectionLoad,
    CollectionStore,
    ParamBind,
    Return,
}

/// Edge between variable/expression ids. Endpoints may also be abstract
/// (`...[*]` elements, `callee:{name}:param:{n}` targets); the node index
/// synthesises nodes for those.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataflowEdge {
    pub from_variable_id: String,
    pub to_variable_id: String,
    pub kind: DataflowEdgeKind,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attrs: HashMap<String, Value>,
}

impl DataflowEdge {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        kind: DataflowEdgeKind,
    ) -> Self {
        Self {
            from_variable_id: from.into(),
            to_variable_id: to.into(),
            kind,
            attrs: HashMap::new(),
        }
    }
}

/// Callee argument target id used by ParamBind edges.
pub fn callee_param_id(callee_name: &str, position: usize) -> String {
    format!("callee:{}:param:{}", callee_name, position)
}

/// Per-snapshot data-flow layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DfgSnapshot {
    pub variables: Vec<VariableEntity>,
    pub edges: Vec<DataflowEdge>,
}

impl DfgSnapshot {
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty() && self.edges.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterproceduralEdgeKind {
    ReturnToCaller,
    ParamBind,
    CollectionLoad,
}

/// Cross-procedure data-flow bridge produced by the builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterproceduralEdge {
    pub id: String,
    pub kind: InterproceduralEdgeKind,
    pub from_var_id: String,
    pub to_var_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_site_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caller_func_fqn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callee_func_fqn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arg_position: Option<u32>,
    /// CollectionLoad: the container variable the element belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_var_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_key: Option<String>,
    pub confidence: f32,
}

impl InterproceduralEdge {
    pub fn new(
        id: impl Into<String>,
        kind: InterproceduralEdgeKind,
        from_var_id: impl Into<String>,
        to_var_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            from_var_id: from_var_id.into(),
            to_var_id: to_var_id.into(),
            call_site_id: None,
            caller_func_fqn: None,
            callee_func_fqn: None,
            arg_position: None,
            collection_var_id: None,
            element_key: None,
            confidence: 1.0,
        }
    }
}
