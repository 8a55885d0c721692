//! IR serialization
//!
//! JSON with stable top-level fields; enums serialise as their string
//! values. Round-trip is bit-for-bit: `ir == from_json(to_json(ir))`,
//! asserted by `validate_roundtrip`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::errors::{EngineError, Result};
use crate::features::ir_generation::domain::IRDocument;
use crate::shared::models::{
    CFGBlock, CFGEdge, DfgSnapshot, Diagnostic, Edge, Expression, InterproceduralEdge, Node,
    Occurrence, PackageMetadata,
};

/// Wire shape of an IR document. Field order matches the stable interface.
#[derive(Serialize, Deserialize)]
struct IRDocumentWire {
    repo_id: String,
    snapshot_id: String,
    schema_version: String,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    cfg_blocks: Vec<CFGBlock>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    cfg_edges: Vec<CFGEdge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dfg: Option<DfgSnapshot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    expressions: Vec<Expression>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    interprocedural_edges: Vec<InterproceduralEdge>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    occurrences: Vec<Occurrence>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    diagnostics: Vec<Diagnostic>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    packages: Vec<PackageMetadata>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    meta: HashMap<String, Value>,
}

impl From<&IRDocument> for IRDocumentWire {
    fn from(doc: &IRDocument) -> Self {
        Self {
            repo_id: doc.repo_id.clone(),
            snapshot_id: doc.snapshot_id.clone(),
            schema_version: doc.schema_version.clone(),
            nodes: doc.nodes.clone(),
            edges: doc.edges.clone(),
            cfg_blocks: doc.cfg_blocks.clone(),
            cfg_edges: doc.cfg_edges.clone(),
            dfg: doc.dfg.clone(),
            expressions: doc.expressions.clone(),
            interprocedural_edges: doc.interprocedural_edges.clone(),
            occurrences: doc.occurrences.clone(),
            diagnostics: doc.diagnostics.clone(),
            packages: doc.packages.clone(),
            meta: doc.meta.clone(),
        }
    }
}

impl From<IRDocumentWire> for IRDocument {
    fn from(wire: IRDocumentWire) -> Self {
        let mut doc = IRDocument::new(wire.repo_id, wire.snapshot_id);
        doc.schema_version = wire.schema_version;
        doc.nodes = wire.nodes;
        doc.edges = wire.edges;
        doc.cfg_blocks = wire.cfg_blocks;
        doc.cfg_edges = wire.cfg_edges;
        doc.dfg = wire.dfg;
        doc.expressions = wire.expressions;
        doc.interprocedural_edges = wire.interprocedural_edges;
        doc.occurrences = wire.occurrences;
        doc.diagnostics = wire.diagnostics;
        doc.packages = wire.packages;
        doc.meta = wire.meta;
        doc
    }
}

pub struct IrSerializer;

impl IrSerializer {
    pub fn to_json(doc: &IRDocument) -> Result<String> {
        Ok(serde_json::to_string(&IRDocumentWire::from(doc))?)
    }

    pub fn to_json_pretty(doc: &IRDocument) -> Result<String> {
        Ok(serde_json::to_string_pretty(&IRDocumentWire::from(doc))?)
    }

    pub fn from_json(json: &str) -> Result<IRDocument> {
        let wire: IRDocumentWire = serde_json::from_str(json)?;
        Ok(wire.into())
    }

    /// Assert the round-trip guarantee for a document.
    pub fn validate_roundtrip(doc: &IRDocument) -> Result<()> {
        let json = Self::to_json(doc)?;
        let restored = Self::from_json(&json)?;
        if &restored != doc {
            return Err(EngineError::Internal(format!(
                "IR round-trip mismatch for snapshot {}",
                doc.snapshot_id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{EdgeKind, NodeKind, Span};

    #[test]
    fn test_roundtrip_minimal() {
        let mut doc = IRDocument::new("repo", "snap");
        doc.nodes.push(
            Node::new("function:m.f", NodeKind::Function, "m.f", "m.py", Span::line(1))
                .with_name("f")
                .with_language("python"),
        );
        doc.edges
            .push(Edge::new(EdgeKind::Contains, "file:m.py", "function:m.f", 1));
        doc.meta
            .insert("built_by".to_string(), Value::String("test".to_string()));

        IrSerializer::validate_roundtrip(&doc).unwrap();
    }

    #[test]
    fn test_schema_version_preserved() {
        let doc = IRDocument::new("repo", "snap");
        let json = IrSerializer::to_json(&doc).unwrap();
        assert!(json.contains("\"schema_version\":\"2.1\""));
    }
}
