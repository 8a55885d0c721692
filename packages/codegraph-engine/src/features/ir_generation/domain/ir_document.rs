//! IR Document: the layered intermediate representation
//!
//! One per (repo, snapshot); replaced atomically on rebuild. All cross
//! references are closed within the document or marked external. Lazy
//! lookup indexes are rebuilt on demand and excluded from equality and
//! serialization.

use std::collections::HashMap;

use once_cell::sync::OnceCell;
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::shared::models::{
    CFGBlock, CFGEdge, DfgSnapshot, Diagnostic, Edge, Expression, InterproceduralEdge, Node,
    NodeKind, Occurrence, OccurrenceIndex, PackageMetadata, SymbolRole,
};

pub const SCHEMA_VERSION: &str = "2.1";

#[derive(Debug, Default)]
struct LazyIndexes {
    node_by_id: OnceCell<FxHashMap<String, usize>>,
    edges_from: OnceCell<FxHashMap<String, Vec<usize>>>,
    nodes_by_file: OnceCell<FxHashMap<String, Vec<usize>>>,
    occurrences: OnceCell<OccurrenceIndex>,
}

#[derive(Debug, Default)]
pub struct IRDocument {
    pub repo_id: String,
    pub snapshot_id: String,
    pub schema_version: String,

    // Structural IR
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,

    // Semantic layers
    pub cfg_blocks: Vec<CFGBlock>,
    pub cfg_edges: Vec<CFGEdge>,
    pub dfg: Option<DfgSnapshot>,
    pub expressions: Vec<Expression>,
    pub interprocedural_edges: Vec<InterproceduralEdge>,

    // Occurrence IR
    pub occurrences: Vec<Occurrence>,

    pub diagnostics: Vec<Diagnostic>,
    pub packages: Vec<PackageMetadata>,
    pub meta: HashMap<String, Value>,

    indexes: LazyIndexes,
}

impl PartialEq for IRDocument {
    fn eq(&self, other: &Self) -> bool {
        self.repo_id == other.repo_id
            && self.snapshot_id == other.snapshot_id
            && self.schema_version == other.schema_version
            && self.nodes == other.nodes
            && self.edges == other.edges
            && self.cfg_blocks == other.cfg_blocks
            && self.cfg_edges == other.cfg_edges
            && self.dfg == other.dfg
            && self.expressions == other.expressions
            && self.interprocedural_edges == other.interprocedural_edges
            && self.occurrences == other.occurrences
            && self.diagnostics == other.diagnostics
            && self.packages == other.packages
            && self.meta == other.meta
    }
}

impl Clone for IRDocument {
    fn clone(&self) -> Self {
        Self {
            repo_id: self.repo_id.clone(),
            snapshot_id: self.snapshot_id.clone(),
            schema_version: self.schema_version.clone(),
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            cfg_blocks: self.cfg_blocks.clone(),
            cfg_edges: self.cfg_edges.clone(),
            dfg: self.dfg.clone(),
            expressions: self.expressions.clone(),
            interprocedural_edges: self.interprocedural_edges.clone(),
            occurrences: self.occurrences.clone(),
            diagnostics: self.diagnostics.clone(),
            packages: self.packages.clone(),
            meta: self.meta.clone(),
            indexes: LazyIndexes::default(),
        }
    }
}

impl IRDocument {
    pub fn new(repo_id: impl Into<String>, snapshot_id: impl Into<String>) -> Self {
        Self {
            repo_id: repo_id.into(),
            snapshot_id: snapshot_id.into(),
            schema_version: SCHEMA_VERSION.to_string(),
            ..Default::default()
        }
    }

    // ============================================================
    // Lazy indexes
    // ============================================================

    fn node_index(&self) -> &FxHashMap<String, usize> {
        self.indexes.node_by_id.get_or_init(|| {
            self.nodes
                .iter()
                .enumerate()
                .map(|(i, n)| (n.id.clone(), i))
                .collect()
        })
    }

    fn edge_index(&self) -> &FxHashMap<String, Vec<usize>> {
        self.indexes.edges_from.get_or_init(|| {
            let mut map: FxHashMap<String, Vec<usize>> = FxHashMap::default();
            for (i, edge) in self.edges.iter().enumerate() {
                map.entry(edge.source_id.clone()).or_default().push(i);
            }
            map
        })
    }

    fn file_index(&self) -> &FxHashMap<String, Vec<usize>> {
        self.indexes.nodes_by_file.get_or_init(|| {
            let mut map: FxHashMap<String, Vec<usize>> = FxHashMap::default();
            for (i, node) in self.nodes.iter().enumerate() {
                map.entry(node.file_path.clone()).or_default().push(i);
            }
            map
        })
    }

    fn occurrence_index(&self) -> &OccurrenceIndex {
        self.indexes
            .occurrences
            .get_or_init(|| OccurrenceIndex::build(&self.occurrences))
    }

    /// Drop lazy indexes. Call after mutating the document in a
    /// construction window.
    pub fn invalidate_indexes(&mut self) {
        self.indexes = LazyIndexes::default();
    }

    // ============================================================
    // Structural queries
    // ============================================================

    pub fn get_node(&self, node_id: &str) -> Option<&Node> {
        self.node_index().get(node_id).map(|&i| &self.nodes[i])
    }

    pub fn get_edges_from(&self, source_id: &str) -> Vec<&Edge> {
        self.edge_index()
            .get(source_id)
            .map(|ids| ids.iter().map(|&i| &self.edges[i]).collect())
            .unwrap_or_default()
    }

    pub fn get_file_nodes(&self, file_path: &str) -> Vec<&Node> {
        self.file_index()
            .get(file_path)
            .map(|ids| ids.iter().map(|&i| &self.nodes[i]).collect())
            .unwrap_or_default()
    }

    pub fn find_nodes_by_name(&self, name: &str) -> Vec<&Node> {
        self.nodes
            .iter()
            .filter(|n| n.name.as_deref() == Some(name))
            .collect()
    }

    pub fn find_nodes_by_kind(&self, kind: NodeKind) -> Vec<&Node> {
        self.nodes.iter().filter(|n| n.kind == kind).collect()
    }

    // ============================================================
    // Occurrence queries
    // ============================================================

    pub fn find_references(&self, symbol_id: &str) -> Vec<&Occurrence> {
        self.occurrence_index().get_references(symbol_id)
    }

    pub fn find_definitions(&self, symbol_id: &str) -> Vec<&Occurrence> {
        self.occurrence_index().get_definitions(symbol_id)
    }

    pub fn get_definitions_in_file(&self, file_path: &str) -> Vec<&Occurrence> {
        self.occurrence_index().get_definitions_in_file(file_path)
    }

    pub fn get_by_role(&self, role: SymbolRole) -> Vec<&Occurrence> {
        self.occurrence_index().get_by_role(role)
    }

    pub fn get_high_importance_symbols(&self, min_score: f32) -> Vec<&Occurrence> {
        self.occurrence_index().get_by_importance(min_score)
    }

    // ============================================================
    // Merging (fragment → snapshot)
    // ============================================================

    /// Merge a per-file fragment into this snapshot document. External
    /// function stubs are deduplicated by id.
    pub fn merge_fragment(&mut self, fragment: IRDocument) {
        let existing: rustc_hash::FxHashSet<String> =
            self.nodes.iter().map(|n| n.id.clone()).collect();
        self.nodes.extend(
            fragment
                .nodes
                .into_iter()
                .filter(|n| !existing.contains(&n.id)),
        );

        self.edges.extend(fragment.edges);
        self.cfg_blocks.extend(fragment.cfg_blocks);
        self.cfg_edges.extend(fragment.cfg_edges);
        if let Some(frag_dfg) = fragment.dfg {
            let dfg = self.dfg.get_or_insert_with(DfgSnapshot::default);
            dfg.variables.extend(frag_dfg.variables);
            dfg.edges.extend(frag_dfg.edges);
        }
        self.expressions.extend(fragment.expressions);
        self.interprocedural_edges
            .extend(fragment.interprocedural_edges);
        self.occurrences.extend(fragment.occurrences);
        self.diagnostics.extend(fragment.diagnostics);
        self.packages.extend(fragment.packages);
        self.invalidate_indexes();
    }

    pub fn stats(&self) -> HashMap<String, usize> {
        let mut stats = HashMap::new();
        stats.insert("nodes".to_string(), self.nodes.len());
        stats.insert("edges".to_string(), self.edges.len());
        stats.insert("cfg_blocks".to_string(), self.cfg_blocks.len());
        stats.insert("expressions".to_string(), self.expressions.len());
        stats.insert(
            "dfg_variables".to_string(),
            self.dfg.as_ref().map(|d| d.variables.len()).unwrap_or(0),
        );
        stats.insert("occurrences".to_string(), self.occurrences.len());
        stats
    }
}
