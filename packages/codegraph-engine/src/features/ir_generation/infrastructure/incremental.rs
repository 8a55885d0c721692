//! Incremental IR building
//!
//! Anonymous constructs (lambdas, method references) would churn ids on
//! unrelated edits if ids were line-based, so their identity is a content
//! hash. Between snapshots, removed and added anonymous nodes are fuzzy
//! matched (kind + file + enclosing method + content hash); scores at or
//! above [`MIGRATION_THRESHOLD`] migrate the old id so consumers see
//! "modified" instead of "removed + added".

use std::collections::HashMap;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::errors::Result;
use crate::features::ir_generation::domain::IRDocument;
use crate::features::parsing::ports::SourceFile;
use crate::shared::models::{Edge, Node, NodeKind};

use super::generator::IrGenerator;

pub const MIGRATION_THRESHOLD: f64 = 0.7;

/// Delta between two IR snapshots.
#[derive(Debug, Default)]
pub struct IRDelta {
    pub added_nodes: Vec<Node>,
    pub removed_nodes: Vec<Node>,
    pub modified_nodes: Vec<(Node, Node)>,
    pub added_edges: Vec<Edge>,
    pub removed_edges: Vec<Edge>,
    /// old id → new id for migrated anonymous nodes
    pub id_migrations: HashMap<String, String>,
}

impl IRDelta {
    pub fn stats(&self) -> HashMap<&'static str, usize> {
        let mut stats = HashMap::new();
        stats.insert("added_nodes", self.added_nodes.len());
        stats.insert("removed_nodes", self.removed_nodes.len());
        stats.insert("modified_nodes", self.modified_nodes.len());
        stats.insert("added_edges", self.added_edges.len());
        stats.insert("removed_edges", self.removed_edges.len());
        stats.insert("id_migrations", self.id_migrations.len());
        stats
    }
}

pub struct IncrementalIrBuilder {
    generator: IrGenerator,
}

impl IncrementalIrBuilder {
    pub fn new(generator: IrGenerator) -> Self {
        Self { generator }
    }

    /// Regenerate one file and compute the delta against the previous
    /// snapshot, migrating anonymous ids where the fuzzy match holds.
    pub fn generate_incremental(
        &self,
        file: &SourceFile,
        old_doc: &IRDocument,
        snapshot_id: &str,
    ) -> Result<(IRDocument, IRDelta)> {
        let mut new_doc = self.generator.generate(file, snapshot_id)?;
        let delta = self.diff_and_migrate(old_doc, &mut new_doc, &file.path);
        Ok((new_doc, delta))
    }

    fn diff_and_migrate(
        &self,
        old_doc: &IRDocument,
        new_doc: &mut IRDocument,
        file_path: &str,
    ) -> IRDelta {
        let old_nodes: FxHashMap<&str, &Node> = old_doc
            .nodes
            .iter()
            .filter(|n| n.file_path == file_path)
            .map(|n| (n.id.as_str(), n))
            .collect();
        let new_ids: FxHashMap<&str, usize> = new_doc
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.as_str(), i))
            .collect();

        let mut delta = IRDelta::default();

        let mut removed_anon: Vec<&Node> = Vec::new();
        for (id, node) in &old_nodes {
            if !new_ids.contains_key(id) {
                if node.kind == NodeKind::Lambda {
                    removed_anon.push(node);
                } else {
                    delta.removed_nodes.push((*node).clone());
                }
            }
        }

        let mut added_anon: Vec<usize> = Vec::new();
        for (i, node) in new_doc.nodes.iter().enumerate() {
            if node.file_path != file_path {
                continue;
            }
            if !old_nodes.contains_key(node.id.as_str()) {
                if node.kind == NodeKind::Lambda {
                    added_anon.push(i);
                } else {
                    delta.added_nodes.push(node.clone());
                }
            }
        }

        // fuzzy-match removed vs added anonymous nodes
        let mut claimed: Vec<usize> = Vec::new();
        for old_node in removed_anon {
            let mut best: Option<(usize, f64)> = None;
            for &idx in &added_anon {
                if claimed.contains(&idx) {
                    continue;
                }
                let score = fuzzy_match_score(old_node, &new_doc.nodes[idx]);
                if score >= MIGRATION_THRESHOLD
                    && best.map(|(_, s)| score > s).unwrap_or(true)
                {
                    best = Some((idx, score));
                }
            }

            match best {
                Some((idx, score)) => {
                    claimed.push(idx);
                    let new_id = new_doc.nodes[idx].id.clone();
                    let old_id = old_node.id.clone();
                    debug!(old = old_id, new = new_id, score, "anonymous_id_migrated");

                    // keep the old id in the new snapshot
                    new_doc.nodes[idx].id = old_id.clone();
                    for edge in &mut new_doc.edges {
                        if edge.source_id == new_id {
                            edge.source_id = old_id.clone();
                        }
                        if edge.target_id == new_id {
                            edge.target_id = old_id.clone();
                        }
                    }
                    delta
                        .modified_nodes
                        .push((old_node.clone(), new_doc.nodes[idx].clone()));
                    delta.id_migrations.insert(old_id, new_id);
                }
                None => delta.removed_nodes.push(old_node.clone()),
            }
        }
        for &idx in &added_anon {
            if !claimed.contains(&idx) {
                delta.added_nodes.push(new_doc.nodes[idx].clone());
            }
        }
        new_doc.invalidate_indexes();

        // edge delta by id
        let old_edge_ids: FxHashMap<&str, &Edge> =
            old_doc.edges.iter().map(|e| (e.id.as_str(), e)).collect();
        let new_edge_ids: FxHashMap<&str, &Edge> =
            new_doc.edges.iter().map(|e| (e.id.as_str(), e)).collect();
        for (id, edge) in &new_edge_ids {
            if !old_edge_ids.contains_key(id) {
                delta.added_edges.push((*edge).clone());
            }
        }
        for (id, edge) in &old_edge_ids {
            if !new_edge_ids.contains_key(id) {
                delta.removed_edges.push((*edge).clone());
            }
        }

        delta
    }
}

/// Fuzzy match score between an old and a new anonymous node:
/// kind 0.3, file 0.2, enclosing method 0.2, content hash 0.3.
pub fn fuzzy_match_score(old_node: &Node, new_node: &Node) -> f64 {
    let mut score = 0.0;
    if old_node.kind == new_node.kind {
        score += 0.3;
    }
    if old_node.file_path == new_node.file_path {
        score += 0.2;
    }
    if enclosing_method(&old_node.fqn) == enclosing_method(&new_node.fqn) {
        score += 0.2;
    }
    if old_node.content_hash.is_some() && old_node.content_hash == new_node.content_hash {
        score += 0.3;
    }
    score
}

fn enclosing_method(fqn: &str) -> &str {
    match fqn.rfind(".lambda$") {
        Some(idx) => &fqn[..idx],
        None => fqn,
    }
}
