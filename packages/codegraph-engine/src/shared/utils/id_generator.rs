//! Stable identifier formats
//!
//! Canonical ids are readable (`{kind}:{fqn}`, `file:{path}`,
//! `module:{dotted}`); anonymous constructs use content hashes so unrelated
//! line shifts do not churn ids. Edge occurrence counters live in a
//! process-wide generator guarded by a lock; `clear()` resets it between
//! snapshot builds and in tests.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use sha2::{Digest, Sha256};

use crate::shared::models::{EdgeKind, NodeKind};

static GLOBAL_GENERATOR: Lazy<IdGenerator> = Lazy::new(IdGenerator::new);

/// Process-wide occurrence counter for multi-edges.
#[derive(Debug, Default)]
pub struct IdGenerator {
    edge_occurrences: Mutex<FxHashMap<(EdgeKind, String, String), u32>>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global() -> &'static IdGenerator {
        &GLOBAL_GENERATOR
    }

    /// Next occurrence index for a (kind, source, target) triple, starting
    /// at 1. Keys are independent, so parallel builds of different files
    /// stay deterministic.
    pub fn next_edge_occurrence(&self, kind: EdgeKind, source_id: &str, target_id: &str) -> u32 {
        let mut counters = self.edge_occurrences.lock();
        let counter = counters
            .entry((kind, source_id.to_string(), target_id.to_string()))
            .or_insert(0);
        *counter += 1;
        *counter
    }

    /// Reset all counters. Call between snapshot builds and in tests.
    pub fn clear(&self) {
        self.edge_occurrences.lock().clear();
    }
}

/// Canonical node id: `{kind}:{fqn}`.
pub fn node_id(kind: NodeKind, fqn: &str) -> String {
    format!("{}:{}", kind.as_str(), fqn)
}

/// File node id: `file:{path}`.
pub fn file_id(file_path: &str) -> String {
    format!("file:{}", file_path)
}

/// Module node id: `module:{dotted}`.
pub fn module_id(module_path: &str) -> String {
    format!("module:{}", module_path)
}

/// External function stub id: `function:external.{name}` (cached per repo
/// by the builder so distinct repos never share stubs).
pub fn external_function_id(name: &str) -> String {
    format!("function:external.{}", name)
}

/// Lambda id derived from a content hash of (kind, parameter signature,
/// captured names, enclosing method FQN), truncated to 8 hex chars.
pub fn lambda_id(enclosing_fqn: &str, param_sig: &str, captures: &[String]) -> String {
    let mut sorted = captures.to_vec();
    sorted.sort();
    let content = format!("lambda|{}|{}|{}", enclosing_fqn, param_sig, sorted.join(","));
    format!("lambda:{}.lambda${}", enclosing_fqn, short_hash(&content))
}

/// CFG block id within a function.
pub fn block_id(function_fqn: &str, index: usize) -> String {
    format!("cfg:{}:block:{}", function_fqn, index)
}

/// Full SHA-256 hex digest.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// First 8 hex chars of the SHA-256 digest.
pub fn short_hash(content: &str) -> String {
    content_hash(content)[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_formats() {
        assert_eq!(node_id(NodeKind::Function, "m.f"), "function:m.f");
        assert_eq!(file_id("src/a.py"), "file:src/a.py");
        assert_eq!(module_id("a.b"), "module:a.b");
        assert_eq!(external_function_id("eval"), "function:external.eval");
    }

    #[test]
    fn test_lambda_id_is_content_based() {
        let a = lambda_id("m.f", "x", &["y".into()]);
        let b = lambda_id("m.f", "x", &["y".into()]);
        let c = lambda_id("m.f", "x,z", &["y".into()]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_edge_occurrence_counter() {
        let gen = IdGenerator::new();
        assert_eq!(gen.next_edge_occurrence(EdgeKind::Calls, "a", "b"), 1);
        assert_eq!(gen.next_edge_occurrence(EdgeKind::Calls, "a", "b"), 2);
        assert_eq!(gen.next_edge_occurrence(EdgeKind::Calls, "a", "c"), 1);
        gen.clear();
        assert_eq!(gen.next_edge_occurrence(EdgeKind::Calls, "a", "b"), 1);
    }

    #[test]
    fn test_hash_stability() {
        assert_eq!(content_hash("abc"), content_hash("abc"));
        assert_eq!(short_hash("abc").len(), 8);
    }
}
