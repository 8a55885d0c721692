//! Sparse conditional constant propagation baseline
//!
//! Runs once per IR snapshot before the first flow query: assignments of
//! literals feed a constant lattice, constant branch conditions mark the
//! untaken side infeasible, and blocks unreachable from their function's
//! Entry under feasible edges are collected for the traversal to skip.
//!
//! Missing CFG or DFG is an expected precondition (log and skip);
//! unexpected failures are logged and propagated.

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info};

use crate::errors::Result;
use crate::features::ir_generation::domain::IRDocument;
use crate::shared::models::{CFGBlockKind, CFGEdgeKind, ExprKind, LiteralKind};

/// Constant lattice value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Bool(bool),
    Int(i64),
    Str(String),
    /// Conflicting definitions.
    Bottom,
}

impl ConstValue {
    fn truthiness(&self) -> Option<bool> {
        match self {
            ConstValue::Bool(b) => Some(*b),
            ConstValue::Int(i) => Some(*i != 0),
            ConstValue::Str(s) => Some(!s.is_empty()),
            ConstValue::Bottom => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct SccpResult {
    pub unreachable_blocks: FxHashSet<String>,
    pub reachable_blocks: FxHashSet<String>,
    /// (function fqn, variable name) → constant
    pub constants: FxHashMap<(String, String), ConstValue>,
    pub constants_found: usize,
}

impl SccpResult {
    pub fn is_unreachable(&self, block_id: &str) -> bool {
        self.unreachable_blocks.contains(block_id)
    }
}

#[derive(Default)]
pub struct ConstantPropagationAnalyzer {
    cache: Mutex<FxHashMap<String, Arc<SccpResult>>>,
}

impl ConstantPropagationAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyze a document; cached per snapshot id. Returns `None` when the
    /// preconditions (CFG and DFG present) are not met.
    pub fn analyze(&self, doc: &IRDocument) -> Result<Option<Arc<SccpResult>>> {
        if doc.cfg_blocks.is_empty() {
            info!(snapshot = doc.snapshot_id, reason = "no_cfg_blocks", "sccp_baseline_skipped");
            return Ok(None);
        }
        if doc.dfg.is_none() {
            info!(snapshot = doc.snapshot_id, reason = "no_dfg_snapshot", "sccp_baseline_skipped");
            return Ok(None);
        }

        if let Some(cached) = self.cache.lock().get(&doc.snapshot_id) {
            return Ok(Some(Arc::clone(cached)));
        }

        let result = Arc::new(run_sccp(doc));
        info!(
            snapshot = doc.snapshot_id,
            constants_found = result.constants_found,
            unreachable_blocks = result.unreachable_blocks.len(),
            reachable_blocks = result.reachable_blocks.len(),
            "sccp_baseline_complete"
        );
        self.cache
            .lock()
            .insert(doc.snapshot_id.clone(), Arc::clone(&result));
        Ok(Some(result))
    }

    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }
}

fn run_sccp(doc: &IRDocument) -> SccpResult {
    let mut result = SccpResult::default();

    // 1. constants from literal assignments
    for expr in &doc.expressions {
        let Some(defined) = &expr.defines_var else {
            continue;
        };
        let Some(fqn) = &expr.function_fqn else {
            continue;
        };
        let key = (fqn.clone(), defined.clone());
        let value = match &expr.kind {
            ExprKind::Literal { literal, value } => literal_const(*literal, value),
            _ => Some(ConstValue::Bottom),
        };
        match value {
            Some(new) => {
                let conflicting = result
                    .constants
                    .get(&key)
                    .is_some_and(|existing| *existing != new);
                if conflicting {
                    result.constants.insert(key, ConstValue::Bottom);
                } else {
                    result.constants.insert(key, new);
                }
            }
            None => {
                result.constants.insert(key, ConstValue::Bottom);
            }
        }
    }
    result.constants_found = result
        .constants
        .values()
        .filter(|v| !matches!(v, ConstValue::Bottom))
        .count();

    // 2. infeasible branch edges from constant conditions
    let mut infeasible: FxHashSet<(String, String)> = FxHashSet::default();
    for block in &doc.cfg_blocks {
        if block.kind != CFGBlockKind::Condition {
            continue;
        }
        let constant = block.condition_literal.or_else(|| {
            block.condition_var.as_ref().and_then(|name| {
                result
                    .constants
                    .get(&(block.function_fqn.clone(), name.clone()))
                    .and_then(ConstValue::truthiness)
            })
        });
        let Some(truth) = constant else { continue };

        let untaken = if truth {
            CFGEdgeKind::FalseBranch
        } else {
            CFGEdgeKind::TrueBranch
        };
        for edge in &doc.cfg_edges {
            if edge.source_block_id == block.id && edge.kind == untaken {
                infeasible.insert((edge.source_block_id.clone(), edge.target_block_id.clone()));
            }
        }
    }

    // 3. feasible-edge reachability from every Entry block
    let mut successors: FxHashMap<&str, Vec<&str>> = FxHashMap::default();
    for edge in &doc.cfg_edges {
        if infeasible.contains(&(edge.source_block_id.clone(), edge.target_block_id.clone())) {
            continue;
        }
        successors
            .entry(edge.source_block_id.as_str())
            .or_default()
            .push(edge.target_block_id.as_str());
    }

    let mut reachable: FxHashSet<String> = FxHashSet::default();
    for block in &doc.cfg_blocks {
        if block.kind != CFGBlockKind::Entry {
            continue;
        }
        let mut stack = vec![block.id.as_str()];
        while let Some(current) = stack.pop() {
            if !reachable.insert(current.to_string()) {
                continue;
            }
            if let Some(next) = successors.get(current) {
                stack.extend(next.iter().copied());
            }
        }
    }

    for block in &doc.cfg_blocks {
        if !reachable.contains(&block.id) {
            result.unreachable_blocks.insert(block.id.clone());
        }
    }
    result.reachable_blocks = reachable;

    debug!(
        infeasible_edges = infeasible.len(),
        unreachable = result.unreachable_blocks.len(),
        "sccp_pass_finished"
    );
    result
}

fn literal_const(kind: LiteralKind, value: &str) -> Option<ConstValue> {
    match kind {
        LiteralKind::Boolean => Some(ConstValue::Bool(value.eq_ignore_ascii_case("true"))),
        LiteralKind::Integer => value.parse::<i64>().ok().map(ConstValue::Int),
        LiteralKind::String => Some(ConstValue::Str(value.to_string())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{CFGBlock, CFGEdge, DfgSnapshot};

    fn doc_with_false_branch() -> IRDocument {
        let mut doc = IRDocument::new("repo", "snap");
        doc.dfg = Some(DfgSnapshot::default());

        let entry = CFGBlock::new("cfg:m.f:block:0", CFGBlockKind::Entry, "m.f", "function:m.f");
        let mut cond = CFGBlock::new("cfg:m.f:block:1", CFGBlockKind::Condition, "m.f", "function:m.f");
        cond.condition_literal = Some(false);
        let then_block = CFGBlock::new("cfg:m.f:block:2", CFGBlockKind::Block, "m.f", "function:m.f");
        let join = CFGBlock::new("cfg:m.f:block:3", CFGBlockKind::Block, "m.f", "function:m.f");
        let exit = CFGBlock::new("cfg:m.f:block:4", CFGBlockKind::Exit, "m.f", "function:m.f");
        doc.cfg_blocks = vec![entry, cond, then_block, join, exit];

        doc.cfg_edges = vec![
            CFGEdge {
                source_block_id: "cfg:m.f:block:0".into(),
                target_block_id: "cfg:m.f:block:1".into(),
                kind: CFGEdgeKind::Sequential,
            },
            CFGEdge {
                source_block_id: "cfg:m.f:block:1".into(),
                target_block_id: "cfg:m.f:block:2".into(),
                kind: CFGEdgeKind::TrueBranch,
            },
            CFGEdge {
                source_block_id: "cfg:m.f:block:1".into(),
                target_block_id: "cfg:m.f:block:3".into(),
                kind: CFGEdgeKind::FalseBranch,
            },
            CFGEdge {
                source_block_id: "cfg:m.f:block:3".into(),
                target_block_id: "cfg:m.f:block:4".into(),
                kind: CFGEdgeKind::Sequential,
            },
        ];
        doc
    }

    #[test]
    fn test_false_condition_marks_then_branch_unreachable() {
        let doc = doc_with_false_branch();
        let analyzer = ConstantPropagationAnalyzer::new();
        let result = analyzer.analyze(&doc).unwrap().unwrap();

        assert!(result.is_unreachable("cfg:m.f:block:2"));
        assert!(!result.is_unreachable("cfg:m.f:block:3"));
        assert!(!result.is_unreachable("cfg:m.f:block:4"));
    }

    #[test]
    fn test_skips_without_cfg() {
        let mut doc = IRDocument::new("repo", "snap");
        doc.dfg = Some(DfgSnapshot::default());
        let analyzer = ConstantPropagationAnalyzer::new();
        assert!(analyzer.analyze(&doc).unwrap().is_none());
    }

    #[test]
    fn test_result_cached_per_snapshot() {
        let doc = doc_with_false_branch();
        let analyzer = ConstantPropagationAnalyzer::new();
        let first = analyzer.analyze(&doc).unwrap().unwrap();
        let second = analyzer.analyze(&doc).unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        analyzer.clear_cache();
        let third = analyzer.analyze(&doc).unwrap().unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
    }
}
