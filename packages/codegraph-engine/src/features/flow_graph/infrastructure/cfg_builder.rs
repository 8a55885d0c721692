//! CFG construction helper
//!
//! Block-level builder driven by the function analyzer. Guarantees exactly
//! one Entry and one Exit per function; back-edges enter only through
//! LoopHeader blocks.

use crate::shared::models::{CFGBlock, CFGBlockKind, CFGEdge, CFGEdgeKind, Span};
use crate::shared::utils::id_generator;

pub struct CfgBuilder {
    function_fqn: String,
    function_node_id: String,
    blocks: Vec<CFGBlock>,
    edges: Vec<CFGEdge>,
    current: String,
    next_index: usize,
}

impl CfgBuilder {
    pub fn new(function_fqn: impl Into<String>, function_node_id: impl Into<String>) -> Self {
        let function_fqn = function_fqn.into();
        let function_node_id = function_node_id.into();
        let entry_id = id_generator::block_id(&function_fqn, 0);
        let entry = CFGBlock::new(&entry_id, CFGBlockKind::Entry, &function_fqn, &function_node_id);

        let mut builder = Self {
            function_fqn,
            function_node_id,
            blocks: vec![entry],
            edges: Vec::new(),
            current: entry_id.clone(),
            next_index: 1,
        };
        // first statement block
        let first = builder.fresh_block(CFGBlockKind::Block, None);
        builder.edge(&entry_id, &first, CFGEdgeKind::Sequential);
        builder.current = first;
        builder
    }

    pub fn current_block_id(&self) -> &str {
        &self.current
    }

    pub fn set_current(&mut self, block_id: impl Into<String>) {
        self.current = block_id.into();
    }

    pub fn fresh_block(&mut self, kind: CFGBlockKind, span: Option<Span>) -> String {
        let id = id_generator::block_id(&self.function_fqn, self.next_index);
        self.next_index += 1;
        let mut block = CFGBlock::new(&id, kind, &self.function_fqn, &self.function_node_id);
        block.span = span;
        self.blocks.push(block);
        id
    }

    pub fn fresh_condition(
        &mut self,
        span: Option<Span>,
        condition_expr_id: Option<String>,
        condition_literal: Option<bool>,
        condition_var: Option<String>,
    ) -> String {
        let id = self.fresh_block(CFGBlockKind::Condition, span);
        if let Some(block) = self.blocks.iter_mut().find(|b| b.id == id) {
            block.condition_expr_id = condition_expr_id;
            block.condition_literal = condition_literal;
            block.condition_var = condition_var;
        }
        id
    }

    pub fn set_condition_expr(&mut self, block_id: &str, expr_id: &str) {
        if let Some(block) = self.blocks.iter_mut().find(|b| b.id == block_id) {
            block.condition_expr_id = Some(expr_id.to_string());
        }
    }

    pub fn edge(&mut self, source: &str, target: &str, kind: CFGEdgeKind) {
        self.edges.push(CFGEdge {
            source_block_id: source.to_string(),
            target_block_id: target.to_string(),
            kind,
        });
    }

    /// Seal the graph: append the Exit block and the final fall-through edge.
    pub fn finish(mut self) -> (Vec<CFGBlock>, Vec<CFGEdge>) {
        let exit_id = id_generator::block_id(&self.function_fqn, self.next_index);
        let exit = CFGBlock::new(
            &exit_id,
            CFGBlockKind::Exit,
            &self.function_fqn,
            &self.function_node_id,
        );
        self.blocks.push(exit);
        let current = self.current.clone();
        self.edge(&current, &exit_id, CFGEdgeKind::Sequential);
        (self.blocks, self.edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::CFGBlockKind;

    #[test]
    fn test_entry_and_exit_are_unique() {
        let builder = CfgBuilder::new("m.f", "function:m.f");
        let (blocks, edges) = builder.finish();

        let entries = blocks.iter().filter(|b| b.kind == CFGBlockKind::Entry).count();
        let exits = blocks.iter().filter(|b| b.kind == CFGBlockKind::Exit).count();
        assert_eq!(entries, 1);
        assert_eq!(exits, 1);
        assert!(!edges.is_empty());
    }

    #[test]
    fn test_branch_structure() {
        let mut builder = CfgBuilder::new("m.f", "function:m.f");
        let before = builder.current_block_id().to_string();
        let cond = builder.fresh_condition(None, None, Some(false), None);
        builder.edge(&before, &cond, CFGEdgeKind::Sequential);
        let then_block = builder.fresh_block(CFGBlockKind::Block, None);
        builder.edge(&cond, &then_block, CFGEdgeKind::TrueBranch);
        let join = builder.fresh_block(CFGBlockKind::Block, None);
        builder.edge(&cond, &join, CFGEdgeKind::FalseBranch);
        builder.edge(&then_block, &join, CFGEdgeKind::Sequential);
        builder.set_current(join);

        let (blocks, _) = builder.finish();
        let cond_block = blocks.iter().find(|b| b.kind == CFGBlockKind::Condition).unwrap();
        assert_eq!(cond_block.condition_literal, Some(false));
    }
}
