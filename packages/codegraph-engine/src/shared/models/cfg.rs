//! Control-flow graph blocks and edges

use serde::{Deserialize, Serialize};

use super::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CFGBlockKind {
    Entry,
    Exit,
    Block,
    Condition,
    LoopHeader,
    Try,
    Catch,
    Finally,
    Suspend,
    Resume,
}

impl CFGBlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CFGBlockKind::Entry => "Entry",
            CFGBlockKind::Exit => "Exit",
            CFGBlockKind::Block => "Block",
            CFGBlockKind::Condition => "Condition",
            CFGBlockKind::LoopHeader => "LoopHeader",
            CFGBlockKind::Try => "Try",
            CFGBlockKind::Catch => "Catch",
            CFGBlockKind::Finally => "Finally",
            CFGBlockKind::Suspend => "Suspend",
            CFGBlockKind::Resume => "Resume",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CFGEdgeKind {
    Sequential,
    TrueBranch,
    FalseBranch,
    LoopBack,
    LoopExit,
    Exception,
    Finally,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CFGEdge {
    pub source_block_id: String,
    pub target_block_id: String,
    pub kind: CFGEdgeKind,
}

/// One basic block.
///
/// Exactly one Entry and one Exit exist per function; back-edges enter only
/// through LoopHeader blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CFGBlock {
    pub id: String,
    pub kind: CFGBlockKind,
    pub function_fqn: String,
    pub function_node_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    /// Condition blocks: referenced condition expression, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_expr_id: Option<String>,
    /// Condition blocks: constant value of the test when it is a literal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_literal: Option<bool>,
    /// Condition blocks: variable name the test reads, when it is a bare name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_var: Option<String>,
}

impl CFGBlock {
    pub fn new(
        id: impl Into<String>,
        kind: CFGBlockKind,
        function_fqn: impl Into<String>,
        function_node_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            function_fqn: function_fqn.into(),
            function_node_id: function_node_id.into(),
            span: None,
            condition_expr_id: None,
            condition_literal: None,
            condition_var: None,
        }
    }
}
