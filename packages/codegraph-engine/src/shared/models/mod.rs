//! Shared models

mod cfg;
mod dfg;
mod diagnostic;
mod edge;
pub mod expression;
mod node;
pub mod occurrence;
mod span;
pub mod span_pool;

pub use cfg::{CFGBlock, CFGBlockKind, CFGEdge, CFGEdgeKind};
pub use dfg::{
    callee_param_id, DataflowEdge, DataflowEdgeKind, DfgSnapshot, InterproceduralEdge,
    InterproceduralEdgeKind, VariableEntity, VariableKind,
};
pub use diagnostic::{Diagnostic, DiagnosticSeverity, PackageMetadata};
pub use edge::{Edge, EdgeKind};
pub use expression::{
    BinOp, BoolOp, CollectionKind, CompOp, ExprKind, Expression, LiteralKind, UnaryOp,
};
pub use node::{ControlFlowSummary, Node, NodeKind};
pub use occurrence::{Occurrence, OccurrenceIndex, SymbolRole, SymbolRoles};
pub use span::{Location, Span};
pub use span_pool::{SpanPool, SpanPoolStats};

// Re-export serde_json::Value for convenience (used by Node/Edge/Expression attrs)
pub use serde_json::Value;

/// Node identifier type alias
pub type NodeId = String;
