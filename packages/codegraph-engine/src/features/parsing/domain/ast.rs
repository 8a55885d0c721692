//! Language-neutral AST consumed by the IR builder
//!
//! Concrete-syntax parsing is not part of this crate; parsers hand over this
//! tree (with spans) through the [`super::super::ports::SourceParser`] port,
//! or callers attach a pre-parsed tree to the [`SourceFile`] directly.

use serde::{Deserialize, Serialize};

use crate::shared::models::{BinOp, BoolOp, CollectionKind, CompOp, LiteralKind, Span, UnaryOp};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    pub span: Span,
}

impl Param {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            annotation: None,
            span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptHandler {
    /// Exception type name, `None` for a bare handler.
    pub exception: Option<String>,
    pub body: Vec<AstNode>,
    pub span: Span,
}

/// One AST node. Statements and expressions share the enum; the IR builder
/// dispatches on the variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AstNode {
    Module {
        body: Vec<AstNode>,
        span: Span,
    },
    ClassDef {
        name: String,
        bases: Vec<String>,
        body: Vec<AstNode>,
        docstring: Option<String>,
        span: Span,
        body_span: Span,
    },
    FunctionDef {
        name: String,
        params: Vec<Param>,
        body: Vec<AstNode>,
        docstring: Option<String>,
        return_annotation: Option<String>,
        is_async: bool,
        span: Span,
        body_span: Span,
    },
    Lambda {
        params: Vec<Param>,
        body: Box<AstNode>,
        span: Span,
    },
    /// `import m` / `import m as a`
    Import {
        module: String,
        alias: Option<String>,
        span: Span,
    },
    /// `from m import x [as a], …`; `wildcard` for `from m import *`
    ImportFrom {
        module: String,
        names: Vec<(String, Option<String>)>,
        wildcard: bool,
        span: Span,
    },
    Assign {
        target: String,
        value: Box<AstNode>,
        annotation: Option<String>,
        span: Span,
    },
    ExprStmt {
        value: Box<AstNode>,
        span: Span,
    },
    If {
        test: Box<AstNode>,
        body: Vec<AstNode>,
        orelse: Vec<AstNode>,
        span: Span,
    },
    While {
        test: Box<AstNode>,
        body: Vec<AstNode>,
        span: Span,
    },
    For {
        target: String,
        iter: Box<AstNode>,
        body: Vec<AstNode>,
        span: Span,
    },
    Try {
        body: Vec<AstNode>,
        handlers: Vec<ExceptHandler>,
        finally: Vec<AstNode>,
        span: Span,
    },
    Return {
        value: Option<Box<AstNode>>,
        span: Span,
    },
    Call {
        callee: Box<AstNode>,
        args: Vec<AstNode>,
        span: Span,
    },
    Name {
        id: String,
        span: Span,
    },
    Attribute {
        value: Box<AstNode>,
        attr: String,
        span: Span,
    },
    Subscript {
        value: Box<AstNode>,
        index: Box<AstNode>,
        span: Span,
    },
    BinOpExpr {
        op: BinOp,
        left: Box<AstNode>,
        right: Box<AstNode>,
        span: Span,
    },
    UnaryOpExpr {
        op: UnaryOp,
        operand: Box<AstNode>,
        span: Span,
    },
    CompareExpr {
        op: CompOp,
        left: Box<AstNode>,
        right: Box<AstNode>,
        span: Span,
    },
    BoolOpExpr {
        op: BoolOp,
        values: Vec<AstNode>,
        span: Span,
    },
    LiteralExpr {
        kind: LiteralKind,
        value: String,
        span: Span,
    },
    CollectionExpr {
        kind: CollectionKind,
        items: Vec<AstNode>,
        span: Span,
    },
}

impl AstNode {
    pub fn span(&self) -> Span {
        match self {
            AstNode::Module { span, .. }
            | AstNode::ClassDef { span, .. }
            | AstNode::FunctionDef { span, .. }
            | AstNode::Lambda { span, .. }
            | AstNode::Import { span, .. }
            | AstNode::ImportFrom { span, .. }
            | AstNode::Assign { span, .. }
            | AstNode::ExprStmt { span, .. }
            | AstNode::If { span, .. }
            | AstNode::While { span, .. }
            | AstNode::For { span, .. }
            | AstNode::Try { span, .. }
            | AstNode::Return { span, .. }
            | AstNode::Call { span, .. }
            | AstNode::Name { span, .. }
            | AstNode::Attribute { span, .. }
            | AstNode::Subscript { span, .. }
            | AstNode::BinOpExpr { span, .. }
            | AstNode::UnaryOpExpr { span, .. }
            | AstNode::CompareExpr { span, .. }
            | AstNode::BoolOpExpr { span, .. }
            | AstNode::LiteralExpr { span, .. }
            | AstNode::CollectionExpr { span, .. } => *span,
        }
    }

    pub fn is_statement(&self) -> bool {
        matches!(
            self,
            AstNode::Module { .. }
                | AstNode::ClassDef { .. }
                | AstNode::FunctionDef { .. }
                | AstNode::Import { .. }
                | AstNode::ImportFrom { .. }
                | AstNode::Assign { .. }
                | AstNode::ExprStmt { .. }
                | AstNode::If { .. }
                | AstNode::While { .. }
                | AstNode::For { .. }
                | AstNode::Try { .. }
                | AstNode::Return { .. }
        )
    }

    /// Dotted callee name for call expressions: `Name` → `f`,
    /// `Attribute(Name(conn), execute)` → `conn.execute`.
    pub fn dotted_name(&self) -> Option<String> {
        match self {
            AstNode::Name { id, .. } => Some(id.clone()),
            AstNode::Attribute { value, attr, .. } => {
                value.dotted_name().map(|base| format!("{}.{}", base, attr))
            }
            _ => None,
        }
    }
}
