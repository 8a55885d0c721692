//! Expression IR
//!
//! Heterogeneous expression attributes are modelled as an algebraic kind:
//! one variant per expression kind, each carrying its required fields.
//! Common location/tree fields live on [`Expression`] itself.
//! `reads_vars`/`defines_var` carry variable *names*; the graph index
//! resolves them to variable ids at index time.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    FloorDiv,
    BitAnd,
    BitOr,
    BitXor,
    LShift,
    RShift,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Neg,
    Pos,
    Invert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    Is,
    IsNot,
    In,
    NotIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoolOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LiteralKind {
    Integer,
    Float,
    String,
    Boolean,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectionKind {
    List,
    Tuple,
    Set,
    Dict,
}

/// Expression kind with per-variant required fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ExprKind {
    NameLoad {
        name: String,
    },
    Attribute {
        object: String,
        attr: String,
    },
    Subscript {
        object: String,
    },
    BinOp {
        op: BinOp,
    },
    UnaryOp {
        op: UnaryOp,
    },
    Compare {
        op: CompOp,
    },
    BoolOp {
        op: BoolOp,
    },
    Call {
        callee: String,
        args: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        receiver: Option<String>,
    },
    Instantiate {
        class_name: String,
    },
    Literal {
        literal: LiteralKind,
        value: String,
    },
    Collection {
        collection: CollectionKind,
    },
    Assign {
        target: String,
    },
    Lambda {
        params: Vec<String>,
    },
    Comprehension,
    Conditional,
}

impl ExprKind {
    /// Canonical kind name used by `Q.Expr(kind)` matching.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ExprKind::NameLoad { .. } => "NameLoad",
            ExprKind::Attribute { .. } => "Attribute",
            ExprKind::Subscript { .. } => "Subscript",
            ExprKind::BinOp { .. } => "BinOp",
            ExprKind::UnaryOp { .. } => "UnaryOp",
            ExprKind::Compare { .. } => "Compare",
            ExprKind::BoolOp { .. } => "BoolOp",
            ExprKind::Call { .. } => "Call",
            ExprKind::Instantiate { .. } => "Instantiate",
            ExprKind::Literal { .. } => "Literal",
            ExprKind::Collection { .. } => "Collection",
            ExprKind::Assign { .. } => "Assign",
            ExprKind::Lambda { .. } => "Lambda",
            ExprKind::Comprehension => "Comprehension",
            ExprKind::Conditional => "Conditional",
        }
    }

    pub fn is_call(&self) -> bool {
        matches!(self, ExprKind::Call { .. } | ExprKind::Instantiate { .. })
    }

    /// Callee name for call-site indexing, if any.
    pub fn callee_name(&self) -> Option<&str> {
        match self {
            ExprKind::Call { callee, .. } => Some(callee),
            ExprKind::Instantiate { class_name } => Some(class_name),
            _ => None,
        }
    }
}

/// One expression in a per-function forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    /// `expr:{file}:{line}:{col}:{seq}`
    pub id: String,
    #[serde(flatten)]
    pub kind: ExprKind,
    pub span: Span,
    pub file_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_fqn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_expr_id: Option<String>,

    /// Variable names this expression directly reads.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reads_vars: Vec<String>,
    /// Variable name this expression defines, if it binds a result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defines_var: Option<String>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attrs: HashMap<String, Value>,
}

impl Expression {
    pub fn make_id(file_path: &str, span: Span, seq: u32) -> String {
        format!(
            "expr:{}:{}:{}:{}",
            file_path, span.start_line, span.start_col, seq
        )
    }

    pub fn new(id: impl Into<String>, kind: ExprKind, span: Span, file_path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            span,
            file_path: file_path.into(),
            function_fqn: None,
            block_id: None,
            parent_expr_id: None,
            reads_vars: Vec::new(),
            defines_var: None,
            attrs: HashMap::new(),
        }
    }

    /// Resolved id of the variable version this expression defines
    /// (set by the builder when the declaration site is known).
    pub fn defines_var_id(&self) -> Option<&str> {
        self.attrs.get("defines_var_id").and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        let call = ExprKind::Call {
            callee: "conn.execute".into(),
            args: vec!["user_input".into()],
            receiver: Some("conn".into()),
        };
        assert_eq!(call.kind_name(), "Call");
        assert_eq!(call.callee_name(), Some("conn.execute"));
        assert!(call.is_call());
        assert!(!ExprKind::Comprehension.is_call());
    }

    #[test]
    fn test_expression_id_format() {
        let id = Expression::make_id("t.py", Span::new(10, 4, 10, 20), 3);
        assert_eq!(id, "expr:t.py:10:4:3");
    }

    #[test]
    fn test_expression_serde_roundtrip() {
        let mut expr = Expression::new(
            "expr:t.py:1:0:0",
            ExprKind::Literal {
                literal: LiteralKind::Integer,
                value: "42".into(),
            },
            Span::new(1, 0, 1, 2),
            "t.py",
        );
        expr.reads_vars.push("x".into());

        let json = serde_json::to_string(&expr).unwrap();
        let back: Expression = serde_json::from_str(&json).unwrap();
        assert_eq!(expr, back);
    }
}
