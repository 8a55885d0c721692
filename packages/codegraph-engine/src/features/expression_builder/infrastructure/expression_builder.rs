//! Expression extraction
//!
//! Walks an AST expression tree and emits [`Expression`] records with
//! parent links, reads/defines (by variable name), and call metadata.
//! Direct reads live on the leaf access expressions (NameLoad, Attribute,
//! Subscript); calls receive their operand flow through expression-tree
//! edges added by the graph index.

use serde_json::Value;

use crate::features::parsing::domain::AstNode;
use crate::shared::models::{ExprKind, Expression, Span};

pub struct ExpressionBuilder {
    file_path: String,
    seq: u32,
    expressions: Vec<Expression>,
}

impl ExpressionBuilder {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            seq: 0,
            expressions: Vec::new(),
        }
    }

    fn next_id(&mut self, span: Span) -> String {
        let id = Expression::make_id(&self.file_path, span, self.seq);
        self.seq += 1;
        id
    }

    /// Build the expression tree rooted at `ast`; returns the root id.
    /// Returns `None` for AST nodes that are not expressions.
    pub fn build(
        &mut self,
        ast: &AstNode,
        function_fqn: &str,
        block_id: Option<&str>,
        parent: Option<&str>,
    ) -> Option<String> {
        let span = ast.span();
        let kind = match ast {
            AstNode::Name { id, .. } => ExprKind::NameLoad { name: id.clone() },
            AstNode::Attribute { value, attr, .. } => {
                let object = value.dotted_name().unwrap_or_default();
                ExprKind::Attribute {
                    object,
                    attr: attr.clone(),
                }
            }
            AstNode::Subscript { value, .. } => ExprKind::Subscript {
                object: value.dotted_name().unwrap_or_default(),
            },
            AstNode::BinOpExpr { op, .. } => ExprKind::BinOp { op: *op },
            AstNode::UnaryOpExpr { op, .. } => ExprKind::UnaryOp { op: *op },
            AstNode::CompareExpr { op, .. } => ExprKind::Compare { op: *op },
            AstNode::BoolOpExpr { op, .. } => ExprKind::BoolOp { op: *op },
            AstNode::LiteralExpr { kind, value, .. } => ExprKind::Literal {
                literal: *kind,
                value: value.clone(),
            },
            AstNode::CollectionExpr { kind, .. } => ExprKind::Collection { collection: *kind },
            AstNode::Call { callee, args, .. } => {
                let callee_name = callee.dotted_name().unwrap_or_else(|| "<dynamic>".into());
                let receiver = match callee.as_ref() {
                    AstNode::Attribute { value, .. } => value.dotted_name(),
                    _ => None,
                };
                let arg_names: Vec<String> = args
                    .iter()
                    .map(|a| a.dotted_name().unwrap_or_default())
                    .collect();
                ExprKind::Call {
                    callee: callee_name,
                    args: arg_names,
                    receiver,
                }
            }
            AstNode::Lambda { params, .. } => ExprKind::Lambda {
                params: params.iter().map(|p| p.name.clone()).collect(),
            },
            _ => return None,
        };

        let id = self.next_id(span);
        let mut expr = Expression::new(&id, kind, span, self.file_path.clone());
        expr.function_fqn = Some(function_fqn.to_string());
        expr.block_id = block_id.map(str::to_string);
        expr.parent_expr_id = parent.map(str::to_string);

        // direct reads on leaf access expressions only
        match ast {
            AstNode::Name { id: name, .. } => expr.reads_vars.push(name.clone()),
            AstNode::Attribute { value, .. } | AstNode::Subscript { value, .. } => {
                if let AstNode::Name { id: base, .. } = value.as_ref() {
                    expr.reads_vars.push(base.clone());
                }
            }
            _ => {}
        }

        self.expressions.push(expr);

        // children
        match ast {
            AstNode::Call { callee, args, .. } => {
                // attribute callees read their receiver through the tree
                if matches!(callee.as_ref(), AstNode::Attribute { .. }) {
                    self.build(callee, function_fqn, block_id, Some(&id));
                }
                for arg in args {
                    self.build(arg, function_fqn, block_id, Some(&id));
                }
            }
            AstNode::BinOpExpr { left, right, .. } | AstNode::CompareExpr { left, right, .. } => {
                self.build(left, function_fqn, block_id, Some(&id));
                self.build(right, function_fqn, block_id, Some(&id));
            }
            AstNode::UnaryOpExpr { operand, .. } => {
                self.build(operand, function_fqn, block_id, Some(&id));
            }
            AstNode::BoolOpExpr { values, .. } => {
                for value in values {
                    self.build(value, function_fqn, block_id, Some(&id));
                }
            }
            AstNode::CollectionExpr { items, .. } => {
                for item in items {
                    self.build(item, function_fqn, block_id, Some(&id));
                }
            }
            AstNode::Subscript { index, .. } => {
                self.build(index, function_fqn, block_id, Some(&id));
            }
            _ => {}
        }

        Some(id)
    }

    /// Record what the expression at `expr_id` defines: the variable name
    /// plus the resolved version id for the index.
    pub fn set_defines(&mut self, expr_id: &str, var_name: &str, var_id: &str) {
        if let Some(expr) = self.expressions.iter_mut().find(|e| e.id == expr_id) {
            expr.defines_var = Some(var_name.to_string());
            expr.attrs.insert(
                "defines_var_id".to_string(),
                Value::String(var_id.to_string()),
            );
        }
    }

    pub fn set_attr(&mut self, expr_id: &str, key: &str, value: Value) {
        if let Some(expr) = self.expressions.iter_mut().find(|e| e.id == expr_id) {
            expr.attrs.insert(key.to_string(), value);
        }
    }

    pub fn get(&self, expr_id: &str) -> Option<&Expression> {
        self.expressions.iter().find(|e| e.id == expr_id)
    }

    pub fn all(&self) -> &[Expression] {
        &self.expressions
    }

    pub fn len(&self) -> usize {
        self.expressions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }

    /// Ids of nested (non-root) call expressions inside the subtree of
    /// `root_id`, in emission order.
    pub fn nested_call_ids(&self, root_id: &str) -> Vec<String> {
        self.expressions
            .iter()
            .filter(|e| e.kind.is_call() && e.id != root_id && self.has_ancestor(e, root_id))
            .map(|e| e.id.clone())
            .collect()
    }

    fn has_ancestor(&self, expr: &Expression, ancestor_id: &str) -> bool {
        let mut current = expr.parent_expr_id.as_deref();
        while let Some(pid) = current {
            if pid == ancestor_id {
                return true;
            }
            current = self.get(pid).and_then(|p| p.parent_expr_id.as_deref());
        }
        false
    }

    pub fn finish(self) -> Vec<Expression> {
        self.expressions
    }
}
