//! Shared test fixtures: AST construction helpers and engine setup.

#![allow(dead_code)]

use std::sync::Arc;

use codegraph_engine::features::ir_generation::domain::{BuildMode, IRDocument};
use codegraph_engine::features::parsing::domain::{AstNode, Param};
use codegraph_engine::features::parsing::ports::SourceFile;
use codegraph_engine::features::query_engine::infrastructure::QueryEngine;
use codegraph_engine::shared::models::{LiteralKind, Span};
use codegraph_engine::IrGenerator;

pub fn span(line: u32, start_col: u32, end_col: u32) -> Span {
    Span::new(line, start_col, line, end_col)
}

pub fn name(id: &str, line: u32, col: u32) -> AstNode {
    AstNode::Name {
        id: id.to_string(),
        span: Span::new(line, col, line, col + id.len() as u32),
    }
}

pub fn attr(base: &str, attribute: &str, line: u32, col: u32) -> AstNode {
    AstNode::Attribute {
        value: Box::new(name(base, line, col)),
        attr: attribute.to_string(),
        span: Span::new(
            line,
            col,
            line,
            col + (base.len() + attribute.len() + 1) as u32,
        ),
    }
}

pub fn call(callee: AstNode, args: Vec<AstNode>, line: u32, col: u32) -> AstNode {
    AstNode::Call {
        callee: Box::new(callee),
        args,
        span: Span::new(line, col, line, col + 20),
    }
}

pub fn assign(target: &str, value: AstNode, line: u32) -> AstNode {
    AstNode::Assign {
        target: target.to_string(),
        value: Box::new(value),
        annotation: None,
        span: Span::new(line, 0, line, 40),
    }
}

pub fn expr_stmt(value: AstNode, line: u32) -> AstNode {
    AstNode::ExprStmt {
        value: Box::new(value),
        span: Span::new(line, 0, line, 40),
    }
}

pub fn ret(value: AstNode, line: u32) -> AstNode {
    AstNode::Return {
        value: Some(Box::new(value)),
        span: Span::new(line, 4, line, 40),
    }
}

pub fn lit_bool(value: bool, line: u32, col: u32) -> AstNode {
    AstNode::LiteralExpr {
        kind: LiteralKind::Boolean,
        value: if value { "True".into() } else { "False".into() },
        span: Span::new(line, col, line, col + 5),
    }
}

pub fn list_lit(items: Vec<AstNode>, line: u32, col: u32) -> AstNode {
    AstNode::CollectionExpr {
        kind: codegraph_engine::shared::models::CollectionKind::List,
        items,
        span: Span::new(line, col, line, col + 10),
    }
}

pub fn if_stmt(test: AstNode, body: Vec<AstNode>, line: u32) -> AstNode {
    let end = body.last().map(|s| s.span().end_line).unwrap_or(line);
    AstNode::If {
        test: Box::new(test),
        body,
        orelse: vec![],
        span: Span::new(line, 0, end, 40),
    }
}

pub fn for_stmt(target: &str, iter: AstNode, body: Vec<AstNode>, line: u32) -> AstNode {
    let end = body.last().map(|s| s.span().end_line).unwrap_or(line);
    AstNode::For {
        target: target.to_string(),
        iter: Box::new(iter),
        body,
        span: Span::new(line, 0, end, 40),
    }
}

pub fn func_def(
    fn_name: &str,
    params: Vec<&str>,
    body: Vec<AstNode>,
    start_line: u32,
) -> AstNode {
    let end = body.last().map(|s| s.span().end_line).unwrap_or(start_line);
    AstNode::FunctionDef {
        name: fn_name.to_string(),
        params: params
            .iter()
            .map(|p| Param::new(*p, Span::new(start_line, 10, start_line, 10 + p.len() as u32)))
            .collect(),
        body,
        docstring: None,
        return_annotation: None,
        is_async: false,
        span: Span::new(start_line, 0, end, 40),
        body_span: Span::new(start_line + 1, 4, end, 40),
    }
}

pub fn class_def(class_name: &str, bases: Vec<&str>, body: Vec<AstNode>, start_line: u32) -> AstNode {
    let end = body.last().map(|s| s.span().end_line).unwrap_or(start_line);
    AstNode::ClassDef {
        name: class_name.to_string(),
        bases: bases.iter().map(|b| b.to_string()).collect(),
        body,
        docstring: None,
        span: Span::new(start_line, 0, end, 40),
        body_span: Span::new(start_line + 1, 4, end, 40),
    }
}

pub fn module(body: Vec<AstNode>) -> AstNode {
    let end = body.last().map(|s| s.span().end_line).unwrap_or(1);
    AstNode::Module {
        body,
        span: Span::new(1, 0, end, 0),
    }
}

/// Generate a PR-mode document for one file of statements.
pub fn build_doc(path: &str, ast: AstNode) -> IRDocument {
    build_doc_with_mode(path, ast, BuildMode::Pr)
}

pub fn build_doc_with_mode(path: &str, ast: AstNode, mode: BuildMode) -> IRDocument {
    let generator = IrGenerator::new("testrepo", mode);
    let file = SourceFile::new(path, "python", "").with_ast(ast);
    generator.generate(&file, "snap-1").expect("ir generation")
}

pub fn engine_for(ast: AstNode) -> QueryEngine {
    let doc = build_doc("t.py", ast);
    QueryEngine::new(Arc::new(doc)).expect("engine build")
}
