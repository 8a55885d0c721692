//! Incremental rebuilds: stable ids for named symbols, content-based
//! identity and fuzzy migration for anonymous ones.

mod common;

use codegraph_engine::features::ir_generation::domain::BuildMode;
use codegraph_engine::features::parsing::domain::{AstNode, Param};
use codegraph_engine::features::parsing::ports::SourceFile;
use codegraph_engine::shared::models::{NodeKind, Span};
use codegraph_engine::shared::utils::IdGenerator;
use codegraph_engine::{IncrementalIrBuilder, IrGenerator};

use common::*;

fn lambda_assign(target: &str, param: &str, body: AstNode, line: u32) -> AstNode {
    AstNode::Assign {
        target: target.to_string(),
        value: Box::new(AstNode::Lambda {
            params: vec![Param::new(param, Span::new(line, 10, line, 11))],
            body: Box::new(body),
            span: Span::new(line, 8, line, 30),
        }),
        annotation: None,
        span: Span::new(line, 0, line, 30),
    }
}

#[test]
fn unchanged_file_produces_no_node_delta() {
    IdGenerator::global().clear();
    let generator = IrGenerator::new("testrepo", BuildMode::Pr);
    let ast = module(vec![func_def(
        "process",
        vec!["data"],
        vec![assign("result", call(name("clean", 2, 12), vec![name("data", 2, 18)], 2, 12), 2)],
        1,
    )]);
    let file = SourceFile::new("inc.py", "python", "").with_ast(ast);
    let old_doc = generator.generate(&file, "snap-1").unwrap();

    IdGenerator::global().clear();
    let builder = IncrementalIrBuilder::new(IrGenerator::new("testrepo", BuildMode::Pr));
    let (new_doc, delta) = builder
        .generate_incremental(&file, &old_doc, "snap-2")
        .unwrap();

    assert!(delta.added_nodes.is_empty(), "{:?}", delta.stats());
    assert!(delta.removed_nodes.is_empty());
    assert_eq!(old_doc.nodes.len(), new_doc.nodes.len());
}

#[test]
fn lambda_ids_survive_line_shifts() {
    IdGenerator::global().clear();
    let generator = IrGenerator::new("testrepo", BuildMode::Pr);

    let body = |line| call(name("clean", line, 18), vec![name("v", line, 24)], line, 18);
    let old_ast = module(vec![func_def(
        "setup",
        vec![],
        vec![lambda_assign("normalize", "v", body(2), 2)],
        1,
    )]);
    let new_ast = module(vec![func_def(
        "setup",
        vec![],
        vec![lambda_assign("normalize", "v", body(7), 7)],
        6,
    )]);

    let old_file = SourceFile::new("inc2.py", "python", "").with_ast(old_ast);
    let old_doc = generator.generate(&old_file, "snap-1").unwrap();

    IdGenerator::global().clear();
    let builder = IncrementalIrBuilder::new(IrGenerator::new("testrepo", BuildMode::Pr));
    let new_file = SourceFile::new("inc2.py", "python", "").with_ast(new_ast);
    let (new_doc, _) = builder
        .generate_incremental(&new_file, &old_doc, "snap-2")
        .unwrap();

    let lambda_ids = |doc: &codegraph_engine::IRDocument| {
        doc.nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Lambda)
            .map(|n| n.id.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(lambda_ids(&old_doc), lambda_ids(&new_doc));
}

#[test]
fn changed_lambda_migrates_by_fuzzy_match() {
    IdGenerator::global().clear();
    let generator = IrGenerator::new("testrepo", BuildMode::Pr);

    // the parameter list changes, so the content hash (and id) changes
    let old_ast = module(vec![func_def(
        "setup",
        vec![],
        vec![lambda_assign(
            "normalize",
            "v",
            call(name("clean", 2, 18), vec![name("v", 2, 24)], 2, 18),
            2,
        )],
        1,
    )]);
    let new_ast = module(vec![func_def(
        "setup",
        vec![],
        vec![lambda_assign(
            "normalize",
            "value",
            call(name("clean", 2, 18), vec![name("value", 2, 24)], 2, 18),
            2,
        )],
        1,
    )]);

    let old_file = SourceFile::new("inc3.py", "python", "").with_ast(old_ast);
    let old_doc = generator.generate(&old_file, "snap-1").unwrap();

    IdGenerator::global().clear();
    let builder = IncrementalIrBuilder::new(IrGenerator::new("testrepo", BuildMode::Pr));
    let new_file = SourceFile::new("inc3.py", "python", "").with_ast(new_ast);
    let (new_doc, delta) = builder
        .generate_incremental(&new_file, &old_doc, "snap-2")
        .unwrap();

    // kind + file + enclosing method agree (0.7): migrated, not churned
    assert_eq!(delta.id_migrations.len(), 1);
    assert_eq!(delta.modified_nodes.len(), 1);
    let old_lambda_id = old_doc
        .nodes
        .iter()
        .find(|n| n.kind == NodeKind::Lambda)
        .map(|n| n.id.clone())
        .unwrap();
    assert!(new_doc.nodes.iter().any(|n| n.id == old_lambda_id));
}
