//! Taint through lambda parameters: caller arguments bind to the lambda's
//! inner parameter via the callee-target bridge.

mod common;

use codegraph_engine::features::ir_generation::domain::BuildMode;
use codegraph_engine::features::parsing::domain::{AstNode, Param};
use codegraph_engine::features::query_engine::domain::{QueryMode, StopReason, E, Q};
use codegraph_engine::features::query_engine::infrastructure::QueryOverrides;
use codegraph_engine::shared::models::{NodeKind, Span};

use common::*;

/// execute = lambda x: os.system(x)
/// cmd = input()
/// execute(cmd)
fn lambda_ast() -> AstNode {
    let lambda_body = call(attr("os", "system", 1, 20), vec![name("x", 1, 30)], 1, 20);
    module(vec![
        AstNode::Assign {
            target: "execute".into(),
            value: Box::new(AstNode::Lambda {
                params: vec![Param::new("x", Span::new(1, 17, 1, 18))],
                body: Box::new(lambda_body),
                span: Span::new(1, 10, 1, 33),
            }),
            annotation: None,
            span: Span::new(1, 0, 1, 33),
        },
        assign("cmd", call(name("input", 2, 6), vec![], 2, 6), 2),
        expr_stmt(
            call(name("execute", 3, 0), vec![name("cmd", 3, 8)], 3, 0),
            3,
        ),
    ])
}

#[test]
fn taint_crosses_lambda_parameter_binding() {
    let engine = engine_for(lambda_ast());
    let flow = (Q::call("input") >> Q::call("os.system")).via(E::dfg());
    let result = engine
        .execute_flow(flow, QueryMode::Pr, &QueryOverrides::new())
        .unwrap();

    assert_eq!(result.stop_reason, StopReason::Complete);
    assert_eq!(result.len(), 1);

    let ids: Vec<&str> = result.paths[0].nodes.iter().map(|n| n.id.as_str()).collect();
    assert!(
        ids.iter().any(|id| id.starts_with("callee:execute:param:")),
        "path must cross the callee parameter target: {:?}",
        ids
    );
}

#[test]
fn lambda_node_has_content_based_id() {
    let doc = build_doc("t.py", lambda_ast());
    let lambda_node = doc
        .nodes
        .iter()
        .find(|n| n.kind == NodeKind::Lambda)
        .expect("lambda node");
    assert!(lambda_node.id.starts_with("lambda:"));
    assert!(lambda_node.fqn.contains(".lambda$"));
    assert!(lambda_node.content_hash.is_some());
}

#[test]
fn quick_mode_skips_semantic_layers_but_keeps_calls() {
    let doc = build_doc_with_mode("t.py", lambda_ast(), BuildMode::Quick);

    assert!(doc.expressions.is_empty());
    assert!(doc.cfg_blocks.is_empty());
    assert!(doc.dfg.is_none());

    // CALLS edges survive in quick mode
    let call_edges = doc
        .edges
        .iter()
        .filter(|e| e.kind == codegraph_engine::shared::models::EdgeKind::Calls)
        .count();
    assert!(call_edges >= 2, "input and execute calls expected");
}
