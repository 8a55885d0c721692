//! Method override exploration: PR mode explores every override body;
//! FULL mode narrows to the receiver's class when a prior assignment
//! pinned it.

mod common;

use std::sync::Arc;

use codegraph_engine::features::ir_generation::domain::IRDocument;
use codegraph_engine::features::parsing::domain::AstNode;
use codegraph_engine::features::query_engine::domain::{QueryMode, E, Q};
use codegraph_engine::features::query_engine::infrastructure::{
    ProjectContext, QueryEngine, QueryOverrides,
};
use codegraph_engine::shared::models::{EdgeKind, NodeKind};

use common::*;

/// class Parent:  def run(self): return input()
/// class Child(Parent):  def run(self): return input()
/// x = Child()
/// cmd = x.run()
/// os.system(cmd)
fn overrides_ast() -> AstNode {
    module(vec![
        class_def(
            "Parent",
            vec![],
            vec![func_def(
                "run",
                vec!["self"],
                vec![ret(call(name("input", 3, 15), vec![], 3, 15), 3)],
                2,
            )],
            1,
        ),
        class_def(
            "Child",
            vec!["Parent"],
            vec![func_def(
                "run",
                vec!["self"],
                vec![ret(call(name("input", 6, 15), vec![], 6, 15), 6)],
                5,
            )],
            4,
        ),
        assign("x", call(name("Child", 8, 4), vec![], 8, 4), 8),
        assign("cmd", call(attr("x", "run", 9, 6), vec![], 9, 6), 9),
        expr_stmt(
            call(attr("os", "system", 10, 0), vec![name("cmd", 10, 10)], 10, 0),
            10,
        ),
    ])
}

fn doc() -> IRDocument {
    build_doc("t.py", overrides_ast())
}

#[test]
fn overrides_edge_derived_between_run_methods() {
    let doc = doc();
    let override_edges: Vec<_> = doc
        .edges
        .iter()
        .filter(|e| e.kind == EdgeKind::Overrides)
        .collect();
    assert_eq!(override_edges.len(), 1);
    assert!(override_edges[0].source_id.contains("Child.run"));
    assert!(override_edges[0].target_id.contains("Parent.run"));
}

#[test]
fn pr_mode_explores_both_override_bodies() {
    let engine = QueryEngine::new(Arc::new(doc())).unwrap();
    let flow = (Q::call("input") >> Q::call("os.system")).via(E::dfg());
    let result = engine
        .execute_flow(flow, QueryMode::Pr, &QueryOverrides::new())
        .unwrap();

    assert_eq!(result.len(), 2, "both run() bodies reach the sink in PR mode");
}

#[test]
fn full_mode_narrows_to_receiver_class() {
    let engine = QueryEngine::new(Arc::new(doc())).unwrap().with_project_context(
        ProjectContext {
            repo_id: "testrepo".into(),
            root: None,
        },
    );
    let flow = (Q::call("input") >> Q::call("os.system")).via(E::dfg());
    let result = engine
        .execute_flow(flow, QueryMode::Full, &QueryOverrides::new())
        .unwrap();

    assert_eq!(result.len(), 1, "only Child.run reaches the sink with k=1");
    let path = &result.paths[0];
    let source = &path.nodes[0];
    assert!(source
        .attr_str("function_fqn")
        .is_some_and(|fqn| fqn.ends_with("Child.run")));
}

#[test]
fn full_mode_without_context_is_user_error() {
    let engine = QueryEngine::new(Arc::new(doc())).unwrap();
    let flow = (Q::call("input") >> Q::call("os.system")).via(E::dfg());
    let err = engine
        .execute_flow(flow, QueryMode::Full, &QueryOverrides::new())
        .unwrap_err();
    assert!(err.is_user_error());
}

#[test]
fn method_nodes_carry_control_flow_summaries() {
    let doc = doc();
    for method in doc.find_nodes_by_kind(NodeKind::Method) {
        let summary = method.control_flow.expect("summary per function");
        assert_eq!(summary.cyclomatic_complexity, 1);
        assert!(!summary.has_loop);
    }
}
