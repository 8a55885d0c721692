//! End-to-end taint-flow scenarios over generated IR.

mod common;

use std::sync::Arc;

use codegraph_engine::features::ir_generation::domain::IRDocument;
use codegraph_engine::features::query_engine::domain::{
    PathQuery, QueryMode, StopReason, UncertainReason, E, Q,
};
use codegraph_engine::features::query_engine::infrastructure::{QueryEngine, QueryOverrides};
use codegraph_engine::shared::models::{
    DataflowEdge, DataflowEdgeKind, DfgSnapshot, Span, VariableEntity, VariableKind,
};

use common::*;

/// user_input = input()
/// conn.execute(user_input)
fn direct_taint_ast() -> codegraph_engine::features::parsing::domain::AstNode {
    module(vec![
        assign("user_input", call(name("input", 1, 13), vec![], 1, 13), 1),
        expr_stmt(
            call(
                attr("conn", "execute", 2, 0),
                vec![name("user_input", 2, 13)],
                2,
                0,
            ),
            2,
        ),
    ])
}

#[test]
fn direct_taint_has_exactly_one_path() {
    let engine = engine_for(direct_taint_ast());
    let flow = (Q::call("input") >> Q::call("conn.execute")).via(E::dfg());
    let result = engine
        .execute_flow(flow, QueryMode::Pr, &QueryOverrides::new())
        .unwrap();

    assert_eq!(result.stop_reason, StopReason::Complete);
    assert_eq!(result.len(), 1, "expected exactly one path");

    // the path passes through the input call, the variable, and the
    // execute call, in order
    let ids: Vec<&str> = result.paths[0].nodes.iter().map(|n| n.id.as_str()).collect();
    let pos_input = ids
        .iter()
        .position(|id| id.starts_with("expr:") && engine_node_callee(&engine, id) == Some("input".into()))
        .expect("input call on path");
    let pos_var = ids
        .iter()
        .position(|id| id.contains(":user_input@"))
        .expect("user_input variable on path");
    let pos_execute = ids
        .iter()
        .position(|id| engine_node_callee(&engine, id) == Some("conn.execute".into()))
        .expect("execute call on path");
    assert!(pos_input < pos_var && pos_var < pos_execute);
}

fn engine_node_callee(engine: &QueryEngine, id: &str) -> Option<String> {
    engine
        .graph()
        .get_node(id)
        .and_then(|n| n.attr_str("callee_name").map(str::to_string))
}

/// user_input = input()
/// user_input = escape_sql(user_input)
/// conn.execute(user_input)
fn sanitized_ast() -> codegraph_engine::features::parsing::domain::AstNode {
    module(vec![
        assign("user_input", call(name("input", 1, 13), vec![], 1, 13), 1),
        assign(
            "user_input",
            call(
                name("escape_sql", 2, 13),
                vec![name("user_input", 2, 24)],
                2,
                13,
            ),
            2,
        ),
        expr_stmt(
            call(
                attr("conn", "execute", 3, 0),
                vec![name("user_input", 3, 13)],
                3,
                0,
            ),
            3,
        ),
    ])
}

#[test]
fn sanitizer_paths_survive_cleansed_by() {
    let engine = engine_for(sanitized_ast());

    // without cleansed_by the flow is still present
    let plain = (Q::call("input") >> Q::call("conn.execute")).via(E::dfg());
    let unconstrained = engine
        .execute_flow(plain, QueryMode::Pr, &QueryOverrides::new())
        .unwrap();
    assert!(!unconstrained.is_empty());

    // cleansed_by keeps exactly the sanitized path
    let cleansed = (Q::call("input") >> Q::call("conn.execute"))
        .via(E::dfg())
        .cleansed_by(Q::call("escape_sql"));
    let sanitized = engine
        .execute_flow(cleansed, QueryMode::Pr, &QueryOverrides::new())
        .unwrap();
    assert!(!sanitized.is_empty());
    for path in &sanitized.paths {
        assert!(path.is_sanitized);
        assert!(path
            .nodes
            .iter()
            .any(|n| n.attr_str("callee_name") == Some("escape_sql")));
    }
}

#[test]
fn excluding_removes_paths_through_node() {
    let engine = engine_for(sanitized_ast());
    let query = (Q::call("input") >> Q::call("conn.execute"))
        .via(E::dfg())
        .excluding(Q::call("escape_sql"));
    let result = engine
        .execute_flow(query, QueryMode::Pr, &QueryOverrides::new())
        .unwrap();
    for path in &result.paths {
        assert!(!path
            .nodes
            .iter()
            .any(|n| n.attr_str("callee_name") == Some("escape_sql")));
    }
}

/// xs = []
/// xs.append(input())
/// for y in xs:
///     eval(y)
fn collection_ast() -> codegraph_engine::features::parsing::domain::AstNode {
    module(vec![
        assign("xs", list_lit(vec![], 1, 5), 1),
        expr_stmt(
            call(
                attr("xs", "append", 2, 0),
                vec![call(name("input", 2, 10), vec![], 2, 10)],
                2,
                0,
            ),
            2,
        ),
        for_stmt(
            "y",
            name("xs", 3, 9),
            vec![expr_stmt(
                call(name("eval", 4, 4), vec![name("y", 4, 9)], 4, 4),
                4,
            )],
            3,
        ),
    ])
}

#[test]
fn collection_taint_flows_through_abstract_element() {
    let engine = engine_for(collection_ast());
    let flow = (Q::call("input") >> Q::call("eval")).via(E::dfg());
    let result = engine
        .execute_flow(flow, QueryMode::Pr, &QueryOverrides::new())
        .unwrap();

    assert_eq!(result.stop_reason, StopReason::Complete);
    assert!(!result.is_empty(), "expected a path through the collection");

    let through_element = result
        .paths
        .iter()
        .find(|p| p.nodes.iter().any(|n| n.id.contains("[*]")))
        .expect("path through the [*] abstract element");
    assert!(through_element.uncertain);
    assert!(through_element
        .uncertain_reasons
        .contains(&UncertainReason::HeapCutoff));
}

/// def handler():
///     user_input = input()
///     if False:
///         eval(user_input)
#[test]
fn sccp_prunes_constant_false_branch() {
    let ast = module(vec![func_def(
        "handler",
        vec![],
        vec![
            assign("user_input", call(name("input", 2, 17), vec![], 2, 17), 2),
            if_stmt(
                lit_bool(false, 3, 7),
                vec![expr_stmt(
                    call(name("eval", 4, 8), vec![name("user_input", 4, 13)], 4, 8),
                    4,
                )],
                3,
            ),
        ],
        1,
    )]);
    let engine = engine_for(ast);

    let flow = (Q::call("input") >> Q::call("eval")).via(E::dfg());
    let result = engine
        .execute_flow(flow, QueryMode::Pr, &QueryOverrides::new())
        .unwrap();

    assert_eq!(result.stop_reason, StopReason::Complete);
    assert!(
        result.is_empty(),
        "unreachable sink must not be reported: {:?}",
        result.paths.len()
    );
}

/// Synthetic 100k-node chain; the node budget, not the path budget,
/// stops the wildcard sweep.
#[test]
fn node_budget_stops_wildcard_sweep() {
    const CHAIN: usize = 100_000;
    let mut doc = IRDocument::new("testrepo", "snap-big");
    let mut variables = Vec::with_capacity(CHAIN);
    let mut edges = Vec::with_capacity(CHAIN - 1);

    let var_name = |i: usize| if i == 0 { "x".to_string() } else { format!("v{}", i) };
    for i in 0..CHAIN {
        let vname = var_name(i);
        variables.push(VariableEntity {
            id: VariableEntity::make_id("big.py", "m", &vname, (i + 1) as u32, 0),
            name: vname,
            function_fqn: "m".into(),
            file_path: "big.py".into(),
            kind: VariableKind::Local,
            type_id: None,
            scope_id: Some("m".into()),
            decl_span: Some(Span::line((i + 1) as u32)),
        });
    }
    for i in 0..CHAIN - 1 {
        edges.push(DataflowEdge::new(
            variables[i].id.clone(),
            variables[i + 1].id.clone(),
            DataflowEdgeKind::DefUse,
        ));
    }
    doc.dfg = Some(DfgSnapshot { variables, edges });

    let engine = QueryEngine::new(Arc::new(doc)).unwrap();
    let query: PathQuery = (Q::var("x") >> Q::any())
        .via(E::dfg())
        .depth(CHAIN, 1)
        .limit_nodes(1000);
    let result = engine.execute(&query).unwrap();

    assert_eq!(result.stop_reason, StopReason::MaxNodes);
    assert_eq!(result.nodes_visited, 1000);
    assert!(!result.diagnostics.is_empty());
}
