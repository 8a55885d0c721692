//! Chunk tree invariants over generated IR: containment, sibling
//! non-overlap, id collision handling, IR cross-references.

mod common;

use codegraph_engine::features::chunking::domain::ChunkKind;
use codegraph_engine::features::chunking::infrastructure::{BoundaryValidator, ChunkBuilder};
use rustc_hash::FxHashMap;

use common::*;

fn sample_ast() -> codegraph_engine::features::parsing::domain::AstNode {
    module(vec![
        class_def(
            "Session",
            vec![],
            vec![
                func_def(
                    "login",
                    vec!["self", "user"],
                    vec![assign(
                        "token",
                        call(name("issue", 3, 16), vec![name("user", 3, 22)], 3, 16),
                        3,
                    )],
                    2,
                ),
                func_def(
                    "logout",
                    vec!["self"],
                    vec![expr_stmt(
                        call(name("revoke", 6, 8), vec![], 6, 8),
                        6,
                    )],
                    5,
                ),
            ],
            1,
        ),
        func_def(
            "main",
            vec![],
            vec![assign("s", call(name("Session", 9, 8), vec![], 9, 8), 9)],
            8,
        ),
    ])
}

#[test]
fn chunk_tree_satisfies_containment() {
    let doc = build_doc("myapp/session.py", sample_ast());
    let result = ChunkBuilder::new().build(&doc, &FxHashMap::default());

    let report = BoundaryValidator::validate(&result.chunks);
    assert!(report.is_valid(), "violations: {:?}", report.violations);

    // every non-root chunk's range sits inside its parent's
    let by_id: FxHashMap<&str, &codegraph_engine::features::chunking::domain::Chunk> = result
        .chunks
        .iter()
        .map(|c| (c.chunk_id.as_str(), c))
        .collect();
    for chunk in &result.chunks {
        let (Some(parent_id), Some(start), Some(end)) =
            (&chunk.parent_id, chunk.start_line, chunk.end_line)
        else {
            continue;
        };
        let parent = by_id[parent_id.as_str()];
        if let (Some(p_start), Some(p_end)) = (parent.start_line, parent.end_line) {
            assert!(p_start <= start && end <= p_end, "chunk {} escapes parent", chunk.chunk_id);
        }
    }
}

#[test]
fn function_chunks_nest_under_their_class() {
    let doc = build_doc("myapp/session.py", sample_ast());
    let result = ChunkBuilder::new().build(&doc, &FxHashMap::default());

    let class_chunk = result
        .chunks
        .iter()
        .find(|c| c.kind == ChunkKind::Class)
        .unwrap();
    let login = result
        .chunks
        .iter()
        .find(|c| c.kind == ChunkKind::Function && c.fqn.ends_with("Session.login"))
        .unwrap();
    let main = result
        .chunks
        .iter()
        .find(|c| c.kind == ChunkKind::Function && c.fqn.ends_with(".main"))
        .unwrap();
    let file_chunk = result
        .chunks
        .iter()
        .find(|c| c.kind == ChunkKind::File)
        .unwrap();

    assert_eq!(login.parent_id.as_deref(), Some(class_chunk.chunk_id.as_str()));
    assert_eq!(main.parent_id.as_deref(), Some(file_chunk.chunk_id.as_str()));
    assert!(class_chunk.children.contains(&login.chunk_id));
}

#[test]
fn chunks_reference_ir_nodes_by_value() {
    let doc = build_doc("myapp/session.py", sample_ast());
    let result = ChunkBuilder::new().build(&doc, &FxHashMap::default());

    for chunk in result.chunks.iter().filter(|c| c.kind.is_symbol()) {
        let ir_ids = result
            .chunk_to_ir
            .get(&chunk.chunk_id)
            .expect("symbol chunks map to IR nodes");
        for id in ir_ids {
            assert!(doc.get_node(id).is_some(), "dangling IR ref {}", id);
        }
    }
}

#[test]
fn content_hashes_ignore_trailing_newlines() {
    let doc = build_doc("myapp/session.py", sample_ast());

    let body = "class Session:\n    def login(self, user):\n        token = issue(user)\n\n    def logout(self):\n        revoke()\n\ndef main():\n    s = Session()\n";
    let mut texts_a = FxHashMap::default();
    texts_a.insert("myapp/session.py".to_string(), body.to_string());
    let mut texts_b = FxHashMap::default();
    texts_b.insert("myapp/session.py".to_string(), format!("{}\n\n", body));

    let chunks_a = ChunkBuilder::new().build(&doc, &texts_a).chunks;
    let chunks_b = ChunkBuilder::new().build(&doc, &texts_b).chunks;

    let hash_of = |chunks: &[codegraph_engine::features::chunking::domain::Chunk], fqn: &str| {
        chunks
            .iter()
            .find(|c| c.kind == ChunkKind::Function && c.fqn.ends_with(fqn))
            .and_then(|c| c.content_hash.clone())
    };
    assert_eq!(
        hash_of(&chunks_a, "Session.login"),
        hash_of(&chunks_b, "Session.login")
    );
    assert!(hash_of(&chunks_a, "Session.login").is_some());
}

#[test]
fn visibility_and_tests_are_annotated() {
    let ast = module(vec![
        func_def("public_api", vec![], vec![], 1),
        func_def("_private_helper", vec![], vec![], 3),
    ]);
    let doc = build_doc("tests/test_api.py", ast);
    let result = ChunkBuilder::new().build(&doc, &FxHashMap::default());

    let public = result
        .chunks
        .iter()
        .find(|c| c.fqn.ends_with("public_api"))
        .unwrap();
    let private = result
        .chunks
        .iter()
        .find(|c| c.fqn.ends_with("_private_helper"))
        .unwrap();

    assert_eq!(public.visibility.as_deref(), Some("public"));
    assert_eq!(private.visibility.as_deref(), Some("private"));
    assert_eq!(public.is_test, Some(true));
    assert!(public.importance > private.importance);
}
