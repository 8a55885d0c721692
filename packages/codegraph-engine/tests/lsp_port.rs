//! Batched LSP port contract: maps keyed by position, absent entries for
//! positions the server cannot answer.

use std::collections::HashMap;

use async_trait::async_trait;
use codegraph_engine::shared::models::Span;
use codegraph_engine::shared::ports::lsp::{
    DefinitionInfo, HoverInfo, SourcePosition, TypeInfoProvider,
};

struct FakeLanguageServer;

#[async_trait]
impl TypeInfoProvider for FakeLanguageServer {
    async fn fetch_hover_batch(
        &self,
        positions: &[SourcePosition],
    ) -> HashMap<SourcePosition, HoverInfo> {
        positions
            .iter()
            .filter(|p| p.line % 2 == 0)
            .map(|p| {
                (
                    p.clone(),
                    HoverInfo {
                        type_string: "str".into(),
                        is_nullable: false,
                        type_params: vec![],
                    },
                )
            })
            .collect()
    }

    async fn fetch_definition_batch(
        &self,
        positions: &[SourcePosition],
    ) -> HashMap<SourcePosition, DefinitionInfo> {
        positions
            .iter()
            .map(|p| {
                (
                    p.clone(),
                    DefinitionInfo {
                        file_path: "defs.py".into(),
                        span: Span::line(p.line),
                    },
                )
            })
            .collect()
    }
}

#[tokio::test]
async fn hover_batch_keyed_by_position() {
    let server = FakeLanguageServer;
    let positions: Vec<SourcePosition> = (1..=4)
        .map(|line| SourcePosition {
            file_path: "t.py".into(),
            line,
            col: 0,
        })
        .collect();

    let hovers = server.fetch_hover_batch(&positions).await;
    assert_eq!(hovers.len(), 2);
    assert!(hovers.contains_key(&positions[1]));
    assert!(!hovers.contains_key(&positions[0]));

    let defs = server.fetch_definition_batch(&positions).await;
    assert_eq!(defs.len(), 4);
    assert_eq!(defs[&positions[0]].file_path, "defs.py");
}
