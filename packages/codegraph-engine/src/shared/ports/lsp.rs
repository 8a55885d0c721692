//! Language-server lookups (type hover / definition)
//!
//! The engine itself is synchronous; LSP adapters are asynchronous and
//! batched. Only this port is in scope; concrete adapters live with their
//! servers.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::shared::models::Span;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourcePosition {
    pub file_path: String,
    pub line: u32,
    pub col: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoverInfo {
    pub type_string: String,
    pub is_nullable: bool,
    #[serde(default)]
    pub type_params: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinitionInfo {
    pub file_path: String,
    pub span: Span,
}

/// Batched type-information provider backed by a language server.
#[async_trait]
pub trait TypeInfoProvider: Send + Sync {
    /// Hover (type) info for a batch of positions, keyed by position.
    /// Positions the server cannot answer are absent from the map.
    async fn fetch_hover_batch(
        &self,
        positions: &[SourcePosition],
    ) -> HashMap<SourcePosition, HoverInfo>;

    /// Definition sites for a batch of positions, keyed by position.
    async fn fetch_definition_batch(
        &self,
        positions: &[SourcePosition],
    ) -> HashMap<SourcePosition, DefinitionInfo>;
}
