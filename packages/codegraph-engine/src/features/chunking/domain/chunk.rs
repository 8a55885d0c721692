//! Chunk data model
//!
//! Symbol-first hierarchical chunking for retrieval:
//! Repo → Project → Module → File → Class → Function, with leaf kinds
//! (Docstring, FileHeader, Skeleton, Usage, ModuleApi). A child's line
//! range lies within its parent's; leaf chunks have no children.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChunkKind {
    Repo,
    Project,
    Module,
    File,
    Class,
    Function,
    Docstring,
    FileHeader,
    Skeleton,
    Usage,
    ModuleApi,
}

impl ChunkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkKind::Repo => "repo",
            ChunkKind::Project => "project",
            ChunkKind::Module => "module",
            ChunkKind::File => "file",
            ChunkKind::Class => "class",
            ChunkKind::Function => "function",
            ChunkKind::Docstring => "docstring",
            ChunkKind::FileHeader => "file_header",
            ChunkKind::Skeleton => "skeleton",
            ChunkKind::Usage => "usage",
            ChunkKind::ModuleApi => "module_api",
        }
    }

    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ChunkKind::Repo | ChunkKind::Project | ChunkKind::Module | ChunkKind::File
        )
    }

    pub fn is_symbol(&self) -> bool {
        matches!(self, ChunkKind::Class | ChunkKind::Function)
    }

    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            ChunkKind::Function
                | ChunkKind::Docstring
                | ChunkKind::FileHeader
                | ChunkKind::Skeleton
                | ChunkKind::Usage
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: String,
    pub repo_id: String,
    pub snapshot_id: String,
    pub kind: ChunkKind,
    pub fqn: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_line: Option<u32>,
    /// MD5 of the normalised content (trailing newlines removed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// "public" | "internal" | "private"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    /// IR node this chunk represents (held by value so chunk stores
    /// serialise independently).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub importance: Option<f32>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attrs: HashMap<String, String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_test: Option<bool>,
    pub is_overlay: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlay_session_id: Option<String>,
}

impl Chunk {
    pub fn new(
        chunk_id: impl Into<String>,
        repo_id: impl Into<String>,
        snapshot_id: impl Into<String>,
        kind: ChunkKind,
        fqn: impl Into<String>,
    ) -> Self {
        Self {
            chunk_id: chunk_id.into(),
            repo_id: repo_id.into(),
            snapshot_id: snapshot_id.into(),
            kind,
            fqn: fqn.into(),
            module_path: None,
            file_path: None,
            start_line: None,
            end_line: None,
            content_hash: None,
            parent_id: None,
            children: Vec::new(),
            language: None,
            visibility: None,
            symbol_id: None,
            summary: None,
            importance: None,
            attrs: HashMap::new(),
            is_test: None,
            is_overlay: false,
            overlay_session_id: None,
        }
    }

    pub fn has_line_range(&self) -> bool {
        self.start_line.is_some() && self.end_line.is_some()
    }

    pub fn line_count(&self) -> Option<u32> {
        match (self.start_line, self.end_line) {
            (Some(start), Some(end)) => Some(end.saturating_sub(start) + 1),
            _ => None,
        }
    }

    pub fn add_child(&mut self, child_id: impl Into<String>) {
        let child_id = child_id.into();
        if !self.children.contains(&child_id) {
            self.children.push(child_id);
        }
    }
}

/// Cross-reference maps held by id, not by borrow.
pub type ChunkToIr = HashMap<String, Vec<String>>;
pub type ChunkToGraph = HashMap<String, Vec<String>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert!(ChunkKind::Repo.is_structural());
        assert!(ChunkKind::Class.is_symbol());
        assert!(ChunkKind::Docstring.is_leaf());
        assert!(!ChunkKind::File.is_symbol());
    }

    #[test]
    fn test_line_count() {
        let mut chunk = Chunk::new("chunk:r:file:a", "r", "s", ChunkKind::File, "a");
        assert_eq!(chunk.line_count(), None);
        chunk.start_line = Some(10);
        chunk.end_line = Some(20);
        assert_eq!(chunk.line_count(), Some(11));
    }

    #[test]
    fn test_add_child_dedups() {
        let mut chunk = Chunk::new("chunk:r:file:a", "r", "s", ChunkKind::File, "a");
        chunk.add_child("c1");
        chunk.add_child("c1");
        chunk.add_child("c2");
        assert_eq!(chunk.children, vec!["c1", "c2"]);
    }
}
