//! Parser port
//!
//! Concrete-syntax parsing is an external collaborator. The IR builder
//! accepts a pre-parsed AST on the source file, or falls back to a parser
//! registered here for the file's language.

use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::Result;
use crate::features::parsing::domain::AstNode;

/// One source file handed to the pipeline.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: String,
    pub language: String,
    pub text: String,
    /// Pre-parsed tree. When absent, a registered parser is invoked.
    pub ast: Option<AstNode>,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, language: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            language: language.into(),
            text: text.into(),
            ast: None,
        }
    }

    pub fn with_ast(mut self, ast: AstNode) -> Self {
        self.ast = Some(ast);
        self
    }
}

pub trait SourceParser: Send + Sync {
    fn language(&self) -> &str;
    fn parse(&self, text: &str) -> Result<AstNode>;
}

#[derive(Default)]
pub struct ParserRegistry {
    parsers: HashMap<String, Arc<dyn SourceParser>>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, parser: Arc<dyn SourceParser>) {
        self.parsers.insert(parser.language().to_string(), parser);
    }

    pub fn get(&self, language: &str) -> Option<&Arc<dyn SourceParser>> {
        self.parsers.get(language)
    }

    pub fn supports(&self, language: &str) -> bool {
        self.parsers.contains_key(language)
    }
}
