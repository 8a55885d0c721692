//! Import processing
//!
//! Each import creates an Import node plus an IMPORTS edge from the file,
//! and registers its alias in the current scope's import table for callee
//! resolution. Wildcard imports record the module with alias `*` and are
//! not expanded.

use crate::features::parsing::domain::AstNode;
use crate::shared::models::{Node, NodeKind, Span};
use crate::shared::utils::id_generator;

/// One resolved import: the node to add, and the alias binding to register.
#[derive(Debug)]
pub struct ImportRecord {
    pub node: Node,
    /// FQN of the imported symbol (IMPORTS edge target name).
    pub imported_fqn: String,
    /// Alias to register in scope (`*` for wildcard imports).
    pub alias: String,
}

pub fn process_import(
    stmt: &AstNode,
    file_path: &str,
    language: &str,
    module_path: &str,
    parent_id: &str,
) -> Vec<ImportRecord> {
    match stmt {
        AstNode::Import { module, alias, span } => {
            vec![make_record(
                module.clone(),
                alias.clone().unwrap_or_else(|| module.clone()),
                *span,
                file_path,
                language,
                module_path,
                parent_id,
            )]
        }
        AstNode::ImportFrom {
            module,
            names,
            wildcard,
            span,
        } => {
            if *wildcard {
                return vec![make_record(
                    module.clone(),
                    "*".to_string(),
                    *span,
                    file_path,
                    language,
                    module_path,
                    parent_id,
                )];
            }
            names
                .iter()
                .map(|(name, alias)| {
                    let fqn = format!("{}.{}", module, name);
                    make_record(
                        fqn,
                        alias.clone().unwrap_or_else(|| name.clone()),
                        *span,
                        file_path,
                        language,
                        module_path,
                        parent_id,
                    )
                })
                .collect()
        }
        _ => Vec::new(),
    }
}

fn make_record(
    imported_fqn: String,
    alias: String,
    span: Span,
    file_path: &str,
    language: &str,
    module_path: &str,
    parent_id: &str,
) -> ImportRecord {
    let node_id = id_generator::node_id(NodeKind::Import, &imported_fqn);
    let node = Node::new(node_id, NodeKind::Import, &imported_fqn, file_path, span)
        .with_language(language)
        .with_name(alias.clone())
        .with_module_path(module_path)
        .with_parent(parent_id);
    ImportRecord {
        node,
        imported_fqn,
        alias,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_import_with_alias() {
        let stmt = AstNode::Import {
            module: "numpy".into(),
            alias: Some("np".into()),
            span: Span::line(1),
        };
        let records = process_import(&stmt, "m.py", "python", "m", "file:m.py");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].alias, "np");
        assert_eq!(records[0].imported_fqn, "numpy");
    }

    #[test]
    fn test_from_import_expands_names() {
        let stmt = AstNode::ImportFrom {
            module: "os.path".into(),
            names: vec![("join".into(), None), ("exists".into(), Some("ex".into()))],
            wildcard: false,
            span: Span::line(2),
        };
        let records = process_import(&stmt, "m.py", "python", "m", "file:m.py");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].imported_fqn, "os.path.join");
        assert_eq!(records[1].alias, "ex");
    }

    #[test]
    fn test_wildcard_records_star_alias() {
        let stmt = AstNode::ImportFrom {
            module: "helpers".into(),
            names: vec![],
            wildcard: true,
            span: Span::line(3),
        };
        let records = process_import(&stmt, "m.py", "python", "m", "file:m.py");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].alias, "*");
    }
}
