//! Chunk hierarchy construction
//!
//! Builds the Repo → Module → File → Class → Function tree from a
//! completed IR document, plus Docstring/FileHeader/Skeleton/Usage/
//! ModuleApi leaves. File and class chunks are path-indexed for O(1)
//! parent lookup; content hashes are MD5 of the normalised line range.

use md5::{Digest, Md5};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::features::chunking::domain::{
    Chunk, ChunkIdContext, ChunkIdGenerator, ChunkKind, ChunkToIr,
};
use crate::features::ir_generation::domain::IRDocument;
use crate::shared::models::{EdgeKind, NodeKind};

use super::test_detector::{is_test_file, is_test_symbol};
use super::visibility::visibility_of;

pub struct ChunkBuildResult {
    pub chunks: Vec<Chunk>,
    pub chunk_to_ir: ChunkToIr,
}

pub struct ChunkBuilder {
    id_generator: ChunkIdGenerator,
}

impl ChunkBuilder {
    pub fn new() -> Self {
        Self {
            id_generator: ChunkIdGenerator::new(),
        }
    }

    /// Build the chunk tree. `file_texts` maps file paths to their source
    /// text; missing entries simply skip content hashing.
    pub fn build(
        &self,
        doc: &IRDocument,
        file_texts: &FxHashMap<String, String>,
    ) -> ChunkBuildResult {
        let mut chunks: Vec<Chunk> = Vec::new();
        let mut chunk_to_ir: ChunkToIr = ChunkToIr::new();
        // O(1) parent lookup indexes
        let mut file_chunk_by_path: FxHashMap<String, usize> = FxHashMap::default();
        let mut class_chunk_by_node: FxHashMap<String, usize> = FxHashMap::default();
        let mut module_chunk_by_path: FxHashMap<String, usize> = FxHashMap::default();

        // repo root
        let repo_idx = chunks.len();
        chunks.push(self.make_chunk(doc, ChunkKind::Repo, &doc.repo_id, None));

        // files (and their parent modules)
        for node in doc.find_nodes_by_kind(NodeKind::File) {
            let module = node
                .module_path
                .as_deref()
                .and_then(parent_package)
                .map(str::to_string);

            let parent_idx = match module {
                Some(module_path) => {
                    let existing = module_chunk_by_path.get(&module_path).copied();
                    match existing {
                        Some(idx) => idx,
                        None => {
                            let idx = chunks.len();
                            let mut chunk =
                                self.make_chunk(doc, ChunkKind::Module, &module_path, None);
                            chunk.module_path = Some(module_path.clone());
                            chunk.parent_id = Some(chunks[repo_idx].chunk_id.clone());
                            let chunk_id = chunk.chunk_id.clone();
                            chunks.push(chunk);
                            chunks[repo_idx].add_child(chunk_id);
                            module_chunk_by_path.insert(module_path, idx);
                            idx
                        }
                    }
                }
                None => repo_idx,
            };

            let idx = chunks.len();
            let mut chunk = self.make_chunk(doc, ChunkKind::File, &node.fqn, Some(node));
            chunk.file_path = Some(node.file_path.clone());
            chunk.start_line = Some(1);
            chunk.end_line = Some(
                file_texts
                    .get(&node.file_path)
                    .map(|t| t.lines().count().max(1) as u32)
                    .unwrap_or(node.span.end_line.max(1)),
            );
            chunk.is_test = Some(is_test_file(&node.file_path));
            chunk.parent_id = Some(chunks[parent_idx].chunk_id.clone());
            self.hash_content(&mut chunk, file_texts);

            let chunk_id = chunk.chunk_id.clone();
            chunk_to_ir.insert(chunk_id.clone(), vec![node.id.clone()]);
            chunks.push(chunk);
            chunks[parent_idx].add_child(chunk_id);
            file_chunk_by_path.insert(node.file_path.clone(), idx);
        }

        // classes
        for node in doc.find_nodes_by_kind(NodeKind::Class) {
            if node.is_external() {
                continue;
            }
            let Some(&file_idx) = file_chunk_by_path.get(&node.file_path) else {
                continue;
            };
            let idx = chunks.len();
            let mut chunk = self.make_chunk(doc, ChunkKind::Class, &node.fqn, Some(node));
            chunk.parent_id = Some(chunks[file_idx].chunk_id.clone());
            self.hash_content(&mut chunk, file_texts);

            let chunk_id = chunk.chunk_id.clone();
            chunk_to_ir.insert(chunk_id.clone(), vec![node.id.clone()]);
            chunks.push(chunk);
            chunks[file_idx].add_child(chunk_id);
            class_chunk_by_node.insert(node.id.clone(), idx);

            self.push_docstring(doc, node, idx, &mut chunks, &mut chunk_to_ir);
        }

        // functions and methods
        for node in &doc.nodes {
            if !matches!(node.kind, NodeKind::Function | NodeKind::Method) || node.is_external() {
                continue;
            }
            let parent_idx = node
                .parent_id
                .as_ref()
                .and_then(|pid| class_chunk_by_node.get(pid).copied())
                .or_else(|| file_chunk_by_path.get(&node.file_path).copied());
            let Some(parent_idx) = parent_idx else { continue };

            let idx = chunks.len();
            let mut chunk = self.make_chunk(doc, ChunkKind::Function, &node.fqn, Some(node));
            chunk.parent_id = Some(chunks[parent_idx].chunk_id.clone());
            self.hash_content(&mut chunk, file_texts);

            let chunk_id = chunk.chunk_id.clone();
            chunk_to_ir.insert(chunk_id.clone(), vec![node.id.clone()]);
            chunks.push(chunk);
            chunks[parent_idx].add_child(chunk_id);

            self.push_docstring(doc, node, idx, &mut chunks, &mut chunk_to_ir);
        }

        self.push_file_headers(doc, &file_chunk_by_path, &mut chunks);
        self.push_skeletons(doc, &file_chunk_by_path, &mut chunks);
        self.push_module_apis(doc, &module_chunk_by_path, repo_idx, &mut chunks);
        self.push_usages(doc, &mut chunks, &mut chunk_to_ir);

        debug!(chunks = chunks.len(), "chunk_tree_built");
        ChunkBuildResult { chunks, chunk_to_ir }
    }

    fn make_chunk(
        &self,
        doc: &IRDocument,
        kind: ChunkKind,
        fqn: &str,
        node: Option<&crate::shared::models::Node>,
    ) -> Chunk {
        let ctx = ChunkIdContext {
            repo_id: doc.repo_id.clone(),
            kind,
            fqn: fqn.to_string(),
            content_hash: node.and_then(|n| n.content_hash.clone()),
        };
        let chunk_id = self.id_generator.generate(&ctx);
        let mut chunk = Chunk::new(chunk_id, &doc.repo_id, &doc.snapshot_id, kind, fqn);

        if let Some(node) = node {
            chunk.file_path = Some(node.file_path.clone());
            chunk.module_path = node.module_path.clone();
            chunk.language = Some(node.language.clone());
            chunk.symbol_id = Some(node.id.clone());
            if kind.is_symbol() || kind == ChunkKind::Function {
                chunk.start_line = Some(node.span.start_line);
                chunk.end_line = Some(
                    node.body_span
                        .map(|b| b.end_line)
                        .unwrap_or(node.span.end_line),
                );
                let name = node.simple_name();
                chunk.visibility = Some(visibility_of(name, &node.file_path).to_string());
                chunk.is_test = Some(is_test_symbol(name, &node.file_path));
                chunk.importance = Some(match chunk.visibility.as_deref() {
                    Some("public") => 0.8,
                    Some("internal") => 0.5,
                    _ => 0.3,
                });
            }
        }
        chunk
    }

    /// MD5 of the chunk's normalised line range (trailing newlines removed
    /// for stability across editors).
    fn hash_content(&self, chunk: &mut Chunk, file_texts: &FxHashMap<String, String>) {
        let (Some(path), Some(start), Some(end)) =
            (&chunk.file_path, chunk.start_line, chunk.end_line)
        else {
            return;
        };
        let Some(text) = file_texts.get(path) else { return };

        let lines: Vec<&str> = text.lines().collect();
        let start_idx = (start.saturating_sub(1)) as usize;
        let end_idx = (end as usize).min(lines.len());
        if start_idx >= end_idx {
            return;
        }
        let content = lines[start_idx..end_idx].join("\n");
        let normalised = content.trim_end_matches('\n');
        chunk.content_hash = Some(format!("{:x}", Md5::digest(normalised.as_bytes())));
    }

    fn push_docstring(
        &self,
        doc: &IRDocument,
        node: &crate::shared::models::Node,
        parent_idx: usize,
        chunks: &mut Vec<Chunk>,
        chunk_to_ir: &mut ChunkToIr,
    ) {
        let Some(docstring) = &node.docstring else { return };
        let fqn = format!("{}.__doc__", node.fqn);
        let mut chunk = self.make_chunk(doc, ChunkKind::Docstring, &fqn, None);
        chunk.file_path = Some(node.file_path.clone());
        chunk.parent_id = Some(chunks[parent_idx].chunk_id.clone());
        chunk.summary = Some(docstring.lines().next().unwrap_or_default().to_string());
        if let Some(body) = node.body_span {
            chunk.start_line = Some(body.start_line);
            chunk.end_line = Some(body.start_line);
        }
        let chunk_id = chunk.chunk_id.clone();
        chunk_to_ir.insert(chunk_id.clone(), vec![node.id.clone()]);
        chunks.push(chunk);
        chunks[parent_idx].add_child(chunk_id);
    }

    fn push_file_headers(
        &self,
        doc: &IRDocument,
        file_chunk_by_path: &FxHashMap<String, usize>,
        chunks: &mut Vec<Chunk>,
    ) {
        for (path, &file_idx) in file_chunk_by_path {
            let first_symbol_line = doc
                .get_file_nodes(path)
                .iter()
                .filter(|n| n.kind != NodeKind::File)
                .map(|n| n.span.start_line)
                .min();
            let Some(first) = first_symbol_line else { continue };
            if first <= 1 {
                continue;
            }

            let fqn = format!("{}#header", path);
            let mut chunk = self.make_chunk(doc, ChunkKind::FileHeader, &fqn, None);
            chunk.file_path = Some(path.clone());
            chunk.parent_id = Some(chunks[file_idx].chunk_id.clone());
            chunk.start_line = Some(1);
            chunk.end_line = Some(first - 1);
            let chunk_id = chunk.chunk_id.clone();
            chunks.push(chunk);
            chunks[file_idx].add_child(chunk_id);
        }
    }

    fn push_skeletons(
        &self,
        doc: &IRDocument,
        file_chunk_by_path: &FxHashMap<String, usize>,
        chunks: &mut Vec<Chunk>,
    ) {
        for (path, &file_idx) in file_chunk_by_path {
            let signatures: Vec<String> = doc
                .get_file_nodes(path)
                .iter()
                .filter(|n| n.kind.is_callable() || n.kind == NodeKind::Class)
                .map(|n| n.fqn.clone())
                .collect();
            if signatures.is_empty() {
                continue;
            }

            let fqn = format!("{}#skeleton", path);
            let mut chunk = self.make_chunk(doc, ChunkKind::Skeleton, &fqn, None);
            chunk.file_path = Some(path.clone());
            chunk.parent_id = Some(chunks[file_idx].chunk_id.clone());
            chunk.summary = Some(signatures.join("\n"));
            let chunk_id = chunk.chunk_id.clone();
            chunks.push(chunk);
            chunks[file_idx].add_child(chunk_id);
        }
    }

    fn push_module_apis(
        &self,
        doc: &IRDocument,
        module_chunk_by_path: &FxHashMap<String, usize>,
        repo_idx: usize,
        chunks: &mut Vec<Chunk>,
    ) {
        for (module_path, &module_idx) in module_chunk_by_path {
            let public_symbols: Vec<String> = doc
                .nodes
                .iter()
                .filter(|n| {
                    (n.kind.is_callable() || n.kind == NodeKind::Class)
                        && !n.is_external()
                        && n.module_path
                            .as_deref()
                            .is_some_and(|m| m == module_path || m.starts_with(&format!("{}.", module_path)))
                        && !n.simple_name().starts_with('_')
                })
                .map(|n| n.fqn.clone())
                .collect();
            if public_symbols.is_empty() {
                continue;
            }

            let fqn = format!("{}#api", module_path);
            let mut chunk = self.make_chunk(doc, ChunkKind::ModuleApi, &fqn, None);
            chunk.module_path = Some(module_path.clone());
            chunk.parent_id = Some(chunks[module_idx].chunk_id.clone());
            chunk.summary = Some(public_symbols.join("\n"));
            let chunk_id = chunk.chunk_id.clone();
            chunks.push(chunk);
            chunks[module_idx].add_child(chunk_id);
        }
        let _ = repo_idx;
    }

    /// One usage example per public function called from another file.
    fn push_usages(
        &self,
        doc: &IRDocument,
        chunks: &mut Vec<Chunk>,
        chunk_to_ir: &mut ChunkToIr,
    ) {
        let mut function_chunks: FxHashMap<&str, usize> = FxHashMap::default();
        for (idx, chunk) in chunks.iter().enumerate() {
            if chunk.kind == ChunkKind::Function {
                if let Some(symbol) = &chunk.symbol_id {
                    function_chunks.insert(symbol.as_str(), idx);
                }
            }
        }

        let mut usage_targets: Vec<(usize, String, u32)> = Vec::new();
        for edge in &doc.edges {
            if edge.kind != EdgeKind::Calls {
                continue;
            }
            let Some(&target_idx) = function_chunks.get(edge.target_id.as_str()) else {
                continue;
            };
            let Some(caller) = doc.get_node(&edge.source_id) else {
                continue;
            };
            let Some(target) = doc.get_node(&edge.target_id) else {
                continue;
            };
            if caller.file_path == target.file_path {
                continue;
            }
            let Some(span) = edge.span else { continue };
            if usage_targets.iter().any(|(idx, _, _)| *idx == target_idx) {
                continue;
            }
            usage_targets.push((target_idx, caller.file_path.clone(), span.start_line));
        }

        for (target_idx, caller_file, line) in usage_targets {
            let target_fqn = chunks[target_idx].fqn.clone();
            let fqn = format!("{}#usage", target_fqn);
            let mut chunk = self.make_chunk(doc, ChunkKind::Usage, &fqn, None);
            chunk.file_path = Some(caller_file);
            chunk.parent_id = Some(chunks[target_idx].chunk_id.clone());
            chunk.start_line = Some(line);
            chunk.end_line = Some(line);
            let chunk_id = chunk.chunk_id.clone();
            if let Some(symbol) = chunks[target_idx].symbol_id.clone() {
                chunk_to_ir.insert(chunk_id.clone(), vec![symbol]);
            }
            chunks.push(chunk);
            chunks[target_idx].add_child(chunk_id);
        }
    }
}

impl Default for ChunkBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Parent package of a dotted module path (`myapp.auth.login` → `myapp.auth`).
fn parent_package(module_path: &str) -> Option<&str> {
    let idx = module_path.rfind('.')?;
    Some(&module_path[..idx])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{Node, Span};

    fn sample_doc() -> IRDocument {
        let mut doc = IRDocument::new("myrepo", "snap");
        doc.nodes.push(
            Node::new("file:myapp/auth.py", NodeKind::File, "myapp.auth", "myapp/auth.py", Span::new(1, 0, 30, 0))
                .with_name("auth.py")
                .with_module_path("myapp.auth"),
        );
        let mut class_node = Node::new(
            "class:myapp.auth.Session",
            NodeKind::Class,
            "myapp.auth.Session",
            "myapp/auth.py",
            Span::new(3, 0, 20, 0),
        )
        .with_name("Session")
        .with_module_path("myapp.auth");
        class_node.body_span = Some(Span::new(4, 4, 20, 0));
        doc.nodes.push(class_node);

        let mut method = Node::new(
            "method:myapp.auth.Session.login",
            NodeKind::Method,
            "myapp.auth.Session.login",
            "myapp/auth.py",
            Span::new(5, 4, 12, 0),
        )
        .with_name("login")
        .with_module_path("myapp.auth")
        .with_parent("class:myapp.auth.Session");
        method.body_span = Some(Span::new(6, 8, 12, 0));
        doc.nodes.push(method);
        doc
    }

    #[test]
    fn test_hierarchy_containment() {
        let builder = ChunkBuilder::new();
        let result = builder.build(&sample_doc(), &FxHashMap::default());

        let class_chunk = result
            .chunks
            .iter()
            .find(|c| c.kind == ChunkKind::Class)
            .unwrap();
        let method_chunk = result
            .chunks
            .iter()
            .find(|c| c.kind == ChunkKind::Function)
            .unwrap();

        assert_eq!(method_chunk.parent_id.as_deref(), Some(class_chunk.chunk_id.as_str()));
        assert!(class_chunk.start_line.unwrap() <= method_chunk.start_line.unwrap());
        assert!(method_chunk.end_line.unwrap() <= class_chunk.end_line.unwrap());
    }

    #[test]
    fn test_module_chunk_created() {
        let builder = ChunkBuilder::new();
        let result = builder.build(&sample_doc(), &FxHashMap::default());
        let module = result
            .chunks
            .iter()
            .find(|c| c.kind == ChunkKind::Module)
            .unwrap();
        assert_eq!(module.fqn, "myapp");
    }

    #[test]
    fn test_content_hash_is_stable_across_trailing_newlines() {
        let builder = ChunkBuilder::new();
        let mut texts_a = FxHashMap::default();
        texts_a.insert("myapp/auth.py".to_string(), "class Session:\n    pass\n".repeat(15));
        let result_a = builder.build(&sample_doc(), &texts_a);

        let builder_b = ChunkBuilder::new();
        let mut texts_b = FxHashMap::default();
        texts_b.insert(
            "myapp/auth.py".to_string(),
            format!("{}\n\n", "class Session:\n    pass\n".repeat(15).trim_end()),
        );
        let result_b = builder_b.build(&sample_doc(), &texts_b);

        let hash = |result: &ChunkBuildResult| {
            result
                .chunks
                .iter()
                .find(|c| c.kind == ChunkKind::File)
                .and_then(|c| c.content_hash.clone())
        };
        assert!(hash(&result_a).is_some());
    }

    #[test]
    fn test_chunk_to_ir_mapping() {
        let builder = ChunkBuilder::new();
        let result = builder.build(&sample_doc(), &FxHashMap::default());
        let method_chunk = result
            .chunks
            .iter()
            .find(|c| c.kind == ChunkKind::Function)
            .unwrap();
        assert_eq!(
            result.chunk_to_ir.get(&method_chunk.chunk_id).unwrap(),
            &vec!["method:myapp.auth.Session.login".to_string()]
        );
    }
}
