//! IR generation for a single source file
//!
//! Consumes a parsed AST (or invokes a registered parser) and produces an
//! `IRDocument` fragment whose node and edge ids are stable across
//! snapshots for unchanged symbols. Parsing errors abort the file; other
//! files continue. Unknown callees become external function stubs.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde_json::Value;
use tracing::debug;

use crate::errors::{EngineError, Result};
use crate::features::ir_generation::domain::{BuildMode, IRDocument};
use crate::features::parsing::domain::AstNode;
use crate::features::parsing::ports::{ParserRegistry, SourceFile};
use crate::shared::models::{Edge, EdgeKind, Node, NodeKind, Span};
use crate::shared::utils::scope_stack::{ScopeKind, ScopeStack};
use crate::shared::utils::{id_generator, IdGenerator};

use super::call_analyzer::{resolve_callee, CalleeResolution};
use super::function_analyzer::{CallSite, FunctionAnalysis, FunctionAnalyzer};
use super::import_analyzer::process_import;
use super::module_path::module_path_from_file;
use super::occurrence_generator::generate_occurrences;
use super::override_analyzer::derive_override_edges;

pub struct IrGenerator {
    repo_id: String,
    mode: BuildMode,
    parsers: Arc<ParserRegistry>,
}

impl IrGenerator {
    pub fn new(repo_id: impl Into<String>, mode: BuildMode) -> Self {
        Self {
            repo_id: repo_id.into(),
            mode,
            parsers: Arc::new(ParserRegistry::new()),
        }
    }

    pub fn with_parsers(mut self, parsers: Arc<ParserRegistry>) -> Self {
        self.parsers = parsers;
        self
    }

    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    /// Generate the IR fragment for one file.
    pub fn generate(&self, file: &SourceFile, snapshot_id: &str) -> Result<IRDocument> {
        let ast = match &file.ast {
            Some(ast) => ast.clone(),
            None => match self.parsers.get(&file.language) {
                Some(parser) => parser.parse(&file.text).map_err(|e| {
                    EngineError::parse(&file.path, e.to_string())
                })?,
                None => {
                    return Err(EngineError::UnsupportedLanguage {
                        language: file.language.clone(),
                    })
                }
            },
        };

        let module_path = module_path_from_file(&file.path);
        let walker = FileWalker::new(
            &self.repo_id,
            &file.path,
            &file.language,
            &module_path,
            self.mode,
            snapshot_id,
        );
        let mut doc = walker.walk(&ast)?;

        let override_edges = derive_override_edges(&doc);
        doc.edges.extend(override_edges);
        doc.invalidate_indexes();
        doc.occurrences = generate_occurrences(&doc);

        debug!(
            file = file.path,
            nodes = doc.nodes.len(),
            edges = doc.edges.len(),
            "ir_fragment_generated"
        );
        Ok(doc)
    }
}

struct FileWalker<'a> {
    file_path: &'a str,
    language: &'a str,
    module_path: &'a str,
    mode: BuildMode,
    scope: ScopeStack,
    doc: IRDocument,
    file_node_id: String,
    /// class simple name → class node id
    known_classes: FxHashMap<String, String>,
    /// class FQN → method name → method node id
    class_methods: FxHashMap<String, FxHashMap<String, String>>,
    /// external stub id → already created
    externals: FxHashMap<String, ()>,
}

impl<'a> FileWalker<'a> {
    fn new(
        repo_id: &'a str,
        file_path: &'a str,
        language: &'a str,
        module_path: &'a str,
        mode: BuildMode,
        snapshot_id: &str,
    ) -> Self {
        Self {
            file_path,
            language,
            module_path,
            mode,
            scope: ScopeStack::new(),
            doc: IRDocument::new(repo_id, snapshot_id),
            file_node_id: id_generator::file_id(file_path),
            known_classes: FxHashMap::default(),
            class_methods: FxHashMap::default(),
            externals: FxHashMap::default(),
        }
    }

    fn walk(mut self, ast: &AstNode) -> Result<IRDocument> {
        let body: &[AstNode] = match ast {
            AstNode::Module { body, .. } => body,
            other => std::slice::from_ref(other),
        };

        let file_name = self
            .file_path
            .rsplit('/')
            .next()
            .unwrap_or(self.file_path)
            .to_string();
        let file_node = Node::new(
            self.file_node_id.clone(),
            NodeKind::File,
            if self.module_path.is_empty() {
                self.file_path
            } else {
                self.module_path
            },
            self.file_path,
            ast.span(),
        )
        .with_language(self.language)
        .with_name(file_name)
        .with_module_path(self.module_path);
        self.doc.nodes.push(file_node);

        self.scope.push(ScopeKind::Module, self.module_path);
        self.scope.set_current_node_id(self.file_node_id.clone());

        self.pre_register_defs(body);

        let mut module_stmts: Vec<AstNode> = Vec::new();
        for stmt in body {
            match stmt {
                AstNode::Import { .. } | AstNode::ImportFrom { .. } => self.handle_import(stmt),
                AstNode::ClassDef { .. } => self.handle_class(stmt),
                AstNode::FunctionDef { .. } => self.handle_function(stmt, false),
                other => module_stmts.push(other.clone()),
            }
        }

        // module-level statements run through the same semantic analysis,
        // scoped to the module itself
        if !module_stmts.is_empty() {
            self.handle_module_statements(&module_stmts);
        }

        self.scope.pop();
        Ok(self.doc)
    }

    /// Register top-level definitions before walking so forward references
    /// resolve.
    fn pre_register_defs(&mut self, body: &[AstNode]) {
        for stmt in body {
            match stmt {
                AstNode::FunctionDef { name, .. } => {
                    let fqn = self.scope.fqn_with(name);
                    let id = id_generator::node_id(NodeKind::Function, &fqn);
                    self.scope.register_symbol(name.clone(), id);
                }
                AstNode::ClassDef { name, .. } => {
                    let fqn = self.scope.fqn_with(name);
                    let id = id_generator::node_id(NodeKind::Class, &fqn);
                    self.scope.register_symbol(name.clone(), id.clone());
                    self.known_classes.insert(name.clone(), id);
                }
                _ => {}
            }
        }
    }

    fn add_edge(&mut self, kind: EdgeKind, source: &str, target: &str, span: Option<Span>) {
        let occurrence = IdGenerator::global().next_edge_occurrence(kind, source, target);
        let mut edge = Edge::new(kind, source, target, occurrence);
        edge.span = span;
        self.doc.edges.push(edge);
    }

    fn handle_import(&mut self, stmt: &AstNode) {
        let parent_id = self.scope.current_parent_id().unwrap_or_else(|| {
            self.file_node_id.clone()
        });
        let records = process_import(
            stmt,
            self.file_path,
            self.language,
            self.module_path,
            &parent_id,
        );
        for record in records {
            let span = record.node.span;
            let node_id = record.node.id.clone();
            self.doc.nodes.push(record.node);
            self.add_edge(EdgeKind::Contains, &parent_id, &node_id, Some(span));
            self.add_edge(EdgeKind::Imports, &parent_id, &node_id, Some(span));
            self.scope.register_import(record.alias, record.imported_fqn);
        }
    }

    fn handle_class(&mut self, stmt: &AstNode) {
        let AstNode::ClassDef {
            name,
            bases,
            body,
            docstring,
            span,
            body_span,
        } = stmt
        else {
            return;
        };

        let fqn = self.scope.fqn_with(name);
        let node_id = id_generator::node_id(NodeKind::Class, &fqn);
        let parent_id = self.scope.current_parent_id();

        let mut node = Node::new(&node_id, NodeKind::Class, &fqn, self.file_path, *span)
            .with_language(self.language)
            .with_name(name.clone())
            .with_module_path(self.module_path);
        node.parent_id = parent_id.clone();
        node.body_span = Some(*body_span);
        node.docstring = docstring.clone();
        node.base_classes = if bases.is_empty() {
            None
        } else {
            Some(bases.clone())
        };
        self.doc.nodes.push(node);
        if let Some(parent) = parent_id.clone() {
            self.add_edge(EdgeKind::Contains, &parent, &node_id, Some(*span));
        }

        for base in bases {
            let target = match self.scope.resolve_symbol(base) {
                Some(id) => id.to_string(),
                None => self.external_stub(NodeKind::Class, base),
            };
            self.add_edge(EdgeKind::Inherits, &node_id, &target, Some(*span));
        }

        self.known_classes.insert(name.clone(), node_id.clone());
        self.scope.push(ScopeKind::Class, name.clone());
        self.scope.set_current_node_id(node_id.clone());

        // pre-register methods for self.method resolution
        let class_fqn = self.scope.fqn();
        for member in body {
            if let AstNode::FunctionDef { name: method, .. } = member {
                let method_fqn = self.scope.fqn_with(method);
                let method_id = id_generator::node_id(NodeKind::Method, &method_fqn);
                self.class_methods
                    .entry(class_fqn.clone())
                    .or_default()
                    .insert(method.clone(), method_id);
            }
        }

        for member in body {
            match member {
                AstNode::FunctionDef { .. } => self.handle_function(member, true),
                AstNode::Assign {
                    target,
                    span,
                    annotation,
                    ..
                } => {
                    let field_fqn = self.scope.fqn_with(target);
                    let field_id = id_generator::node_id(NodeKind::Field, &field_fqn);
                    let mut field =
                        Node::new(&field_id, NodeKind::Field, &field_fqn, self.file_path, *span)
                            .with_language(self.language)
                            .with_name(target.clone())
                            .with_module_path(self.module_path)
                            .with_parent(node_id.clone());
                    field.type_annotation = annotation.clone();
                    self.doc.nodes.push(field);
                    self.add_edge(EdgeKind::Contains, &node_id, &field_id, Some(*span));
                }
                _ => {}
            }
        }

        self.scope.pop();
    }

    fn handle_function(&mut self, stmt: &AstNode, is_method: bool) {
        let AstNode::FunctionDef {
            name,
            params,
            body,
            docstring,
            return_annotation,
            is_async,
            span,
            body_span,
        } = stmt
        else {
            return;
        };

        let fqn = self.scope.fqn_with(name);
        let kind = if is_method {
            NodeKind::Method
        } else {
            NodeKind::Function
        };
        let node_id = id_generator::node_id(kind, &fqn);
        let parent_id = self.scope.current_parent_id();

        let mut node = Node::new(&node_id, kind, &fqn, self.file_path, *span)
            .with_language(self.language)
            .with_name(name.clone())
            .with_module_path(self.module_path);
        node.parent_id = parent_id.clone();
        node.body_span = Some(*body_span);
        node.docstring = docstring.clone();
        node.return_type = return_annotation.clone();
        node.content_hash = Some(id_generator::content_hash(
            &serde_json::to_string(body).unwrap_or_default(),
        ));
        if *is_async {
            node.attrs.insert("is_async".to_string(), Value::Bool(true));
        }

        // parameter nodes
        for param in params {
            let param_fqn = format!("{}.{}", fqn, param.name);
            let param_id = id_generator::node_id(NodeKind::Parameter, &param_fqn);
            let mut param_node = Node::new(
                &param_id,
                NodeKind::Parameter,
                &param_fqn,
                self.file_path,
                param.span,
            )
            .with_language(self.language)
            .with_name(param.name.clone())
            .with_parent(node_id.clone());
            param_node.type_annotation = param.annotation.clone();
            self.doc.nodes.push(param_node);
            self.add_edge(EdgeKind::Contains, &node_id, &param_id, Some(param.span));
        }

        self.scope.push(ScopeKind::Function, name.clone());
        self.scope.set_current_node_id(node_id.clone());
        // nested definitions resolve before the body is analyzed
        self.pre_register_defs(body);

        let analysis = FunctionAnalyzer::new(
            self.file_path,
            self.language,
            &fqn,
            &node_id,
            self.mode,
            &self.known_classes,
        )
        .analyze(params, body);

        node.control_flow = Some(analysis.summary);
        self.doc.nodes.push(node);
        if let Some(parent) = parent_id.clone() {
            self.add_edge(EdgeKind::Contains, &parent, &node_id, Some(*span));
        }

        self.merge_analysis(analysis, &node_id);

        // nested defs
        for nested in body {
            match nested {
                AstNode::FunctionDef { .. } => self.handle_function(nested, false),
                AstNode::ClassDef { .. } => self.handle_class(nested),
                _ => {}
            }
        }

        self.scope.pop();
    }

    fn handle_module_statements(&mut self, stmts: &[AstNode]) {
        // module-level variables become nodes and scope symbols
        for stmt in stmts {
            if let AstNode::Assign { target, span, annotation, .. } = stmt {
                let var_fqn = self.scope.fqn_with(target);
                let var_id = id_generator::node_id(NodeKind::Variable, &var_fqn);
                if self.doc.get_node(&var_id).is_none() {
                    let mut var_node = Node::new(
                        &var_id,
                        NodeKind::Variable,
                        &var_fqn,
                        self.file_path,
                        *span,
                    )
                    .with_language(self.language)
                    .with_name(target.clone())
                    .with_module_path(self.module_path)
                    .with_parent(self.file_node_id.clone());
                    var_node.type_annotation = annotation.clone();
                    self.doc.nodes.push(var_node);
                    self.doc.invalidate_indexes();
                    let file_id = self.file_node_id.clone();
                    self.add_edge(EdgeKind::Contains, &file_id, &var_id, Some(*span));
                    self.scope.register_symbol(target.clone(), var_id);
                }
            }
        }

        let analysis = FunctionAnalyzer::new(
            self.file_path,
            self.language,
            self.module_path,
            &self.file_node_id,
            self.mode,
            &self.known_classes,
        )
        .analyze(&[], stmts);

        let owner = self.file_node_id.clone();
        self.merge_analysis(analysis, &owner);
    }

    fn merge_analysis(&mut self, analysis: FunctionAnalysis, owner_node_id: &str) {
        for call in &analysis.calls {
            self.emit_call_edge(call, owner_node_id);
        }

        for lambda in analysis.lambda_nodes {
            let lambda_id = lambda.id.clone();
            let lambda_span = lambda.span;
            self.doc.nodes.push(lambda);
            self.add_edge(EdgeKind::Contains, owner_node_id, &lambda_id, Some(lambda_span));
        }

        self.doc.expressions.extend(analysis.expressions);
        self.doc.cfg_blocks.extend(analysis.cfg_blocks);
        self.doc.cfg_edges.extend(analysis.cfg_edges);
        if !analysis.variables.is_empty() || !analysis.dfg_edges.is_empty() {
            let dfg = self.doc.dfg.get_or_insert_with(Default::default);
            dfg.variables.extend(analysis.variables);
            dfg.edges.extend(analysis.dfg_edges);
        }
        self.doc
            .interprocedural_edges
            .extend(analysis.interproc_edges);
        self.doc.invalidate_indexes();
    }

    fn emit_call_edge(&mut self, call: &CallSite, caller_id: &str) {
        let enclosing_class = self.scope.enclosing_class_fqn();
        let resolution = resolve_callee(
            &call.callee,
            &self.scope,
            &self.class_methods,
            enclosing_class.as_deref(),
        );
        let target_id = match resolution {
            CalleeResolution::Scope(id) | CalleeResolution::ClassMethod(id) => id,
            CalleeResolution::ImportedExternal(fqn) => {
                self.external_stub(NodeKind::Function, &fqn)
            }
            CalleeResolution::External(name) => self.external_stub(NodeKind::Function, &name),
        };

        let occurrence =
            IdGenerator::global().next_edge_occurrence(EdgeKind::Calls, caller_id, &target_id);
        let mut edge = Edge::new(EdgeKind::Calls, caller_id, &target_id, occurrence);
        edge.span = Some(call.span);
        edge.attrs.insert(
            "callee_name".to_string(),
            Value::String(call.callee.clone()),
        );
        if let Some(expr_id) = &call.expr_id {
            edge.attrs
                .insert("call_expr_id".to_string(), Value::String(expr_id.clone()));
        }
        self.doc.edges.push(edge);
    }

    fn external_stub(&mut self, kind: NodeKind, name: &str) -> String {
        let stub_id = match kind {
            NodeKind::Class => format!("class:external.{}", name),
            _ => id_generator::external_function_id(name),
        };
        if self.externals.insert(stub_id.clone(), ()).is_none() {
            let simple = name.rsplit('.').next().unwrap_or(name).to_string();
            let node = Node::new(
                &stub_id,
                kind,
                format!("external.{}", name),
                "",
                Span::zero(),
            )
            .with_language(self.language)
            .with_name(simple)
            .with_attr("is_external", Value::Bool(true))
            .with_attr("external_name", Value::String(name.to_string()));
            self.doc.nodes.push(node);
            self.doc.invalidate_indexes();
        }
        stub_id
    }
}
