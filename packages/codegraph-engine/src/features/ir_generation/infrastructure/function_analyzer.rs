//! Per-function semantic analysis
//!
//! One coordinated pass over a function body drives the expression builder,
//! the CFG builder, and the DFG builder, and collects call sites plus the
//! control-flow summary. The caller merges the returned layers into the
//! file fragment.

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::features::data_flow::infrastructure::DfgBuilder;
use crate::features::expression_builder::infrastructure::ExpressionBuilder;
use crate::features::flow_graph::infrastructure::CfgBuilder;
use crate::features::ir_generation::domain::BuildMode;
use crate::features::parsing::domain::{AstNode, Param};
use crate::shared::models::{
    CFGBlock, CFGBlockKind, CFGEdge, CFGEdgeKind, ControlFlowSummary, DataflowEdge, ExprKind,
    Expression, InterproceduralEdge, LiteralKind, Node, NodeKind, Span, VariableEntity,
};
use crate::shared::utils::id_generator;

/// A call discovered in a function body, before callee resolution.
#[derive(Debug, Clone)]
pub struct CallSite {
    pub callee: String,
    pub receiver: Option<String>,
    pub span: Span,
    pub expr_id: Option<String>,
}

/// Semantic layers produced for one function.
#[derive(Debug, Default)]
pub struct FunctionAnalysis {
    pub expressions: Vec<Expression>,
    pub variables: Vec<VariableEntity>,
    pub dfg_edges: Vec<DataflowEdge>,
    pub interproc_edges: Vec<InterproceduralEdge>,
    pub cfg_blocks: Vec<CFGBlock>,
    pub cfg_edges: Vec<CFGEdge>,
    pub calls: Vec<CallSite>,
    pub summary: ControlFlowSummary,
    pub lambda_nodes: Vec<Node>,
}

pub struct FunctionAnalyzer<'a> {
    file_path: &'a str,
    language: &'a str,
    function_fqn: &'a str,
    function_node_id: &'a str,
    mode: BuildMode,
    /// Known class simple names → class node ids, for receiver narrowing.
    known_classes: &'a FxHashMap<String, String>,

    exprs: ExpressionBuilder,
    cfg: CfgBuilder,
    dfg: DfgBuilder,

    calls: Vec<CallSite>,
    var_types: FxHashMap<String, String>,
    nested_temps: FxHashMap<String, String>,
    /// names bound to lambdas in this function; calls through them get
    /// argument → parameter bindings
    lambda_names: rustc_hash::FxHashSet<String>,
    lambda_nodes_out: Vec<Node>,

    branch_count: u32,
    loop_count: u32,
    has_try: bool,
}

const COLLECTION_STORE_METHODS: &[&str] = &["append", "add", "insert", "push", "extend"];

impl<'a> FunctionAnalyzer<'a> {
    pub fn new(
        file_path: &'a str,
        language: &'a str,
        function_fqn: &'a str,
        function_node_id: &'a str,
        mode: BuildMode,
        known_classes: &'a FxHashMap<String, String>,
    ) -> Self {
        Self {
            file_path,
            language,
            function_fqn,
            function_node_id,
            mode,
            known_classes,
            exprs: ExpressionBuilder::new(file_path),
            cfg: CfgBuilder::new(function_fqn, function_node_id),
            dfg: DfgBuilder::new(file_path, function_fqn),
            calls: Vec::new(),
            var_types: FxHashMap::default(),
            nested_temps: FxHashMap::default(),
            lambda_names: rustc_hash::FxHashSet::default(),
            lambda_nodes_out: Vec::new(),
            branch_count: 0,
            loop_count: 0,
            has_try: false,
        }
    }

    pub fn analyze(mut self, params: &[Param], body: &[AstNode]) -> FunctionAnalysis {
        for param in params {
            self.dfg.declare_param(&param.name, param.span);
        }
        self.walk_stmts(body);

        let summary = ControlFlowSummary {
            cyclomatic_complexity: self.branch_count + self.loop_count + 1,
            has_loop: self.loop_count > 0,
            has_try: self.has_try,
            branch_count: self.branch_count,
        };

        let mode = self.mode;
        let mut analysis = FunctionAnalysis {
            calls: self.calls,
            summary,
            lambda_nodes: self.lambda_nodes_out,
            ..Default::default()
        };

        // Quick mode keeps structure and calls only.
        if !mode.skip_expressions() {
            analysis.expressions = self.exprs.finish();
        }
        if !mode.skip_cfg() {
            let (blocks, edges) = self.cfg.finish();
            analysis.cfg_blocks = blocks;
            analysis.cfg_edges = edges;
        }
        if !mode.skip_dfg() {
            let (variables, edges, interproc) = self.dfg.finish();
            analysis.variables = variables;
            analysis.dfg_edges = edges;
            analysis.interproc_edges = interproc;
        }
        analysis
    }

    fn walk_stmts(&mut self, stmts: &[AstNode]) {
        for stmt in stmts {
            self.walk_stmt(stmt);
        }
    }

    fn walk_stmt(&mut self, stmt: &AstNode) {
        match stmt {
            AstNode::Assign {
                target,
                value,
                span,
                ..
            } => self.handle_assign(target, value, *span),
            AstNode::ExprStmt { value, .. } => {
                self.handle_expr_stmt(value);
            }
            AstNode::Return { value, .. } => {
                if let Some(v) = value {
                    let block = self.cfg.current_block_id().to_string();
                    if let Some(root) = self.build_value_in(v, &block) {
                        self.exprs.set_attr(&root, "in_return", Value::Bool(true));
                    }
                }
            }
            AstNode::If {
                test, body, orelse, ..
            } => self.handle_if(test, body, orelse),
            AstNode::While { test, body, .. } => self.handle_while(test, body),
            AstNode::For {
                target, iter, body, span,
            } => self.handle_for(target, iter, body, *span),
            AstNode::Try {
                body,
                handlers,
                finally,
                ..
            } => self.handle_try(body, handlers, finally),
            // nested definitions are walked by the file-level builder
            _ => {}
        }
    }

    // ============================================================
    // Statements
    // ============================================================

    fn handle_assign(&mut self, target: &str, value: &AstNode, span: Span) {
        if let AstNode::Lambda { params, body, span: lspan } = value {
            self.handle_lambda_assign(target, params, body, *lspan);
            return;
        }

        // capture sources before the new version shadows them (x = f(x))
        let read_ids: Vec<String> = read_names(value)
            .into_iter()
            .filter_map(|n| self.dfg.latest(&n).map(str::to_string))
            .collect();

        let block = self.cfg.current_block_id().to_string();
        let root = self.build_value_in(value, &block);
        let var_id = self.dfg.define(target, span);

        if let Some(root_id) = &root {
            self.exprs.set_defines(root_id, target, &var_id);
        }
        for src in read_ids {
            self.dfg.def_use(&src, &var_id);
        }

        // receiver-type narrowing: x = Child() records x: Child
        if let AstNode::Call { callee, .. } = value {
            if let Some(name) = callee.dotted_name() {
                let simple = name.rsplit('.').next().unwrap_or(&name);
                if self.known_classes.contains_key(simple) {
                    self.var_types.insert(target.to_string(), simple.to_string());
                }
            }
        }
    }

    fn handle_lambda_assign(&mut self, target: &str, params: &[Param], body: &AstNode, span: Span) {
        self.lambda_names.insert(target.to_string());
        let param_sig = params
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let node_id = id_generator::lambda_id(self.function_fqn, &param_sig, &[]);
        let lambda_fqn = node_id.trim_start_matches("lambda:").to_string();

        let mut node = Node::new(&node_id, NodeKind::Lambda, &lambda_fqn, self.file_path, span)
            .with_language(self.language)
            .with_name(target)
            .with_parent(self.function_node_id);
        node.content_hash = Some(id_generator::short_hash(&param_sig));
        node.attrs.insert(
            "param_sig".to_string(),
            Value::String(param_sig.clone()),
        );
        self.lambda_nodes_out.push(node);

        let block = self.cfg.current_block_id().to_string();
        let lambda_ast = AstNode::Lambda {
            params: params.to_vec(),
            body: Box::new(body.clone()),
            span,
        };
        let before = self.exprs.len();
        let root = self
            .exprs
            .build(&lambda_ast, self.function_fqn, Some(&block), None);

        let var_id = self.dfg.define(target, span);
        if let Some(root_id) = &root {
            self.exprs.set_defines(root_id, target, &var_id);
            self.exprs
                .set_attr(root_id, "lambda_fqn", Value::String(lambda_fqn.clone()));
        }

        for param in params {
            self.dfg.declare_lambda_param(&lambda_fqn, &param.name, param.span);
        }
        // lambda body expressions belong to the lambda's own scope
        self.exprs.build(body, &lambda_fqn, Some(&block), root.as_deref());
        self.post_process_new_exprs(before);
    }

    fn handle_expr_stmt(&mut self, value: &AstNode) {
        let block = self.cfg.current_block_id().to_string();
        let root = self.build_value_in(value, &block);

        // collection store: xs.append(arg) flows arg into xs[*]
        if let AstNode::Call { callee, args, .. } = value {
            if let AstNode::Attribute {
                value: base, attr, ..
            } = callee.as_ref()
            {
                if COLLECTION_STORE_METHODS.contains(&attr.as_str()) {
                    if let Some(container) = base
                        .dotted_name()
                        .and_then(|n| self.dfg.latest(&n).map(str::to_string))
                    {
                        for arg in args {
                            if let Some(src) = self.arg_source_var(arg, root.as_deref()) {
                                self.dfg.collection_store(&src, &container);
                            }
                        }
                    }
                }
            }
        }
    }

    fn handle_if(&mut self, test: &AstNode, body: &[AstNode], orelse: &[AstNode]) {
        self.branch_count += 1;

        let before = self.cfg.current_block_id().to_string();
        let (literal, cond_var) = condition_facts(test);
        let cond = self
            .cfg
            .fresh_condition(Some(test.span()), None, literal, cond_var);
        self.cfg.edge(&before, &cond, CFGEdgeKind::Sequential);
        if let Some(test_root) = self.build_value_in(test, &cond) {
            self.cfg.set_condition_expr(&cond, &test_root);
        }

        let then_block = self.cfg.fresh_block(CFGBlockKind::Block, None);
        self.cfg.edge(&cond, &then_block, CFGEdgeKind::TrueBranch);
        self.cfg.set_current(then_block);
        self.walk_stmts(body);
        let then_end = self.cfg.current_block_id().to_string();

        let join = if orelse.is_empty() {
            let join = self.cfg.fresh_block(CFGBlockKind::Block, None);
            self.cfg.edge(&cond, &join, CFGEdgeKind::FalseBranch);
            self.cfg.edge(&then_end, &join, CFGEdgeKind::Sequential);
            join
        } else {
            let else_block = self.cfg.fresh_block(CFGBlockKind::Block, None);
            self.cfg.edge(&cond, &else_block, CFGEdgeKind::FalseBranch);
            self.cfg.set_current(else_block);
            self.walk_stmts(orelse);
            let else_end = self.cfg.current_block_id().to_string();

            let join = self.cfg.fresh_block(CFGBlockKind::Block, None);
            self.cfg.edge(&then_end, &join, CFGEdgeKind::Sequential);
            self.cfg.edge(&else_end, &join, CFGEdgeKind::Sequential);
            join
        };
        self.cfg.set_current(join);
    }

    fn handle_while(&mut self, test: &AstNode, body: &[AstNode]) {
        self.loop_count += 1;

        let before = self.cfg.current_block_id().to_string();
        let header = self.cfg.fresh_block(CFGBlockKind::LoopHeader, Some(test.span()));
        self.cfg.edge(&before, &header, CFGEdgeKind::Sequential);
        self.build_value_in(test, &header);

        let body_block = self.cfg.fresh_block(CFGBlockKind::Block, None);
        self.cfg.edge(&header, &body_block, CFGEdgeKind::TrueBranch);
        self.cfg.set_current(body_block);
        self.walk_stmts(body);
        let body_end = self.cfg.current_block_id().to_string();
        self.cfg.edge(&body_end, &header, CFGEdgeKind::LoopBack);

        let exit = self.cfg.fresh_block(CFGBlockKind::Block, None);
        self.cfg.edge(&header, &exit, CFGEdgeKind::LoopExit);
        self.cfg.set_current(exit);
    }

    fn handle_for(&mut self, target: &str, iter: &AstNode, body: &[AstNode], span: Span) {
        self.loop_count += 1;

        let before = self.cfg.current_block_id().to_string();
        let header = self.cfg.fresh_block(CFGBlockKind::LoopHeader, Some(iter.span()));
        self.cfg.edge(&before, &header, CFGEdgeKind::Sequential);
        self.build_value_in(iter, &header);

        // iteration binds container elements to the loop variable
        let container = iter
            .dotted_name()
            .and_then(|n| self.dfg.latest(&n).map(str::to_string));
        let target_var = self.dfg.define(target, span);
        if let Some(container_id) = container {
            self.dfg.collection_load(&container_id, &target_var);
        }

        let body_block = self.cfg.fresh_block(CFGBlockKind::Block, None);
        self.cfg.edge(&header, &body_block, CFGEdgeKind::TrueBranch);
        self.cfg.set_current(body_block);
        self.walk_stmts(body);
        let body_end = self.cfg.current_block_id().to_string();
        self.cfg.edge(&body_end, &header, CFGEdgeKind::LoopBack);

        let exit = self.cfg.fresh_block(CFGBlockKind::Block, None);
        self.cfg.edge(&header, &exit, CFGEdgeKind::LoopExit);
        self.cfg.set_current(exit);
    }

    fn handle_try(
        &mut self,
        body: &[AstNode],
        handlers: &[crate::features::parsing::domain::ExceptHandler],
        finally: &[AstNode],
    ) {
        self.has_try = true;

        let before = self.cfg.current_block_id().to_string();
        let try_block = self.cfg.fresh_block(CFGBlockKind::Try, None);
        self.cfg.edge(&before, &try_block, CFGEdgeKind::Sequential);
        self.cfg.set_current(try_block.clone());
        self.walk_stmts(body);
        let try_end = self.cfg.current_block_id().to_string();

        let mut handler_ends = Vec::new();
        for handler in handlers {
            let catch = self.cfg.fresh_block(CFGBlockKind::Catch, Some(handler.span));
            self.cfg.edge(&try_block, &catch, CFGEdgeKind::Exception);
            self.cfg.set_current(catch);
            self.walk_stmts(&handler.body);
            handler_ends.push(self.cfg.current_block_id().to_string());
        }

        if finally.is_empty() {
            let join = self.cfg.fresh_block(CFGBlockKind::Block, None);
            self.cfg.edge(&try_end, &join, CFGEdgeKind::Sequential);
            for end in &handler_ends {
                self.cfg.edge(end, &join, CFGEdgeKind::Sequential);
            }
            self.cfg.set_current(join);
        } else {
            let fin = self.cfg.fresh_block(CFGBlockKind::Finally, None);
            self.cfg.edge(&try_end, &fin, CFGEdgeKind::Finally);
            for end in &handler_ends {
                self.cfg.edge(end, &fin, CFGEdgeKind::Finally);
            }
            self.cfg.set_current(fin);
            self.walk_stmts(finally);
        }
    }

    // ============================================================
    // Expression plumbing
    // ============================================================

    fn build_value_in(&mut self, value: &AstNode, block_id: &str) -> Option<String> {
        let before = self.exprs.len();
        let root = self
            .exprs
            .build(value, self.function_fqn, Some(block_id), None);
        self.post_process_new_exprs(before);
        root
    }

    /// Call bookkeeping over expressions added since `start`: call-site
    /// collection, receiver narrowing attrs, nested `<call>` temporaries,
    /// and argument → callee-parameter bindings.
    fn post_process_new_exprs(&mut self, start: usize) {
        struct NewCall {
            id: String,
            callee: String,
            args: Vec<String>,
            receiver: Option<String>,
            span: Span,
            nested: bool,
        }

        let new_calls: Vec<NewCall> = self.exprs.all()[start..]
            .iter()
            .filter_map(|e| match &e.kind {
                ExprKind::Call {
                    callee,
                    args,
                    receiver,
                } => Some(NewCall {
                    id: e.id.clone(),
                    callee: callee.clone(),
                    args: args.clone(),
                    receiver: receiver.clone(),
                    span: e.span,
                    nested: e.parent_expr_id.is_some(),
                }),
                _ => None,
            })
            .collect();

        for call in &new_calls {
            self.calls.push(CallSite {
                callee: call.callee.clone(),
                receiver: call.receiver.clone(),
                span: call.span,
                expr_id: Some(call.id.clone()),
            });

            if let Some(receiver) = &call.receiver {
                if let Some(class) = self.var_types.get(receiver) {
                    let class = class.clone();
                    self.exprs
                        .set_attr(&call.id, "receiver_class", Value::String(class));
                }
            }

            if call.nested {
                let temp = self.dfg.call_temp(call.span);
                self.nested_temps.insert(call.id.clone(), temp);
            }

            // argument → parameter bindings exist only where they are the
            // sole bridge (lambda callees); direct argument flow already
            // travels the expression tree
            if self.lambda_names.contains(&call.callee) {
                for (position, arg_name) in call.args.iter().enumerate() {
                    if arg_name.is_empty() {
                        continue;
                    }
                    if let Some(src) = self.dfg.latest(arg_name).map(str::to_string) {
                        self.dfg.param_bind(&src, &call.callee, position);
                    }
                }
            }
        }
    }

    fn arg_source_var(&self, arg: &AstNode, _root: Option<&str>) -> Option<String> {
        match arg {
            AstNode::Name { id, .. } => self.dfg.latest(id).map(str::to_string),
            AstNode::Call { .. } => {
                // nested call result lives in the <call> temp on that line
                let line = arg.span().start_line;
                self.nested_temps
                    .iter()
                    .find_map(|(expr_id, temp)| {
                        self.exprs
                            .get(expr_id)
                            .filter(|e| e.span.start_line == line)
                            .map(|_| temp.clone())
                    })
            }
            _ => None,
        }
    }

}

/// Variable names read anywhere in an expression subtree.
pub fn read_names(ast: &AstNode) -> Vec<String> {
    let mut names = Vec::new();
    collect_read_names(ast, &mut names);
    names
}

fn collect_read_names(ast: &AstNode, out: &mut Vec<String>) {
    match ast {
        AstNode::Name { id, .. } => out.push(id.clone()),
        AstNode::Attribute { value, .. } => {
            if let AstNode::Name { id, .. } = value.as_ref() {
                out.push(id.clone());
            }
        }
        AstNode::Subscript { value, index, .. } => {
            collect_read_names(value, out);
            collect_read_names(index, out);
        }
        AstNode::Call { callee, args, .. } => {
            if let AstNode::Attribute { value, .. } = callee.as_ref() {
                if let AstNode::Name { id, .. } = value.as_ref() {
                    out.push(id.clone());
                }
            }
            for arg in args {
                collect_read_names(arg, out);
            }
        }
        AstNode::BinOpExpr { left, right, .. } | AstNode::CompareExpr { left, right, .. } => {
            collect_read_names(left, out);
            collect_read_names(right, out);
        }
        AstNode::UnaryOpExpr { operand, .. } => collect_read_names(operand, out),
        AstNode::BoolOpExpr { values, .. } => {
            for value in values {
                collect_read_names(value, out);
            }
        }
        AstNode::CollectionExpr { items, .. } => {
            for item in items {
                collect_read_names(item, out);
            }
        }
        AstNode::Lambda { .. } => {}
        _ => {}
    }
}

/// Constant facts about a branch condition: literal truth value and the
/// bare variable name it reads, when either applies.
fn condition_facts(test: &AstNode) -> (Option<bool>, Option<String>) {
    match test {
        AstNode::LiteralExpr {
            kind: LiteralKind::Boolean,
            value,
            ..
        } => (Some(value.eq_ignore_ascii_case("true")), None),
        AstNode::Name { id, .. } => (None, Some(id.clone())),
        _ => (None, None),
    }
}
