//! Scope stack for FQN management and name resolution
//!
//! Tracks nested scopes during the AST walk. Each frame carries its symbol
//! table and import alias table so callee resolution can walk outward.

use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Module,
    Class,
    Function,
    Lambda,
}

#[derive(Debug, Clone)]
pub struct ScopeFrame {
    pub kind: ScopeKind,
    pub name: String,
    pub node_id: Option<String>,
    /// Locally declared symbols: simple name → node id.
    symbols: FxHashMap<String, String>,
    /// Import aliases visible in this scope: alias → imported FQN.
    imports: FxHashMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct ScopeStack {
    frames: Vec<ScopeFrame>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: ScopeKind, name: impl Into<String>) {
        self.frames.push(ScopeFrame {
            kind,
            name: name.into(),
            node_id: None,
            symbols: FxHashMap::default(),
            imports: FxHashMap::default(),
        });
    }

    pub fn pop(&mut self) -> Option<ScopeFrame> {
        self.frames.pop()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// FQN of the current scope.
    pub fn fqn(&self) -> String {
        self.frames
            .iter()
            .map(|f| f.name.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }

    /// FQN of a child symbol in the current scope.
    pub fn fqn_with(&self, name: &str) -> String {
        if self.frames.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.fqn(), name)
        }
    }

    pub fn current(&self) -> Option<&ScopeFrame> {
        self.frames.last()
    }

    pub fn set_current_node_id(&mut self, node_id: impl Into<String>) {
        if let Some(frame) = self.frames.last_mut() {
            frame.node_id = Some(node_id.into());
        }
    }

    /// Node id of the nearest enclosing scope that has one.
    pub fn current_parent_id(&self) -> Option<String> {
        self.frames.iter().rev().find_map(|f| f.node_id.clone())
    }

    /// Nearest enclosing class frame, if any.
    pub fn enclosing_class(&self) -> Option<&ScopeFrame> {
        self.frames.iter().rev().find(|f| f.kind == ScopeKind::Class)
    }

    /// FQN of the nearest enclosing class: the frame names joined up to and
    /// including the innermost class frame.
    pub fn enclosing_class_fqn(&self) -> Option<String> {
        let last_class = self
            .frames
            .iter()
            .rposition(|f| f.kind == ScopeKind::Class)?;
        Some(
            self.frames[..=last_class]
                .iter()
                .map(|f| f.name.as_str())
                .collect::<Vec<_>>()
                .join("."),
        )
    }

    pub fn register_symbol(&mut self, name: impl Into<String>, node_id: impl Into<String>) {
        if let Some(frame) = self.frames.last_mut() {
            frame.symbols.insert(name.into(), node_id.into());
        }
    }

    pub fn register_import(&mut self, alias: impl Into<String>, fqn: impl Into<String>) {
        if let Some(frame) = self.frames.last_mut() {
            frame.imports.insert(alias.into(), fqn.into());
        }
    }

    /// Resolve a simple name against symbol tables, innermost scope first.
    pub fn resolve_symbol(&self, name: &str) -> Option<&str> {
        self.frames
            .iter()
            .rev()
            .find_map(|f| f.symbols.get(name).map(String::as_str))
    }

    /// Resolve an import alias, innermost scope first.
    pub fn resolve_import(&self, alias: &str) -> Option<&str> {
        self.frames
            .iter()
            .rev()
            .find_map(|f| f.imports.get(alias).map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fqn_building() {
        let mut stack = ScopeStack::new();
        stack.push(ScopeKind::Module, "myapp.main");
        stack.push(ScopeKind::Class, "Calculator");
        assert_eq!(stack.fqn_with("add"), "myapp.main.Calculator.add");
        stack.pop();
        assert_eq!(stack.fqn(), "myapp.main");
    }

    #[test]
    fn test_symbol_resolution_walks_outward() {
        let mut stack = ScopeStack::new();
        stack.push(ScopeKind::Module, "m");
        stack.register_symbol("helper", "function:m.helper");
        stack.push(ScopeKind::Function, "f");

        assert_eq!(stack.resolve_symbol("helper"), Some("function:m.helper"));
        assert_eq!(stack.resolve_symbol("missing"), None);
    }

    #[test]
    fn test_import_alias_resolution() {
        let mut stack = ScopeStack::new();
        stack.push(ScopeKind::Module, "m");
        stack.register_import("np", "numpy");
        assert_eq!(stack.resolve_import("np"), Some("numpy"));
    }

    #[test]
    fn test_enclosing_class() {
        let mut stack = ScopeStack::new();
        stack.push(ScopeKind::Module, "m");
        stack.push(ScopeKind::Class, "C");
        stack.push(ScopeKind::Function, "method");
        assert_eq!(stack.enclosing_class().map(|f| f.name.as_str()), Some("C"));
    }
}
