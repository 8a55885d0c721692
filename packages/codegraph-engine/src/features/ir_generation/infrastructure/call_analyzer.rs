//! Callee resolution
//!
//! Resolution order: (a) current scope symbol, (b) enclosing class method
//! via `self`/`cls`, (c) imported alias → fully qualified external name,
//! (d) external stub for the remaining names. Unknown callees never fail;
//! they become external function nodes.

use rustc_hash::FxHashMap;

use crate::shared::utils::scope_stack::ScopeStack;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalleeResolution {
    /// Resolved to a node declared in an enclosing scope.
    Scope(String),
    /// Resolved to a method of the enclosing class.
    ClassMethod(String),
    /// Alias resolved to a fully qualified external name.
    ImportedExternal(String),
    /// Unresolved; stub under the given external name.
    External(String),
}

/// Resolve a dotted callee name against the current scopes.
///
/// `class_methods` maps class FQN → (method name → method node id).
pub fn resolve_callee(
    callee: &str,
    scope: &ScopeStack,
    class_methods: &FxHashMap<String, FxHashMap<String, String>>,
    enclosing_class_fqn: Option<&str>,
) -> CalleeResolution {
    // (a) plain name declared in scope
    if !callee.contains('.') {
        if let Some(node_id) = scope.resolve_symbol(callee) {
            return CalleeResolution::Scope(node_id.to_string());
        }
    }

    let mut segments = callee.splitn(2, '.');
    let head = segments.next().unwrap_or(callee);
    let rest = segments.next();

    // (b) self.method / cls.method against the enclosing class
    if matches!(head, "self" | "cls") {
        if let (Some(class_fqn), Some(method)) = (enclosing_class_fqn, rest) {
            let method_simple = method.rsplit('.').next().unwrap_or(method);
            if let Some(methods) = class_methods.get(class_fqn) {
                if let Some(node_id) = methods.get(method_simple) {
                    return CalleeResolution::ClassMethod(node_id.clone());
                }
            }
        }
        return CalleeResolution::External(callee.to_string());
    }

    // (c) import alias on the leading segment
    if let Some(imported) = scope.resolve_import(head) {
        let resolved = match rest {
            Some(rest) => format!("{}.{}", imported, rest),
            None => imported.to_string(),
        };
        return CalleeResolution::ImportedExternal(resolved);
    }

    // (d) unresolved name, external stub
    CalleeResolution::External(callee.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::utils::scope_stack::ScopeKind;

    fn scope_with(module: &str) -> ScopeStack {
        let mut scope = ScopeStack::new();
        scope.push(ScopeKind::Module, module);
        scope
    }

    #[test]
    fn test_scope_symbol_wins() {
        let mut scope = scope_with("m");
        scope.register_symbol("helper", "function:m.helper");
        let result = resolve_callee("helper", &scope, &FxHashMap::default(), None);
        assert_eq!(result, CalleeResolution::Scope("function:m.helper".into()));
    }

    #[test]
    fn test_self_method_resolution() {
        let scope = scope_with("m");
        let mut methods = FxHashMap::default();
        let mut class_map = FxHashMap::default();
        methods.insert("run".to_string(), "method:m.C.run".to_string());
        class_map.insert("m.C".to_string(), methods);

        let result = resolve_callee("self.run", &scope, &class_map, Some("m.C"));
        assert_eq!(result, CalleeResolution::ClassMethod("method:m.C.run".into()));
    }

    #[test]
    fn test_import_alias_expansion() {
        let mut scope = scope_with("m");
        scope.register_import("np", "numpy");
        let result = resolve_callee("np.array", &scope, &FxHashMap::default(), None);
        assert_eq!(result, CalleeResolution::ImportedExternal("numpy.array".into()));
    }

    #[test]
    fn test_unknown_falls_back_to_external() {
        let scope = scope_with("m");
        let result = resolve_callee("conn.execute", &scope, &FxHashMap::default(), None);
        assert_eq!(result, CalleeResolution::External("conn.execute".into()));
    }
}
