//! SemanticIndex: name-based search
//!
//! Single-key maps for variables, functions, classes, and call sites, plus
//! bounded composite maps (name+type, name+scope, class+method) with LRU
//! eviction. Lookups take the lock for the id-list fetch only and release
//! it before dereferencing ids through the thread-safe NodeIndex.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::features::ir_generation::domain::IRDocument;
use crate::features::query_engine::domain::UnifiedNode;
use crate::shared::models::NodeKind;

use super::node_index::NodeIndex;
use super::pattern_cache::{glob_to_regex, PatternCache};

const COMPOSITE_CAPACITY: usize = 10_000;

struct Maps {
    vars_by_name: FxHashMap<String, Vec<String>>,
    funcs_by_name: FxHashMap<String, Vec<String>>,
    classes_by_name: FxHashMap<String, Vec<String>>,
    call_sites_by_name: FxHashMap<String, Vec<String>>,
    blocks_by_func: FxHashMap<String, Vec<String>>,
    vars_by_name_and_type: LruCache<(String, String), Vec<String>>,
    vars_by_name_and_scope: LruCache<(String, String), Vec<String>>,
    funcs_by_class_and_name: LruCache<(String, String), Vec<String>>,
}

pub struct SemanticIndex {
    node_index: Arc<NodeIndex>,
    maps: Mutex<Maps>,
    pattern_cache: &'static PatternCache,
}

impl SemanticIndex {
    pub fn build(doc: &IRDocument, node_index: Arc<NodeIndex>) -> Self {
        let composite_cap = NonZeroUsize::new(COMPOSITE_CAPACITY).unwrap();
        let mut maps = Maps {
            vars_by_name: FxHashMap::default(),
            funcs_by_name: FxHashMap::default(),
            classes_by_name: FxHashMap::default(),
            call_sites_by_name: FxHashMap::default(),
            blocks_by_func: FxHashMap::default(),
            vars_by_name_and_type: LruCache::new(composite_cap),
            vars_by_name_and_scope: LruCache::new(composite_cap),
            funcs_by_class_and_name: LruCache::new(composite_cap),
        };

        // functions, methods, classes
        for node in &doc.nodes {
            match node.kind {
                NodeKind::Function | NodeKind::Method | NodeKind::Lambda => {
                    if let Some(name) = &node.name {
                        maps.funcs_by_name
                            .entry(name.clone())
                            .or_default()
                            .push(node.id.clone());
                    }
                    // composite (class, method)
                    if node.kind == NodeKind::Method {
                        if let Some(class_name) = extract_class_name(node, doc) {
                            let method = node.simple_name().to_string();
                            push_composite(
                                &mut maps.funcs_by_class_and_name,
                                (class_name, method),
                                node.id.clone(),
                            );
                        }
                    }
                }
                NodeKind::Class | NodeKind::Interface => {
                    if let Some(name) = &node.name {
                        maps.classes_by_name
                            .entry(name.clone())
                            .or_default()
                            .push(node.id.clone());
                    }
                }
                _ => {}
            }
        }

        // variables (every version)
        if let Some(dfg) = &doc.dfg {
            for var in &dfg.variables {
                maps.vars_by_name
                    .entry(var.name.clone())
                    .or_default()
                    .push(var.id.clone());
                if let Some(type_id) = &var.type_id {
                    push_composite(
                        &mut maps.vars_by_name_and_type,
                        (var.name.clone(), type_id.clone()),
                        var.id.clone(),
                    );
                }
                if let Some(scope_id) = &var.scope_id {
                    push_composite(
                        &mut maps.vars_by_name_and_scope,
                        (var.name.clone(), scope_id.clone()),
                        var.id.clone(),
                    );
                }
            }
        }

        // CFG blocks per function
        for block in &doc.cfg_blocks {
            maps.blocks_by_func
                .entry(block.function_node_id.clone())
                .or_default()
                .push(block.id.clone());
        }

        // call sites by callee name
        for expr in &doc.expressions {
            if let Some(callee) = expr.kind.callee_name() {
                maps.call_sites_by_name
                    .entry(callee.to_string())
                    .or_default()
                    .push(expr.id.clone());
            }
        }

        debug!(
            vars = maps.vars_by_name.len(),
            funcs = maps.funcs_by_name.len(),
            classes = maps.classes_by_name.len(),
            call_sites = maps.call_sites_by_name.len(),
            "semantic_index_built"
        );

        Self {
            node_index,
            maps: Mutex::new(maps),
            pattern_cache: PatternCache::global(),
        }
    }

    fn resolve(&self, ids: Vec<String>) -> Vec<UnifiedNode> {
        // lock already released; NodeIndex is internally thread-safe
        ids.iter().filter_map(|id| self.node_index.get(id)).collect()
    }

    pub fn find_vars_by_name(&self, name: &str) -> Vec<UnifiedNode> {
        let ids = {
            let maps = self.maps.lock();
            maps.vars_by_name.get(name).cloned().unwrap_or_default()
        };
        self.resolve(ids)
    }

    /// Dotted `Class.method` names go through the composite index.
    pub fn find_funcs_by_name(&self, name: &str) -> Vec<UnifiedNode> {
        let ids = {
            let mut maps = self.maps.lock();
            if let Some((class, method)) = name.split_once('.') {
                let composite = maps
                    .funcs_by_class_and_name
                    .get(&(class.to_string(), method.to_string()))
                    .cloned();
                match composite {
                    Some(ids) => ids,
                    None => maps.funcs_by_name.get(name).cloned().unwrap_or_default(),
                }
            } else {
                maps.funcs_by_name.get(name).cloned().unwrap_or_default()
            }
        };
        self.resolve(ids)
    }

    pub fn find_classes_by_name(&self, name: &str) -> Vec<UnifiedNode> {
        let ids = {
            let maps = self.maps.lock();
            maps.classes_by_name.get(name).cloned().unwrap_or_default()
        };
        self.resolve(ids)
    }

    /// Exact match first; dotless keys suffix-match (`"execute"` matches
    /// `conn.execute`).
    pub fn find_call_sites_by_name(&self, callee_name: &str) -> Vec<UnifiedNode> {
        let ids = {
            let maps = self.maps.lock();
            let mut ids = maps
                .call_sites_by_name
                .get(callee_name)
                .cloned()
                .unwrap_or_default();
            if ids.is_empty() && !callee_name.contains('.') {
                let suffix = format!(".{}", callee_name);
                for (full_name, site_ids) in &maps.call_sites_by_name {
                    if full_name.ends_with(&suffix) {
                        ids.extend(site_ids.iter().cloned());
                    }
                }
            }
            ids
        };
        self.resolve(ids)
    }

    pub fn find_blocks_by_function(&self, function_node_id: &str) -> Vec<UnifiedNode> {
        let ids = {
            let maps = self.maps.lock();
            maps.blocks_by_func
                .get(function_node_id)
                .cloned()
                .unwrap_or_default()
        };
        self.resolve(ids)
    }

    pub fn find_vars_by_name_and_type(&self, name: &str, type_id: &str) -> Vec<UnifiedNode> {
        let ids = {
            let mut maps = self.maps.lock();
            maps.vars_by_name_and_type
                .get(&(name.to_string(), type_id.to_string()))
                .cloned()
                .unwrap_or_default()
        };
        self.resolve(ids)
    }

    pub fn find_vars_by_name_and_scope(&self, name: &str, scope_id: &str) -> Vec<UnifiedNode> {
        let ids = {
            let mut maps = self.maps.lock();
            maps.vars_by_name_and_scope
                .get(&(name.to_string(), scope_id.to_string()))
                .cloned()
                .unwrap_or_default()
        };
        self.resolve(ids)
    }

    pub fn find_funcs_in_class(&self, class_name: &str, method_name: &str) -> Vec<UnifiedNode> {
        let ids = {
            let mut maps = self.maps.lock();
            maps.funcs_by_class_and_name
                .get(&(class_name.to_string(), method_name.to_string()))
                .cloned()
                .unwrap_or_default()
        };
        self.resolve(ids)
    }

    /// Glob match over variable names; full results cached in the shared
    /// pattern cache.
    pub fn find_vars_by_pattern(&self, pattern: &str) -> Vec<UnifiedNode> {
        let key = format!("vars:{}", pattern);
        let ids = self.pattern_cache.get_or_compute(&key, || {
            let Some(regex) = glob_to_regex(pattern) else {
                return Vec::new();
            };
            let maps = self.maps.lock();
            maps.vars_by_name
                .iter()
                .filter(|(name, _)| regex.is_match(name))
                .flat_map(|(_, ids)| ids.iter().cloned())
                .collect()
        });
        self.resolve(ids)
    }

    pub fn find_funcs_by_pattern(&self, pattern: &str) -> Vec<UnifiedNode> {
        let key = format!("funcs:{}", pattern);
        let ids = self.pattern_cache.get_or_compute(&key, || {
            let Some(regex) = glob_to_regex(pattern) else {
                return Vec::new();
            };
            let maps = self.maps.lock();
            maps.funcs_by_name
                .iter()
                .filter(|(name, _)| regex.is_match(name))
                .flat_map(|(_, ids)| ids.iter().cloned())
                .collect()
        });
        self.resolve(ids)
    }

    pub fn stats(&self) -> FxHashMap<&'static str, usize> {
        let maps = self.maps.lock();
        let mut stats = FxHashMap::default();
        stats.insert("unique_var_names", maps.vars_by_name.len());
        stats.insert("unique_func_names", maps.funcs_by_name.len());
        stats.insert("unique_class_names", maps.classes_by_name.len());
        stats.insert("unique_call_names", maps.call_sites_by_name.len());
        stats.insert(
            "total_vars",
            maps.vars_by_name.values().map(Vec::len).sum(),
        );
        stats.insert(
            "total_call_sites",
            maps.call_sites_by_name.values().map(Vec::len).sum(),
        );
        stats
    }
}

fn push_composite(
    cache: &mut LruCache<(String, String), Vec<String>>,
    key: (String, String),
    id: String,
) {
    if cache.contains(&key) {
        if let Some(ids) = cache.get_mut(&key) {
            ids.push(id);
        }
    } else {
        cache.put(key, vec![id]);
    }
}

/// Class simple name of a method: parent class node first, FQN second.
fn extract_class_name(node: &crate::shared::models::Node, doc: &IRDocument) -> Option<String> {
    if let Some(parent_id) = &node.parent_id {
        if let Some(parent) = doc.get_node(parent_id) {
            if parent.kind == NodeKind::Class {
                return parent.name.clone();
            }
        }
    }
    let parts: Vec<&str> = node.fqn.split('.').collect();
    if parts.len() >= 2 {
        let candidate = parts[parts.len() - 2];
        if candidate.chars().next().is_some_and(char::is_uppercase) {
            return Some(candidate.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{ExprKind, Expression, Node, Span};

    fn doc_with_calls() -> IRDocument {
        let mut doc = IRDocument::new("repo", "snap");
        doc.nodes.push(
            Node::new("class:m.C", NodeKind::Class, "m.C", "m.py", Span::line(1)).with_name("C"),
        );
        doc.nodes.push(
            Node::new("method:m.C.add", NodeKind::Method, "m.C.add", "m.py", Span::line(2))
                .with_name("add")
                .with_parent("class:m.C"),
        );
        doc.expressions.push(Expression::new(
            "expr:m.py:5:0:0",
            ExprKind::Call {
                callee: "conn.execute".into(),
                args: vec![],
                receiver: Some("conn".into()),
            },
            Span::line(5),
            "m.py",
        ));
        doc
    }

    #[test]
    fn test_dotted_method_lookup_uses_composite() {
        let doc = doc_with_calls();
        let node_index = Arc::new(NodeIndex::build(&doc));
        let index = SemanticIndex::build(&doc, node_index);

        let found = index.find_funcs_by_name("C.add");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "method:m.C.add");
    }

    #[test]
    fn test_call_site_suffix_matching() {
        let doc = doc_with_calls();
        let node_index = Arc::new(NodeIndex::build(&doc));
        let index = SemanticIndex::build(&doc, node_index);

        // dotless key suffix-matches conn.execute
        assert_eq!(index.find_call_sites_by_name("execute").len(), 1);
        // exact dotted key
        assert_eq!(index.find_call_sites_by_name("conn.execute").len(), 1);
        // dotted non-match does not suffix-match
        assert!(index.find_call_sites_by_name("db.execute").is_empty());
    }
}
