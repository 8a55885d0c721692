//! Node and edge selectors (pure domain)
//!
//! Selectors define WHAT to select; the infrastructure matcher decides HOW.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::{EdgeType, SelectorType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSelector {
    pub selector_type: SelectorType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Call context for context-sensitive matching.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attrs: HashMap<String, Value>,
    /// Operands for Union/Intersection selectors.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operands: Vec<NodeSelector>,
}

impl NodeSelector {
    pub fn new(selector_type: SelectorType) -> Self {
        Self {
            selector_type,
            name: None,
            pattern: None,
            context: None,
            attrs: HashMap::new(),
            operands: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attrs.insert(key.into(), value);
        self
    }

    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(Value::as_str)
    }

    /// Structural scope constraint: keep matches inside `scope`.
    pub fn within(mut self, scope: NodeSelector) -> Self {
        self.attrs.insert(
            "scope_selector".to_string(),
            serde_json::to_value(scope).unwrap_or(Value::Null),
        );
        self
    }

    /// Wildcard: matches every node of its type family.
    pub fn is_wildcard(&self) -> bool {
        self.name.is_none()
            && self.pattern.is_none()
            && matches!(self.selector_type, SelectorType::Var | SelectorType::Any)
    }

    /// Stable descriptor used in cache keys; union operands sort by name.
    pub fn cache_descriptor(&self) -> String {
        match self.selector_type {
            SelectorType::Union | SelectorType::Intersection => {
                let mut names: Vec<String> =
                    self.operands.iter().map(|o| o.cache_descriptor()).collect();
                names.sort();
                format!("{}:[{}]", self.selector_type.as_str(), names.join(","))
            }
            _ => format!(
                "{}:{}",
                self.selector_type.as_str(),
                self.name
                    .as_deref()
                    .or(self.pattern.as_deref())
                    .unwrap_or("*")
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeSelector {
    pub edge_type: EdgeType,
    /// Union operands; non-empty only for `E.DFG | E.CALL` style unions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operands: Vec<EdgeType>,
    pub is_backward: bool,
    pub min_depth: usize,
    pub max_depth: usize,
}

impl EdgeSelector {
    pub fn new(edge_type: EdgeType) -> Self {
        Self {
            edge_type,
            operands: Vec::new(),
            is_backward: false,
            min_depth: 1,
            max_depth: 10,
        }
    }

    /// Reverse the traversal direction for this edge class.
    pub fn backward(mut self) -> Self {
        self.is_backward = true;
        self
    }

    pub fn depth(mut self, max: usize, min: usize) -> Self {
        self.max_depth = max;
        self.min_depth = min;
        self
    }

    pub fn is_forward(&self) -> bool {
        !self.is_backward
    }

    /// Does this selector admit edges of `edge_type`?
    pub fn matches(&self, edge_type: EdgeType) -> bool {
        if !self.operands.is_empty() {
            return self.operands.contains(&edge_type) || self.operands.contains(&EdgeType::All);
        }
        self.edge_type == EdgeType::All || self.edge_type == edge_type
    }

    pub fn cache_descriptor(&self) -> String {
        if self.operands.is_empty() {
            format!("via:{}", self.edge_type.as_str())
        } else {
            let mut names: Vec<&str> = self.operands.iter().map(|t| t.as_str()).collect();
            names.sort();
            format!("via:union[{}]", names.join("|"))
        }
    }
}

impl Default for EdgeSelector {
    fn default() -> Self {
        Self::new(EdgeType::All)
    }
}

// E.DFG | E.CALL: union of edge classes
impl std::ops::BitOr for EdgeSelector {
    type Output = EdgeSelector;

    fn bitor(self, rhs: EdgeSelector) -> EdgeSelector {
        let mut operands = if self.operands.is_empty() {
            vec![self.edge_type]
        } else {
            self.operands.clone()
        };
        if rhs.operands.is_empty() {
            if !operands.contains(&rhs.edge_type) {
                operands.push(rhs.edge_type);
            }
        } else {
            for op in rhs.operands {
                if !operands.contains(&op) {
                    operands.push(op);
                }
            }
        }
        EdgeSelector {
            edge_type: EdgeType::All,
            operands,
            is_backward: self.is_backward,
            min_depth: self.min_depth,
            max_depth: self.max_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_selector_modifiers() {
        let selector = EdgeSelector::new(EdgeType::Cfg).backward().depth(5, 2);
        assert!(selector.is_backward);
        assert_eq!(selector.max_depth, 5);
        assert_eq!(selector.min_depth, 2);
    }

    #[test]
    fn test_edge_union_matching() {
        let union = EdgeSelector::new(EdgeType::Dfg) | EdgeSelector::new(EdgeType::Call);
        assert!(union.matches(EdgeType::Dfg));
        assert!(union.matches(EdgeType::Call));
        assert!(!union.matches(EdgeType::Cfg));
    }

    #[test]
    fn test_all_matches_everything() {
        let all = EdgeSelector::new(EdgeType::All);
        assert!(all.matches(EdgeType::Dfg));
        assert!(all.matches(EdgeType::Binds));
    }

    #[test]
    fn test_cache_descriptor_sorts_union_operands() {
        let a = EdgeSelector::new(EdgeType::Call) | EdgeSelector::new(EdgeType::Dfg);
        let b = EdgeSelector::new(EdgeType::Dfg) | EdgeSelector::new(EdgeType::Call);
        assert_eq!(a.cache_descriptor(), b.cache_descriptor());
    }

    #[test]
    fn test_wildcard_detection() {
        assert!(NodeSelector::new(SelectorType::Any).is_wildcard());
        assert!(NodeSelector::new(SelectorType::Var).is_wildcard());
        assert!(!NodeSelector::new(SelectorType::Var).with_name("x").is_wildcard());
    }
}
