//! Query options and mode presets

use serde::{Deserialize, Serialize};

use super::types::QueryMode;

/// Scope filter specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ScopeSpec {
    pub files: Vec<String>,
    pub dirs: Vec<String>,
    pub globs: Vec<String>,
    pub fqns: Vec<String>,
}

/// Immutable query execution options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    pub scope: Option<ScopeSpec>,

    // traversal limits
    pub max_depth: usize,
    pub max_paths: usize,
    pub max_nodes: usize,
    pub timeout_ms: u64,

    // analysis precision
    pub context_sensitive: bool,
    pub k_limit: u32,
    pub alias_analysis: bool,

    /// Source/target cardinality ratio beyond which a forward traversal
    /// flips to backward. Empirical default.
    pub flip_ratio: f64,

    /// Traversal algorithm: "bfs" or "dfs".
    pub algorithm: String,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            scope: None,
            max_depth: 10,
            max_paths: 100,
            max_nodes: 10_000,
            timeout_ms: 30_000,
            context_sensitive: false,
            k_limit: 2,
            alias_analysis: false,
            flip_ratio: 10.0,
            algorithm: "bfs".to_string(),
        }
    }
}

impl QueryOptions {
    /// Preset for a mode.
    ///
    /// | mode | depth | paths | nodes | timeout | context | alias |
    /// |---|---|---|---|---|---|---|
    /// | realtime | 3 | 10 | 1 000 | 100 ms | no | no |
    /// | pr | 10 | 100 | 10 000 | 5 s | no | no |
    /// | full | 20 | 500 | 100 000 | 5 min | k ≤ 2 | yes |
    pub fn preset(mode: QueryMode) -> Self {
        match mode {
            QueryMode::Realtime => Self {
                max_depth: 3,
                max_paths: 10,
                max_nodes: 1_000,
                timeout_ms: 100,
                ..Default::default()
            },
            QueryMode::Pr => Self {
                max_depth: 10,
                max_paths: 100,
                max_nodes: 10_000,
                timeout_ms: 5_000,
                ..Default::default()
            },
            QueryMode::Full => Self {
                max_depth: 20,
                max_paths: 500,
                max_nodes: 100_000,
                timeout_ms: 300_000,
                context_sensitive: true,
                k_limit: 2,
                alias_analysis: true,
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let realtime = QueryOptions::preset(QueryMode::Realtime);
        assert_eq!(realtime.max_depth, 3);
        assert_eq!(realtime.timeout_ms, 100);
        assert!(!realtime.context_sensitive);

        let full = QueryOptions::preset(QueryMode::Full);
        assert_eq!(full.max_depth, 20);
        assert!(full.context_sensitive);
        assert!(full.alias_analysis);
        assert!(full.k_limit <= 2);
    }
}
