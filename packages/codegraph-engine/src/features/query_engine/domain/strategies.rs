//! Execution strategy selection
//!
//! Shallow queries favour breadth-first discovery, deep ones depth-first;
//! anything between goes through a cost estimate.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionMode {
    DepthFirst,
    BreadthFirst,
    CostBased,
    Lazy,
}

#[derive(Debug, Clone, Copy)]
pub struct StrategySelector {
    pub shallow_depth: usize,
    pub deep_depth: usize,
}

impl Default for StrategySelector {
    fn default() -> Self {
        Self {
            shallow_depth: 2,
            deep_depth: 5,
        }
    }
}

impl StrategySelector {
    /// depth ≤ 2 → breadth-first, depth > 5 → depth-first, else cost-based.
    pub fn select(&self, max_depth: usize) -> ExecutionMode {
        if max_depth <= self.shallow_depth {
            ExecutionMode::BreadthFirst
        } else if max_depth > self.deep_depth {
            ExecutionMode::DepthFirst
        } else {
            ExecutionMode::CostBased
        }
    }

    /// Cost-based choice degrades to BFS unless the frontier estimate
    /// (source fan-out × depth) dwarfs the node budget.
    pub fn select_cost_based(
        &self,
        max_depth: usize,
        source_count: usize,
        max_nodes: usize,
    ) -> ExecutionMode {
        match self.select(max_depth) {
            ExecutionMode::CostBased => {
                if source_count.saturating_mul(max_depth) > max_nodes {
                    ExecutionMode::DepthFirst
                } else {
                    ExecutionMode::BreadthFirst
                }
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_rules() {
        let selector = StrategySelector::default();
        assert_eq!(selector.select(2), ExecutionMode::BreadthFirst);
        assert_eq!(selector.select(10), ExecutionMode::DepthFirst);
        assert_eq!(selector.select(4), ExecutionMode::CostBased);
    }

    #[test]
    fn test_cost_based_resolution() {
        let selector = StrategySelector::default();
        assert_eq!(
            selector.select_cost_based(4, 10, 10_000),
            ExecutionMode::BreadthFirst
        );
        assert_eq!(
            selector.select_cost_based(4, 5_000, 10_000),
            ExecutionMode::DepthFirst
        );
    }
}
