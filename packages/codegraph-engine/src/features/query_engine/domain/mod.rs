pub mod expressions;
pub mod factories;
pub mod operators;
pub mod options;
pub mod results;
pub mod selectors;
pub mod strategies;
pub mod types;

pub use expressions::{Constraint, FlowExpr, PathPredicate, PathQuery, SafetyLimits, Sensitivity};
pub use factories::{E, Q};
pub use options::{QueryOptions, ScopeSpec};
pub use results::{
    PathResult, PathSet, StopReason, TruncationReason, UncertainReason, UnifiedEdge, UnifiedNode,
    VerificationResult,
};
pub use selectors::{EdgeSelector, NodeSelector};
pub use strategies::{ExecutionMode, StrategySelector};
pub use types::{
    ConstraintMode, ContextStrategy, EdgeType, QueryMode, SelectorType, SensitivityMode,
    TraversalDirection,
};
