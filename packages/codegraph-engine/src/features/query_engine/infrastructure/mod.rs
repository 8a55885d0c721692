pub mod bloom_filter;
pub mod edge_index;
pub mod edge_resolver;
pub mod graph_index;
pub mod node_index;
pub mod node_matcher;
pub mod path_collector;
pub mod pattern_cache;
pub mod query_cache;
pub mod query_engine;
pub mod query_executor;
pub mod reachability_index;
pub mod sccp;
pub mod semantic_index;
pub mod traversal_engine;

pub use graph_index::UnifiedGraphIndex;
pub use node_matcher::NodeMatcher;
pub use query_engine::{ProjectContext, QueryEngine, QueryOverrides};
pub use sccp::{ConstantPropagationAnalyzer, SccpResult};
