//! codegraph-engine: a queryable, multi-layered program graph
//!
//! Transforms source repositories into a language-neutral intermediate
//! representation (structural nodes/edges plus expressions, CFG, DFG,
//! inter-procedural edges, and occurrences), projects it into a
//! read-optimised unified graph index, and answers path-reachability
//! questions through a selector DSL:
//!
//! ```
//! use std::sync::Arc;
//! use codegraph_engine::features::ir_generation::domain::IRDocument;
//! use codegraph_engine::features::query_engine::domain::{QueryMode, E, Q};
//! use codegraph_engine::features::query_engine::infrastructure::{QueryEngine, QueryOverrides};
//!
//! let doc = IRDocument::new("myrepo", "snap-1");
//! let engine = QueryEngine::new(Arc::new(doc)).unwrap();
//! let flow = (Q::call("input") >> Q::call("conn.execute")).via(E::dfg());
//! let paths = engine
//!     .execute_flow(flow, QueryMode::Pr, &QueryOverrides::new())
//!     .unwrap();
//! assert!(paths.is_empty());
//! ```
//!
//! Construction happens in two single-writer windows (initial build and
//! incremental update); everything downstream reads immutable snapshots.

pub mod errors;
pub mod features;
pub mod shared;

pub use errors::{EngineError, Result};

// Primary entry points
pub use features::chunking::infrastructure::{ChunkBuilder, BoundaryValidator};
pub use features::ir_generation::application::GenerateIrUseCase;
pub use features::ir_generation::domain::{BuildMode, IRDocument};
pub use features::ir_generation::infrastructure::{IncrementalIrBuilder, IrGenerator, IrSerializer};
pub use features::parsing::ports::{ParserRegistry, SourceFile, SourceParser};
pub use features::query_engine::domain::{PathQuery, PathSet, QueryMode, StopReason, E, Q};
pub use features::query_engine::infrastructure::{
    ProjectContext, QueryEngine, QueryOverrides, UnifiedGraphIndex,
};
pub use features::taint::domain::TaintConfig;
