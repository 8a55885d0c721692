//! QueryEngine facade
//!
//! Assembles the graph index, matcher, and executor; routes modes; owns
//! the result cache and the SCCP baseline behind one lock so concurrent
//! callers serialise the critical section.
//!
//! Propagation rule: budget breaches become stop reasons; user errors
//! (bad mode, missing project context) propagate verbatim; everything
//! else: panics included: degrades into a partial `PathSet` with
//! `StopReason::Error` and diagnostics.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::errors::{EngineError, Result};
use crate::features::ir_generation::domain::IRDocument;
use crate::features::query_engine::domain::{
    PathQuery, PathSet, QueryMode, QueryOptions, StopReason, VerificationResult,
};
use crate::features::taint::domain::TaintConfig;

use super::graph_index::UnifiedGraphIndex;
use super::node_matcher::NodeMatcher;
use super::query_cache::{make_cache_key, QueryCache};
use super::query_executor::QueryExecutor;
use super::sccp::{ConstantPropagationAnalyzer, SccpResult};

/// Whole-program context required by FULL mode.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    pub repo_id: String,
    pub root: Option<String>,
}

/// Option overrides for `execute_flow`; unknown keys are logged, not
/// raised.
pub type QueryOverrides = HashMap<String, Value>;

struct EngineState {
    cache: QueryCache,
    sccp: Option<Arc<SccpResult>>,
    sccp_attempted: bool,
}

pub struct QueryEngine {
    doc: Arc<IRDocument>,
    graph: Arc<UnifiedGraphIndex>,
    matcher: NodeMatcher,
    sccp_analyzer: ConstantPropagationAnalyzer,
    project_context: Option<ProjectContext>,
    state: Mutex<EngineState>,
}

impl QueryEngine {
    pub fn new(doc: Arc<IRDocument>) -> Result<Self> {
        Self::with_taint_config(doc, TaintConfig::default_config())
    }

    pub fn with_taint_config(doc: Arc<IRDocument>, taint_config: TaintConfig) -> Result<Self> {
        let graph = Arc::new(UnifiedGraphIndex::build(&doc)?);
        info!(stats = ?graph.stats(), "query_engine_initialized");
        Ok(Self {
            doc,
            graph,
            matcher: NodeMatcher::new(taint_config),
            sccp_analyzer: ConstantPropagationAnalyzer::new(),
            project_context: None,
            state: Mutex::new(EngineState {
                cache: QueryCache::new(),
                sccp: None,
                sccp_attempted: false,
            }),
        })
    }

    pub fn with_project_context(mut self, context: ProjectContext) -> Self {
        self.project_context = Some(context);
        self
    }

    pub fn graph(&self) -> &UnifiedGraphIndex {
        &self.graph
    }

    pub fn document(&self) -> &IRDocument {
        &self.doc
    }

    // ============================================================
    // Public execution API (each method serialises on the state lock)
    // ============================================================

    /// Existential query with default options.
    pub fn execute(&self, query: &PathQuery) -> Result<PathSet> {
        self.execute_any_path(query)
    }

    pub fn execute_any_path(&self, query: &PathQuery) -> Result<PathSet> {
        let mut state = self.state.lock();
        let sccp = self.run_sccp_baseline(&mut state)?;
        drop(state);
        self.guarded_any_path(query, &QueryOptions::default(), sccp.as_deref(), Instant::now())
    }

    pub fn execute_all_paths(&self, query: &PathQuery) -> Result<VerificationResult> {
        let mut state = self.state.lock();
        let sccp = self.run_sccp_baseline(&mut state)?;
        drop(state);
        QueryExecutor::execute_all_paths(
            &self.graph,
            &self.matcher,
            query,
            &QueryOptions::default(),
            sccp.as_deref(),
        )
    }

    /// Mode-routed flow execution with preset merging and caching.
    ///
    /// REALTIME and PR results are memoised; FULL runs uncached and
    /// requires a project context.
    pub fn execute_flow(
        &self,
        flow: impl Into<PathQuery>,
        mode: QueryMode,
        overrides: &QueryOverrides,
    ) -> Result<PathSet> {
        let started = Instant::now();
        let query: PathQuery = flow.into();

        // user errors surface before any degradation handling
        if mode == QueryMode::Full && self.project_context.is_none() {
            return Err(EngineError::User(
                "full mode requires a project context; use with_project_context(...)".into(),
            ));
        }
        let options = Self::merge_options(mode, overrides);

        let mut state = self.state.lock();
        let sccp = self.run_sccp_baseline(&mut state)?;

        let cacheable = matches!(mode, QueryMode::Realtime | QueryMode::Pr);
        let cache_key = make_cache_key(&query, mode, &options);
        if cacheable {
            if let Some(cached) = state.cache.get(&cache_key) {
                info!(key = &cache_key[..16], mode = mode.as_str(), "cache_hit");
                return Ok(cached);
            }
        }
        drop(state);

        let mut result = self.guarded_any_path(&query, &options, sccp.as_deref(), started)?;
        result
            .diagnostics
            .push(format!("mode: {}", mode.as_str()));

        if cacheable && result.stop_reason != StopReason::Error {
            self.state.lock().cache.put(cache_key, result.clone());
        }
        Ok(result)
    }

    /// Drop cached results and force SCCP to re-run on the next query.
    pub fn invalidate_cache(&self) {
        let mut state = self.state.lock();
        state.cache.clear();
        state.sccp = None;
        state.sccp_attempted = false;
        self.sccp_analyzer.clear_cache();
        self.graph.invalidate_caches();
        info!("cache_invalidated");
    }

    pub fn get_stats(&self) -> HashMap<String, usize> {
        let state = self.state.lock();
        let mut stats: HashMap<String, usize> = self
            .graph
            .stats()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        stats.insert("cache_entries".to_string(), state.cache.len());
        stats.insert("cache_hits".to_string(), state.cache.hits() as usize);
        stats.insert("cache_misses".to_string(), state.cache.misses() as usize);
        stats
    }

    // ============================================================
    // Internals
    // ============================================================

    /// Run the executor with graceful degradation: user errors re-raise,
    /// panics and analysis errors produce `StopReason::Error` with
    /// diagnostics.
    fn guarded_any_path(
        &self,
        query: &PathQuery,
        options: &QueryOptions,
        sccp: Option<&SccpResult>,
        started: Instant,
    ) -> Result<PathSet> {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            QueryExecutor::execute_any_path(&self.graph, &self.matcher, query, options, sccp)
        }));

        match outcome {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(err)) if err.is_user_error() => Err(err),
            Ok(Err(err)) => {
                error!(error = %err, "query_engine_error");
                let mut result = PathSet::empty(StopReason::Error);
                result.elapsed_ms = started.elapsed().as_millis() as u64;
                result
                    .diagnostics
                    .push(format!("error: {}: {}", err.kind_str(), err));
                Ok(result)
            }
            Err(panic) => {
                let message = panic_message(&panic);
                error!(error = message, "query_engine_panic");
                let mut result = PathSet::empty(StopReason::Error);
                result.elapsed_ms = started.elapsed().as_millis() as u64;
                result.diagnostics.push(format!("error: panic: {}", message));
                Ok(result)
            }
        }
    }

    /// SCCP runs once per snapshot before the first flow query. Expected
    /// preconditions (no CFG/DFG) log and skip; unexpected failures
    /// propagate.
    fn run_sccp_baseline(&self, state: &mut EngineState) -> Result<Option<Arc<SccpResult>>> {
        if state.sccp_attempted {
            return Ok(state.sccp.clone());
        }
        match self.sccp_analyzer.analyze(&self.doc) {
            Ok(result) => {
                state.sccp = result;
                state.sccp_attempted = true;
                Ok(state.sccp.clone())
            }
            Err(err) => {
                error!(error = %err, "sccp_baseline_failed");
                Err(err)
            }
        }
    }

    /// Merge a mode preset with user overrides; unknown keys warn.
    fn merge_options(mode: QueryMode, overrides: &QueryOverrides) -> QueryOptions {
        let mut options = QueryOptions::preset(mode);
        for (key, value) in overrides {
            match key.as_str() {
                "max_depth" => set_usize(&mut options.max_depth, value),
                "max_paths" => set_usize(&mut options.max_paths, value),
                "max_nodes" => set_usize(&mut options.max_nodes, value),
                "timeout_ms" => {
                    if let Some(v) = value.as_u64() {
                        options.timeout_ms = v;
                    }
                }
                "context_sensitive" => {
                    if let Some(v) = value.as_bool() {
                        options.context_sensitive = v;
                    }
                }
                "k_limit" => {
                    if let Some(v) = value.as_u64() {
                        options.k_limit = v as u32;
                    }
                }
                "alias_analysis" => {
                    if let Some(v) = value.as_bool() {
                        options.alias_analysis = v;
                    }
                }
                "flip_ratio" => {
                    if let Some(v) = value.as_f64() {
                        options.flip_ratio = v;
                    }
                }
                "algorithm" => {
                    if let Some(v) = value.as_str() {
                        options.algorithm = v.to_string();
                    }
                }
                unknown => {
                    warn!(key = unknown, mode = mode.as_str(), "unknown_query_option");
                }
            }
        }
        options
    }
}

fn set_usize(slot: &mut usize, value: &Value) {
    if let Some(v) = value.as_u64() {
        *slot = v as usize;
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::query_engine::domain::Q;

    fn engine() -> QueryEngine {
        let doc = IRDocument::new("repo", "snap");
        QueryEngine::new(Arc::new(doc)).unwrap()
    }

    #[test]
    fn test_full_mode_requires_project_context() {
        let engine = engine();
        let err = engine
            .execute_flow(
                Q::var("x") >> Q::call("eval"),
                QueryMode::Full,
                &QueryOverrides::new(),
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::User(_)));
    }

    #[test]
    fn test_unknown_overrides_do_not_raise() {
        let engine = engine();
        let mut overrides = QueryOverrides::new();
        overrides.insert("definitely_unknown".into(), Value::Bool(true));
        let result = engine
            .execute_flow(Q::var("x") >> Q::call("eval"), QueryMode::Pr, &overrides)
            .unwrap();
        assert_eq!(result.stop_reason, StopReason::NoMatch);
    }

    #[test]
    fn test_panicking_predicate_degrades() {
        let engine = engine();
        let query = (Q::any() >> Q::any()).where_path(|_| panic!("injected"));
        let result = engine
            .execute_flow(query, QueryMode::Pr, &QueryOverrides::new())
            .unwrap();
        // empty graph: no match before the predicate ever runs
        assert!(matches!(
            result.stop_reason,
            StopReason::NoMatch | StopReason::Error
        ));
    }
}
