//! Snapshot generation across files
//!
//! Files build in parallel workers; the only shared resources are the id
//! generator and the span pool, both thread-safe. A parse failure aborts
//! its own file and lands in the snapshot diagnostics; other files
//! continue.

use rayon::prelude::*;
use tracing::{info, warn};

use crate::errors::{EngineError, Result};
use crate::features::ir_generation::domain::IRDocument;
use crate::features::ir_generation::infrastructure::generator::IrGenerator;
use crate::features::ir_generation::infrastructure::override_analyzer::derive_override_edges;
use crate::features::parsing::ports::SourceFile;
use crate::shared::models::Diagnostic;
use crate::shared::utils::IdGenerator;

pub struct GenerateIrUseCase {
    generator: IrGenerator,
}

impl GenerateIrUseCase {
    pub fn new(generator: IrGenerator) -> Self {
        Self { generator }
    }

    /// Build the snapshot document for a set of files.
    pub fn generate_snapshot(
        &self,
        repo_id: &str,
        snapshot_id: &str,
        files: &[SourceFile],
    ) -> Result<IRDocument> {
        IdGenerator::global().clear();

        let workers = num_cpus::get().min(files.len().max(1));
        info!(files = files.len(), workers, "ir_snapshot_started");

        let results: Vec<std::result::Result<IRDocument, (String, EngineError)>> = files
            .par_iter()
            .map(|file| {
                self.generator
                    .generate(file, snapshot_id)
                    .map_err(|e| (file.path.clone(), e))
            })
            .collect();

        let mut doc = IRDocument::new(repo_id, snapshot_id);
        let mut failed = 0usize;
        for result in results {
            match result {
                Ok(fragment) => doc.merge_fragment(fragment),
                Err((path, err)) => {
                    failed += 1;
                    warn!(file = path, error = %err, "ir_file_skipped");
                    doc.diagnostics.push(Diagnostic::error(path, err.to_string()));
                }
            }
        }

        // cross-file override pass; per-file passes cannot see foreign bases
        let existing: rustc_hash::FxHashSet<(String, String)> = doc
            .edges
            .iter()
            .filter(|e| e.kind == crate::shared::models::EdgeKind::Overrides)
            .map(|e| (e.source_id.clone(), e.target_id.clone()))
            .collect();
        let cross_file: Vec<_> = derive_override_edges(&doc)
            .into_iter()
            .filter(|e| !existing.contains(&(e.source_id.clone(), e.target_id.clone())))
            .collect();
        doc.edges.extend(cross_file);
        doc.invalidate_indexes();

        info!(
            files = files.len(),
            failed,
            nodes = doc.nodes.len(),
            edges = doc.edges.len(),
            "ir_snapshot_generated"
        );
        Ok(doc)
    }
}
