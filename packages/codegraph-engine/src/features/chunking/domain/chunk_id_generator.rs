//! Chunk id generation with collision resolution
//!
//! Id format: `chunk:{repo_id}:{kind}:{fqn}[:{hash8}]`. The seen-set is
//! guarded by a lock so concurrent workers never hand out duplicates; a
//! collision appends the first 8 chars of the content hash.

use parking_lot::Mutex;
use rustc_hash::FxHashSet;

use super::chunk::ChunkKind;

#[derive(Debug, Clone)]
pub struct ChunkIdContext {
    pub repo_id: String,
    pub kind: ChunkKind,
    pub fqn: String,
    pub content_hash: Option<String>,
}

#[derive(Debug, Default)]
pub struct ChunkIdGenerator {
    seen: Mutex<FxHashSet<String>>,
}

impl ChunkIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generate(&self, ctx: &ChunkIdContext) -> String {
        let base = format!(
            "chunk:{}:{}:{}",
            ctx.repo_id,
            ctx.kind.as_str(),
            ctx.fqn
        );

        let mut seen = self.seen.lock();
        if seen.insert(base.clone()) {
            return base;
        }

        let suffix: String = ctx
            .content_hash
            .as_deref()
            .unwrap_or_default()
            .chars()
            .take(8)
            .collect();
        let candidate = format!("{}:{}", base, suffix);
        seen.insert(candidate.clone());
        candidate
    }

    pub fn contains(&self, chunk_id: &str) -> bool {
        self.seen.lock().contains(chunk_id)
    }

    pub fn reset(&self) {
        self.seen.lock().clear();
    }
}
