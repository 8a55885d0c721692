//! Occurrence tracking (SCIP-compatible roles)

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::span::Span;

/// Symbol role bitflags
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolRole {
    Definition = 1,
    Import = 2,
    WriteAccess = 4,
    ReadAccess = 8,
    Generated = 16,
    Test = 32,
    ForwardDefinition = 64,
}

/// Combined roles as a bitset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct SymbolRoles(pub u8);

impl SymbolRoles {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn of(role: SymbolRole) -> Self {
        Self(role as u8)
    }

    pub fn definition() -> Self {
        Self::of(SymbolRole::Definition)
    }

    pub fn import() -> Self {
        Self::of(SymbolRole::Import)
    }

    pub fn read_access() -> Self {
        Self::of(SymbolRole::ReadAccess)
    }

    pub fn write_access() -> Self {
        Self::of(SymbolRole::WriteAccess)
    }

    pub fn with(mut self, role: SymbolRole) -> Self {
        self.add(role);
        self
    }

    pub fn add(&mut self, role: SymbolRole) {
        self.0 |= role as u8;
    }

    pub fn has(&self, role: SymbolRole) -> bool {
        self.0 & (role as u8) != 0
    }

    pub fn is_definition(&self) -> bool {
        self.has(SymbolRole::Definition)
    }
}

/// A single definition or reference of a symbol at a span.
///
/// Invariant: at most one Definition role per (symbol, file), forward
/// declarations excepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occurrence {
    pub id: String,
    /// Reference to the symbol's node id.
    pub symbol_id: String,
    pub span: Span,
    pub roles: SymbolRoles,
    pub file_path: String,
    /// Ranking signal in [0, 1].
    pub importance_score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_symbol_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enclosing_range: Option<Span>,
}

/// Lookup indexes over a document's occurrences.
#[derive(Debug, Default)]
pub struct OccurrenceIndex {
    by_symbol: HashMap<String, Vec<usize>>,
    by_file: HashMap<String, Vec<usize>>,
    occurrences: Vec<Occurrence>,
}

impl OccurrenceIndex {
    pub fn build(occurrences: &[Occurrence]) -> Self {
        let mut index = Self::default();
        for occ in occurrences {
            index.add(occ.clone());
        }
        index
    }

    pub fn add(&mut self, occ: Occurrence) {
        let idx = self.occurrences.len();
        self.by_symbol
            .entry(occ.symbol_id.clone())
            .or_default()
            .push(idx);
        self.by_file.entry(occ.file_path.clone()).or_default().push(idx);
        self.occurrences.push(occ);
    }

    pub fn get_references(&self, symbol_id: &str) -> Vec<&Occurrence> {
        self.by_symbol
            .get(symbol_id)
            .map(|ids| ids.iter().map(|&i| &self.occurrences[i]).collect())
            .unwrap_or_default()
    }

    pub fn get_definitions(&self, symbol_id: &str) -> Vec<&Occurrence> {
        self.get_references(symbol_id)
            .into_iter()
            .filter(|o| o.roles.is_definition())
            .collect()
    }

    pub fn get_file_occurrences(&self, file_path: &str) -> Vec<&Occurrence> {
        self.by_file
            .get(file_path)
            .map(|ids| ids.iter().map(|&i| &self.occurrences[i]).collect())
            .unwrap_or_default()
    }

    pub fn get_definitions_in_file(&self, file_path: &str) -> Vec<&Occurrence> {
        self.get_file_occurrences(file_path)
            .into_iter()
            .filter(|o| o.roles.is_definition())
            .collect()
    }

    pub fn get_by_role(&self, role: SymbolRole) -> Vec<&Occurrence> {
        self.occurrences.iter().filter(|o| o.roles.has(role)).collect()
    }

    /// High-importance occurrences, sorted by descending score.
    pub fn get_by_importance(&self, min_score: f32) -> Vec<&Occurrence> {
        let mut result: Vec<&Occurrence> = self
            .occurrences
            .iter()
            .filter(|o| o.importance_score >= min_score)
            .collect();
        result.sort_by(|a, b| {
            b.importance_score
                .partial_cmp(&a.importance_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        result
    }

    pub fn len(&self) -> usize {
        self.occurrences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }
}
