//! Chunk boundary validation
//!
//! Confirms the containment invariant (child ranges inside their parent)
//! and that sibling symbol chunks do not overlap; gaps between siblings
//! inside a parent are reported separately as warnings.

use rustc_hash::FxHashMap;

use crate::features::chunking::domain::{Chunk, ChunkKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundaryViolation {
    ChildOutsideParent {
        parent_id: String,
        child_id: String,
    },
    SiblingOverlap {
        parent_id: String,
        first_id: String,
        second_id: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryGap {
    pub parent_id: String,
    pub after_child_id: String,
    pub gap_lines: u32,
}

#[derive(Debug, Default)]
pub struct BoundaryReport {
    pub violations: Vec<BoundaryViolation>,
    pub gaps: Vec<BoundaryGap>,
}

impl BoundaryReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

pub struct BoundaryValidator;

impl BoundaryValidator {
    pub fn validate(chunks: &[Chunk]) -> BoundaryReport {
        let by_id: FxHashMap<&str, &Chunk> =
            chunks.iter().map(|c| (c.chunk_id.as_str(), c)).collect();
        let mut report = BoundaryReport::default();

        for parent in chunks {
            let (Some(p_start), Some(p_end)) = (parent.start_line, parent.end_line) else {
                continue;
            };

            let mut ranged_children: Vec<&Chunk> = parent
                .children
                .iter()
                .filter_map(|id| by_id.get(id.as_str()).copied())
                .filter(|c| c.has_line_range())
                .collect();
            ranged_children.sort_by_key(|c| c.start_line);

            for child in &ranged_children {
                let (Some(c_start), Some(c_end)) = (child.start_line, child.end_line) else {
                    continue;
                };
                if c_start < p_start || c_end > p_end {
                    report.violations.push(BoundaryViolation::ChildOutsideParent {
                        parent_id: parent.chunk_id.clone(),
                        child_id: child.chunk_id.clone(),
                    });
                }
            }

            // sibling overlap + gaps among symbol children
            let symbol_children: Vec<&&Chunk> = ranged_children
                .iter()
                .filter(|c| c.kind.is_symbol())
                .collect();
            for pair in symbol_children.windows(2) {
                let (first, second) = (pair[0], pair[1]);
                let first_end = first.end_line.unwrap_or(0);
                let second_start = second.start_line.unwrap_or(0);
                if second_start <= first_end {
                    report.violations.push(BoundaryViolation::SiblingOverlap {
                        parent_id: parent.chunk_id.clone(),
                        first_id: first.chunk_id.clone(),
                        second_id: second.chunk_id.clone(),
                    });
                } else if second_start > first_end + 1 {
                    report.gaps.push(BoundaryGap {
                        parent_id: parent.chunk_id.clone(),
                        after_child_id: first.chunk_id.clone(),
                        gap_lines: second_start - first_end - 1,
                    });
                }
            }
        }
        report
    }
}
