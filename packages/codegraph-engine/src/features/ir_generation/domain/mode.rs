//! IR build modes
//!
//! QUICK: signatures and structure only (~10ms/function budget).
//! PR: adds expressions, CFG, DFG, inter-procedural edges (~50ms/function).
//! FULL: adds advanced analyses: receiver-type narrowing, heap
//! abstractions (~90ms/function).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildMode {
    Quick,
    Pr,
    Full,
}

impl BuildMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildMode::Quick => "quick",
            BuildMode::Pr => "pr",
            BuildMode::Full => "full",
        }
    }

    pub fn skip_expressions(&self) -> bool {
        *self == BuildMode::Quick
    }

    pub fn skip_cfg(&self) -> bool {
        *self == BuildMode::Quick
    }

    pub fn skip_dfg(&self) -> bool {
        *self == BuildMode::Quick
    }

    pub fn skip_advanced_analysis(&self) -> bool {
        *self != BuildMode::Full
    }
}

impl Default for BuildMode {
    fn default() -> Self {
        BuildMode::Pr
    }
}
