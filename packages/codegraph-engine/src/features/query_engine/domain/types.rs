//! Query-layer enums

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectorType {
    Var,
    Func,
    Call,
    Block,
    Expr,
    Class,
    Module,
    Field,
    Source,
    Sink,
    Alias,
    TemplateSlot,
    Any,
    Union,
    Intersection,
}

impl SelectorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectorType::Var => "var",
            SelectorType::Func => "func",
            SelectorType::Call => "call",
            SelectorType::Block => "block",
            SelectorType::Expr => "expr",
            SelectorType::Class => "class",
            SelectorType::Module => "module",
            SelectorType::Field => "field",
            SelectorType::Source => "source",
            SelectorType::Sink => "sink",
            SelectorType::Alias => "alias",
            SelectorType::TemplateSlot => "template_slot",
            SelectorType::Any => "any",
            SelectorType::Union => "union",
            SelectorType::Intersection => "intersection",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeType {
    Dfg,
    Cfg,
    Call,
    Binds,
    Renders,
    Escapes,
    All,
}

impl EdgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::Dfg => "dfg",
            EdgeType::Cfg => "cfg",
            EdgeType::Call => "call",
            EdgeType::Binds => "binds",
            EdgeType::Renders => "renders",
            EdgeType::Escapes => "escapes",
            EdgeType::All => "all",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraversalDirection {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryMode {
    Realtime,
    Pr,
    Full,
}

impl QueryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryMode::Realtime => "realtime",
            QueryMode::Pr => "pr",
            QueryMode::Full => "full",
        }
    }
}

/// `within` constraint behaviour. Prune is accepted but currently behaves
/// as a post-filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintMode {
    Prune,
    Filter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContextStrategy {
    Summary,
    Cloning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensitivityMode {
    Must,
    May,
}
