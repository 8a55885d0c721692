pub mod id_generator;
pub mod scope_stack;

pub use id_generator::IdGenerator;
pub use scope_stack::{ScopeFrame, ScopeKind, ScopeStack};
