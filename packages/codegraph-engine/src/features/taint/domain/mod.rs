mod config;

pub use config::{AtomKind, TaintAtom, TaintConfig};
