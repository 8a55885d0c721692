mod ast;

pub use ast::{AstNode, ExceptHandler, Param};
