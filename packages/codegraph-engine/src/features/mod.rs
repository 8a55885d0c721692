pub mod chunking;
pub mod data_flow;
pub mod expression_builder;
pub mod flow_graph;
pub mod ir_generation;
pub mod parsing;
pub mod query_engine;
pub mod taint;
