mod expression_builder;

pub use expression_builder::ExpressionBuilder;
