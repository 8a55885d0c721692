mod cfg_builder;

pub use cfg_builder::CfgBuilder;
