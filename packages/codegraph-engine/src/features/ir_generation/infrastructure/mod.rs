pub mod call_analyzer;
pub mod function_analyzer;
pub mod generator;
pub mod import_analyzer;
pub mod incremental;
pub mod module_path;
pub mod occurrence_generator;
pub mod override_analyzer;
pub mod serializer;

pub use generator::IrGenerator;
pub use incremental::{IRDelta, IncrementalIrBuilder};
pub use serializer::IrSerializer;
