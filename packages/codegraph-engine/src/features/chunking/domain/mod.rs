mod chunk;
mod chunk_id_generator;

pub use chunk::{Chunk, ChunkKind, ChunkToGraph, ChunkToIr};
pub use chunk_id_generator::{ChunkIdContext, ChunkIdGenerator};
