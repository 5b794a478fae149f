//! Storage traits.

mod memory_store;
mod vector_index;

pub use memory_store::MemoryStore;
pub use vector_index::VectorIndex;
