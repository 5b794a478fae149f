//! Vector index implementations.

mod flat;
#[cfg(feature = "usearch-hnsw")]
mod usearch;

pub use flat::FlatIndex;
#[cfg(feature = "usearch-hnsw")]
pub use usearch::UsearchIndex;
