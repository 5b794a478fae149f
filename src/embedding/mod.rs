//! Query embedding.
//!
//! The [`Embedder`] trait is the call contract for the embedding model. With
//! the `fastembed-embeddings` feature a local BGE model is available;
//! otherwise no embedder exists and retrieval runs coverage-only.

#[cfg(feature = "fastembed-embeddings")]
mod fastembed;

#[cfg(feature = "fastembed-embeddings")]
pub use fastembed::FastEmbedEmbedder;

use crate::Result;
use std::sync::Arc;

/// Embedding dimensions of the default model (BGE-large-en-v1.5).
pub const DEFAULT_DIMENSIONS: usize = 1024;

/// Trait for embedding generators.
pub trait Embedder: Send + Sync {
    /// Returns the embedding dimensions.
    fn dimensions(&self) -> usize;

    /// Generates an embedding for the given text.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding generation fails.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Returns the embedder compiled into this build, if any.
#[must_use]
pub fn default_embedder() -> Option<Arc<dyn Embedder>> {
    #[cfg(feature = "fastembed-embeddings")]
    {
        Some(Arc::new(FastEmbedEmbedder::new()))
    }
    #[cfg(not(feature = "fastembed-embeddings"))]
    {
        tracing::debug!("Built without fastembed-embeddings; no query embedder available");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(feature = "fastembed-embeddings"))]
    #[test]
    fn test_no_default_embedder_without_feature() {
        assert!(default_embedder().is_none());
    }

    #[cfg(feature = "fastembed-embeddings")]
    #[test]
    fn test_default_embedder_dimensions() {
        let embedder = default_embedder().expect("embedder");
        assert_eq!(embedder.dimensions(), DEFAULT_DIMENSIONS);
    }
}
