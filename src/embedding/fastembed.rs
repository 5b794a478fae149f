//! FastEmbed-based embedder.
//!
//! Produces BGE-large-en-v1.5 sentence embeddings (1024 dimensions), the model
//! the vector index is built with. Only compiled with the
//! `fastembed-embeddings` feature.

use super::{DEFAULT_DIMENSIONS, Embedder};
use crate::{Error, Result};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

const MODEL_NAME: &str = "BAAI/bge-large-en-v1.5";

/// Process-wide model instance, loaded on first use.
static EMBEDDING_MODEL: OnceLock<Mutex<fastembed::TextEmbedding>> = OnceLock::new();

/// `FastEmbed` embedder using BGE-large-en-v1.5.
///
/// The model is lazily loaded on the first `embed` call.
#[derive(Debug, Clone, Copy, Default)]
pub struct FastEmbedEmbedder;

impl FastEmbedEmbedder {
    /// Embedding dimensions for BGE-large-en-v1.5.
    pub const DIMENSIONS: usize = DEFAULT_DIMENSIONS;

    /// Creates a new embedder. The model is not loaded yet.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Returns the model name.
    #[must_use]
    pub const fn model_name(&self) -> &'static str {
        MODEL_NAME
    }

    /// Loads the model eagerly so the first query does not pay for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be downloaded or initialized.
    pub fn warm_up(&self) -> Result<()> {
        Self::get_model().map(|_| ())
    }

    fn get_model() -> Result<&'static Mutex<fastembed::TextEmbedding>> {
        if let Some(model) = EMBEDDING_MODEL.get() {
            return Ok(model);
        }

        tracing::info!(model = MODEL_NAME, "Loading embedding model (first use)...");
        let start = Instant::now();

        let options = fastembed::InitOptions::new(fastembed::EmbeddingModel::BGELargeENV15)
            .with_show_download_progress(false);
        let model =
            fastembed::TextEmbedding::try_new(options).map_err(|e| Error::OperationFailed {
                operation: "load_embedding_model".to_string(),
                cause: e.to_string(),
            })?;

        tracing::info!(
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            model = MODEL_NAME,
            "Embedding model loaded"
        );

        // Another thread may have won the race; either instance is fine.
        let _ = EMBEDDING_MODEL.set(Mutex::new(model));
        EMBEDDING_MODEL.get().ok_or_else(|| Error::OperationFailed {
            operation: "get_embedding_model".to_string(),
            cause: "model initialization race".to_string(),
        })
    }
}

impl Embedder for FastEmbedEmbedder {
    fn dimensions(&self) -> usize {
        Self::DIMENSIONS
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(Error::InvalidInput("Cannot embed empty text".to_string()));
        }

        let model = Self::get_model()?;
        let input = vec![text.to_string()];

        // ONNX runtime can panic on malformed inputs.
        let result = catch_unwind(AssertUnwindSafe(|| {
            let mut guard = crate::storage::sqlite::acquire_lock(model);
            guard.embed(input, None)
        }));

        let embeddings = result
            .map_err(|panic_info| {
                let panic_msg = panic_info
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic_info.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!(panic_message = %panic_msg, "ONNX runtime panicked during embedding");
                Error::OperationFailed {
                    operation: "embed".to_string(),
                    cause: format!("ONNX runtime panic: {panic_msg}"),
                }
            })?
            .map_err(|e| Error::OperationFailed {
                operation: "embed".to_string(),
                cause: e.to_string(),
            })?;

        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| Error::OperationFailed {
                operation: "embed".to_string(),
                cause: "No embedding returned from model".to_string(),
            })
    }
}
