//! Storage layer.
//!
//! Two read-only artifacts back retrieval:
//! - **Memories**: the authoritative `memories` table ([`MemoryStore`])
//! - **Vectors**: a prebuilt nearest-neighbor index ([`VectorIndex`]) plus an
//!   id-map translating index positions into memory ids

// Allow significant_drop_tightening - dropping database connections slightly early
// provides no meaningful benefit.
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::cast_possible_truncation)]

mod memory;
pub mod sqlite;
pub mod traits;
pub mod vector;

pub use memory::InMemoryStore;
pub use sqlite::SqliteMemoryStore;
pub use traits::{MemoryStore, VectorIndex};
pub use vector::FlatIndex;
#[cfg(feature = "usearch-hnsw")]
pub use vector::UsearchIndex;

use crate::models::MemoryId;
use crate::{Error, Result};
use std::fs;
use std::path::Path;

/// Loads the id-map artifact: a JSON array where element `i` is the memory id
/// stored at index position `i`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not an array of integers.
pub fn load_id_map(path: impl AsRef<Path>) -> Result<Vec<MemoryId>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| Error::OperationFailed {
        operation: "load_id_map".to_string(),
        cause: format!("{}: {e}", path.display()),
    })?;
    let ids: Vec<i64> = serde_json::from_str(&content).map_err(|e| Error::OperationFailed {
        operation: "parse_id_map".to_string(),
        cause: format!("{}: {e}", path.display()),
    })?;
    Ok(ids.into_iter().map(MemoryId::new).collect())
}

/// Opens a vector index artifact.
///
/// `.usearch` files use the native HNSW index when the `usearch-hnsw` feature
/// is enabled; everything else is read as a [`FlatIndex`] JSON artifact.
///
/// # Errors
///
/// Returns [`Error::Configuration`] if the stored dimensionality differs from
/// `dimensions` or a usearch file is given without the `usearch-hnsw`
/// feature. Returns [`Error::OperationFailed`] if the artifact is missing or
/// unreadable.
pub fn open_vector_index(path: impl AsRef<Path>, dimensions: usize) -> Result<Box<dyn VectorIndex>> {
    let path = path.as_ref();
    let is_usearch = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("usearch"));

    if is_usearch {
        #[cfg(feature = "usearch-hnsw")]
        {
            return Ok(Box::new(UsearchIndex::load(path, dimensions)?));
        }
        #[cfg(not(feature = "usearch-hnsw"))]
        {
            return Err(Error::Configuration(format!(
                "{} requires the usearch-hnsw feature",
                path.display()
            )));
        }
    }

    let index = FlatIndex::load(path)?;
    if index.dimensions() != dimensions {
        return Err(Error::Configuration(format!(
            "{} holds {}-dimensional vectors but embedding_dimensions is {dimensions}",
            path.display(),
            index.dimensions()
        )));
    }
    Ok(Box::new(index))
}
