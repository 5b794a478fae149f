//! Atomic JSON artifact writes.

use crate::{Error, Result};
use serde::Serialize;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Serializes `value` as pretty JSON and writes it to `path` atomically.
///
/// The document is written to a temporary file in the destination directory
/// and renamed over `path`, so readers see either the old file or the
/// complete new one.
///
/// # Errors
///
/// Returns an error if the directory cannot be created, serialization fails,
/// or the rename fails.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|e| Error::OperationFailed {
        operation: "create_artifact_dir".to_string(),
        cause: format!("{}: {e}", parent.display()),
    })?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| Error::operation("create_temp_file", e))?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, value)
            .map_err(|e| Error::operation("serialize_artifact", e))?;
        writer
            .write_all(b"\n")
            .and_then(|()| writer.flush())
            .map_err(|e| Error::operation("write_artifact", e))?;
    }
    tmp.as_file()
        .sync_all()
        .map_err(|e| Error::operation("sync_artifact", e))?;

    tmp.persist(path).map_err(|e| Error::OperationFailed {
        operation: "persist_artifact".to_string(),
        cause: format!("{}: {}", path.display(), e.error),
    })?;

    tracing::debug!(path = %path.display(), "Wrote artifact");
    Ok(())
}
