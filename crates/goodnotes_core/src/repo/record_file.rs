//! Whole-file YAML load/save shared by the record stores and the note index.

use super::{StoreError, StoreResult};
use crate::storage::FileSystem;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Reads and parses `path`. A missing file yields `Ok(None)`.
///
/// # Errors
/// - [`StoreError::MalformedDocument`] when the content does not parse.
/// - [`StoreError::StorageUnavailable`] on any other read failure.
pub(crate) fn load_yaml<T, F>(fs: &F, path: &Path) -> StoreResult<Option<T>>
where
    T: DeserializeOwned,
    F: FileSystem + ?Sized,
{
    let text = match fs.read(path) {
        Ok(text) => text,
        Err(err) if err.is_not_found() => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    if text.trim().is_empty() {
        return Ok(None);
    }
    serde_yaml::from_str(&text)
        .map(Some)
        .map_err(|err| StoreError::MalformedDocument {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })
}

/// Serializes `value` and replaces `path` in one write.
pub(crate) fn save_yaml<T, F>(fs: &F, path: &Path, value: &T) -> StoreResult<()>
where
    T: Serialize,
    F: FileSystem + ?Sized,
{
    let text = serde_yaml::to_string(value).map_err(|err| StoreError::Serialization {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    fs.write(path, &text)?;
    Ok(())
}
