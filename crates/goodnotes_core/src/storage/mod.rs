//! Filesystem collaborator used by every store.
//!
//! # Responsibility
//! - Define the small set of file primitives the stores rely on.
//! - Report "missing file" distinctly from other I/O failures.
//!
//! # Invariants
//! - `write` and `rename` create destination parents as needed.
//! - `write` never leaves a half-written destination behind.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::{Path, PathBuf};

mod local;

pub use local::LocalFileSystem;

pub type FsResult<T> = Result<T, FsError>;

#[derive(Debug)]
pub enum FsError {
    NotFound(PathBuf),
    Io { path: PathBuf, source: io::Error },
}

impl FsError {
    pub(crate) fn from_io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound(path.to_path_buf())
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl Display for FsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "file not found: {}", path.display()),
            Self::Io { path, source } => write!(f, "i/o failure at {}: {source}", path.display()),
        }
    }
}

impl Error for FsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::Io { source, .. } => Some(source),
        }
    }
}

/// File primitives consumed by the note, action-item and settings stores.
pub trait FileSystem: Send + Sync {
    fn read(&self, path: &Path) -> FsResult<String>;
    fn write(&self, path: &Path, contents: &str) -> FsResult<()>;
    /// Returns `false` when there was nothing to delete.
    fn delete(&self, path: &Path) -> FsResult<bool>;
    fn exists(&self, path: &Path) -> bool;
    /// Lists files with `extension` under `dir`. A missing `dir` yields nothing.
    fn list_with_extension(
        &self,
        dir: &Path,
        extension: &str,
        recursive: bool,
    ) -> FsResult<Vec<PathBuf>>;
    fn rename(&self, from: &Path, to: &Path) -> FsResult<()>;
}
