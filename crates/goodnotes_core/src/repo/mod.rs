//! File-backed stores for notes, action items and settings.
//!
//! # Responsibility
//! - Own the id→path note index and the note CRUD flow over naming + codec.
//! - Own the whole-file keyed record stores (action items, settings).
//! - Serialize each store's load-mutate-persist section behind one mutex.
//!
//! # Invariants
//! - Missing records are reported as values (`None`, `false`, `0`), never errors.
//! - A failed persist leaves the previous file content in place.
//! - Bulk scans skip unreadable documents instead of failing.

pub mod action_item_store;
pub mod note_index;
pub mod note_store;
mod record_file;
pub mod settings_store;

use crate::model::ValidationError;
use crate::storage::FsError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub use action_item_store::{ActionItemRepository, ActionItemStore};
pub use note_index::NoteIndex;
pub use note_store::{NoteRepository, NoteStore};
pub use settings_store::{SettingsRepository, SettingsStore};

pub type StoreResult<T> = Result<T, StoreError>;

/// Error shared by every store.
#[derive(Debug)]
pub enum StoreError {
    /// A stored file exists but cannot be parsed.
    MalformedDocument { path: PathBuf, reason: String },
    /// The filesystem failed in a way the store cannot recover from.
    StorageUnavailable(FsError),
    /// Input rejected before any write happened.
    Validation(ValidationError),
    /// A record could not be rendered for writing.
    Serialization { path: PathBuf, message: String },
    /// Another thread panicked while holding the store lock.
    LockPoisoned,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedDocument { path, reason } => {
                write!(f, "malformed document {}: {reason}", path.display())
            }
            Self::StorageUnavailable(err) => write!(f, "storage unavailable: {err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Serialization { path, message } => {
                write!(f, "failed to serialize {}: {message}", path.display())
            }
            Self::LockPoisoned => write!(f, "store lock poisoned"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StorageUnavailable(err) => Some(err),
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FsError> for StoreError {
    fn from(value: FsError) -> Self {
        Self::StorageUnavailable(value)
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Load-on-first-access state held by each store.
#[derive(Debug)]
pub(crate) struct Lifecycle<T>(Option<T>);

impl<T> Lifecycle<T> {
    pub(crate) fn unloaded() -> Self {
        Self(None)
    }

    pub(crate) fn loaded(value: T) -> Self {
        Self(Some(value))
    }

    /// Runs `load` once, then hands out the loaded value.
    ///
    /// A failed load leaves the state unloaded so the next call retries.
    pub(crate) fn get_or_load(
        &mut self,
        load: impl FnOnce() -> StoreResult<T>,
    ) -> StoreResult<&mut T> {
        let value = match self.0.take() {
            Some(value) => value,
            None => load()?,
        };
        Ok(self.0.insert(value))
    }
}

#[cfg(test)]
mod tests {
    use super::{Lifecycle, StoreError};

    #[test]
    fn get_or_load_loads_once() {
        let mut state = Lifecycle::unloaded();
        let mut calls = 0;
        *state
            .get_or_load(|| {
                calls += 1;
                Ok(1)
            })
            .unwrap() += 1;
        let value = *state.get_or_load(|| Ok(100)).unwrap();
        assert_eq!(value, 2);
        assert_eq!(calls, 1);
    }

    #[test]
    fn failed_load_is_retried() {
        let mut state: Lifecycle<u32> = Lifecycle::unloaded();
        assert!(matches!(
            state.get_or_load(|| Err(StoreError::LockPoisoned)),
            Err(StoreError::LockPoisoned)
        ));
        assert_eq!(*state.get_or_load(|| Ok(7)).unwrap(), 7);
        assert_eq!(*Lifecycle::loaded(3).get_or_load(|| Ok(9)).unwrap(), 3);
    }
}
