//! Note id → document path index.
//!
//! # Responsibility
//! - Hold the in-memory mapping from note id to absolute document path.
//! - Read and write its persisted mirror (`{notes: {id: path}, updated_at}`).
//! - Rebuild the mapping from scratch by scanning the notes tree.
//!
//! # Invariants
//! - The index is a cache. Losing or corrupting its file is never fatal.
//! - Persisted paths are relative to the notes root when possible.

use super::record_file::{load_yaml, save_yaml};
use super::{StoreError, StoreResult};
use crate::codec::{decode_note, format_timestamp};
use crate::model::note::NoteId;
use crate::naming::NOTE_EXTENSION;
use crate::storage::FileSystem;
use chrono::Local;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Serialize, Deserialize)]
struct IndexDocument {
    #[serde(default)]
    notes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteIndex {
    notes_root: PathBuf,
    entries: BTreeMap<NoteId, PathBuf>,
}

impl NoteIndex {
    pub fn new(notes_root: impl Into<PathBuf>) -> Self {
        Self {
            notes_root: notes_root.into(),
            entries: BTreeMap::new(),
        }
    }

    pub fn notes_root(&self) -> &Path {
        &self.notes_root
    }

    pub fn get(&self, id: &str) -> Option<&Path> {
        self.entries.get(id).map(PathBuf::as_path)
    }

    pub fn insert(&mut self, id: impl Into<NoteId>, path: PathBuf) -> Option<PathBuf> {
        self.entries.insert(id.into(), path)
    }

    pub fn remove(&mut self, id: &str) -> Option<PathBuf> {
        self.entries.remove(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries
            .iter()
            .map(|(id, path)| (id.as_str(), path.as_path()))
    }

    /// Id of the note currently indexed at `path`, if any.
    pub fn owner_of(&self, path: &Path) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, candidate)| candidate.as_path() == path)
            .map(|(id, _)| id.as_str())
    }

    /// Reads the persisted index.
    ///
    /// Returns `Ok(None)` when the file is missing or unparseable; only
    /// unexpected I/O failures are errors.
    pub(crate) fn read<F: FileSystem + ?Sized>(
        fs: &F,
        index_file: &Path,
        notes_root: &Path,
    ) -> StoreResult<Option<Self>> {
        let document: IndexDocument = match load_yaml(fs, index_file) {
            Ok(Some(document)) => document,
            Ok(None) => {
                debug!(
                    "event=index_load module=repo status=missing path={}",
                    index_file.display()
                );
                return Ok(None);
            }
            Err(StoreError::MalformedDocument { path, reason }) => {
                warn!(
                    "event=index_load module=repo status=corrupt path={} reason={}",
                    path.display(),
                    reason
                );
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        let mut index = Self::new(notes_root);
        for (id, stored) in document.notes {
            let stored = PathBuf::from(stored);
            let path = if stored.is_absolute() {
                stored
            } else {
                notes_root.join(stored)
            };
            index.entries.insert(id, path);
        }
        Ok(Some(index))
    }

    /// Drops entries whose document no longer exists and returns how many.
    pub(crate) fn retain_existing<F: FileSystem + ?Sized>(&mut self, fs: &F) -> usize {
        let before = self.entries.len();
        self.entries.retain(|id, path| {
            let keep = fs.exists(path);
            if !keep {
                debug!(
                    "event=index_load module=repo status=drop id={} path={}",
                    id,
                    path.display()
                );
            }
            keep
        });
        before - self.entries.len()
    }

    /// Builds a fresh index from every parseable document under the notes root.
    pub(crate) fn scan<F: FileSystem + ?Sized>(fs: &F, notes_root: &Path) -> StoreResult<Self> {
        let mut index = Self::new(notes_root);
        for path in fs.list_with_extension(notes_root, NOTE_EXTENSION, true)? {
            let text = match fs.read(&path) {
                Ok(text) => text,
                Err(err) => {
                    warn!(
                        "event=index_rebuild module=repo status=skip path={} reason={}",
                        path.display(),
                        err
                    );
                    continue;
                }
            };
            match decode_note(&text) {
                Ok(note) => {
                    if let Some(previous) = index.entries.insert(note.id.clone(), path.clone()) {
                        warn!(
                            "event=index_rebuild module=repo status=duplicate id={} kept={} dropped={}",
                            note.id,
                            path.display(),
                            previous.display()
                        );
                    }
                }
                Err(err) => {
                    warn!(
                        "event=index_rebuild module=repo status=skip path={} reason={}",
                        path.display(),
                        err
                    );
                }
            }
        }
        Ok(index)
    }

    /// Writes the full mapping to `index_file`.
    pub(crate) fn persist<F: FileSystem + ?Sized>(
        &self,
        fs: &F,
        index_file: &Path,
    ) -> StoreResult<()> {
        let notes = self
            .entries
            .iter()
            .map(|(id, path)| {
                let stored = path.strip_prefix(&self.notes_root).unwrap_or(path);
                (id.clone(), stored.to_string_lossy().into_owned())
            })
            .collect();
        let document = IndexDocument {
            notes,
            updated_at: Some(format_timestamp(&Local::now())),
        };
        save_yaml(fs, index_file, &document)
    }
}
