//! Note repository contracts and markdown-file implementation.
//!
//! # Responsibility
//! - Provide note CRUD keyed by note id over one markdown document per note.
//! - Keep the id→path index consistent with committed mutations.
//! - Recover a lost or stale index by rescanning the notes tree.
//!
//! # Invariants
//! - The index is loaded lazily, once, on the first call of any operation.
//! - Every create, rename and delete persists the index before returning.
//! - The in-memory index changes only after its file was written; a failed
//!   write rolls the touched document back.
//! - A rename writes the new document before the index switches to it, and the
//!   old document is removed only after the switch is persisted.
//! - Two different notes never share a document path.

use super::note_index::NoteIndex;
use super::{Lifecycle, StoreError, StoreResult};
use crate::codec::{decode_note, encode_note, DocumentError};
use crate::model::note::{
    normalize_attendees, normalize_title, Note, NoteCreate, NoteUpdate,
};
use crate::naming::{
    date_directory_for, note_id, relative_note_path, with_collision_suffix, NOTE_EXTENSION,
};
use crate::storage::{FileSystem, LocalFileSystem};
use chrono::{Local, NaiveDate};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Repository interface for note operations.
pub trait NoteRepository {
    /// Creates one note and returns it as stored.
    fn create(&self, input: &NoteCreate) -> StoreResult<Note>;
    /// Gets one note by id. Unknown and unreadable notes are `None`.
    fn get(&self, id: &str) -> StoreResult<Option<Note>>;
    /// Lists every indexed note, newest-created first.
    fn list(&self) -> StoreResult<Vec<Note>>;
    /// Lists notes stored under the date directory of `date`, newest first.
    fn list_by_date(&self, date: NaiveDate) -> StoreResult<Vec<Note>>;
    /// Merges `update` into a note. Returns `None` when the note is unknown.
    fn update(&self, id: &str, update: &NoteUpdate) -> StoreResult<Option<Note>>;
    /// Deletes a note. Returns `false` when there was nothing to delete.
    fn delete(&self, id: &str) -> StoreResult<bool>;
    /// Discards the current index, rescans the notes tree and persists the
    /// result. Returns the number of indexed notes.
    fn rebuild_index(&self) -> StoreResult<usize>;
}

/// Markdown-file backed note store.
pub struct NoteStore<F: FileSystem = LocalFileSystem> {
    fs: F,
    notes_root: PathBuf,
    index_file: PathBuf,
    index: Mutex<Lifecycle<NoteIndex>>,
}

impl NoteStore<LocalFileSystem> {
    /// Store over the local disk.
    pub fn open(notes_root: impl Into<PathBuf>, index_file: impl Into<PathBuf>) -> Self {
        Self::new(LocalFileSystem::new(), notes_root, index_file)
    }
}

impl<F: FileSystem> NoteStore<F> {
    pub fn new(fs: F, notes_root: impl Into<PathBuf>, index_file: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            notes_root: notes_root.into(),
            index_file: index_file.into(),
            index: Mutex::new(Lifecycle::unloaded()),
        }
    }

    pub fn notes_root(&self) -> &Path {
        &self.notes_root
    }

    pub fn index_file(&self) -> &Path {
        &self.index_file
    }

    fn with_index<T>(&self, op: impl FnOnce(&mut NoteIndex) -> StoreResult<T>) -> StoreResult<T> {
        let mut state = self.index.lock().map_err(|_| StoreError::LockPoisoned)?;
        let index = state.get_or_load(|| self.load_index())?;
        op(index)
    }

    /// Persisted index minus dangling entries, or a rescan when that is empty.
    fn load_index(&self) -> StoreResult<NoteIndex> {
        if let Some(mut index) = NoteIndex::read(&self.fs, &self.index_file, &self.notes_root)? {
            let dropped = index.retain_existing(&self.fs);
            if !index.is_empty() {
                if dropped > 0 {
                    index.persist(&self.fs, &self.index_file)?;
                }
                info!(
                    "event=index_load module=repo status=ok entries={} dropped={}",
                    index.len(),
                    dropped
                );
                return Ok(index);
            }
        }
        self.scan_and_persist()
    }

    fn scan_and_persist(&self) -> StoreResult<NoteIndex> {
        let index = NoteIndex::scan(&self.fs, &self.notes_root)?;
        index.persist(&self.fs, &self.index_file)?;
        info!(
            "event=index_rebuild module=repo status=ok entries={} root={}",
            index.len(),
            self.notes_root.display()
        );
        Ok(index)
    }

    /// Reads one document. Missing and malformed documents are `None`.
    fn read_note(&self, path: &Path) -> StoreResult<Option<Note>> {
        let text = match self.fs.read(path) {
            Ok(text) => text,
            Err(err) if err.is_not_found() => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        match decode_note(&text) {
            Ok(note) => Ok(Some(note)),
            Err(err) => {
                warn!(
                    "event=note_read module=repo status=skip path={} reason={}",
                    path.display(),
                    err
                );
                Ok(None)
            }
        }
    }

    /// Best-effort bulk read used by the list operations.
    fn read_all<'a>(&self, paths: impl IntoIterator<Item = &'a Path>) -> Vec<Note> {
        let mut notes = Vec::new();
        for path in paths {
            match self.read_note(path) {
                Ok(Some(note)) => notes.push(note),
                Ok(None) => {}
                Err(err) => warn!(
                    "event=note_list module=repo status=skip path={} reason={}",
                    path.display(),
                    err
                ),
            }
        }
        sort_newest_first(&mut notes);
        notes
    }

    /// First free path at or after `candidate` for note `id`.
    ///
    /// A path is free when no other note is indexed there and no unindexed
    /// file occupies it.
    fn claim_path(&self, index: &NoteIndex, candidate: &Path, id: &str) -> PathBuf {
        let is_free = |path: &Path| match index.owner_of(path) {
            Some(owner) => owner == id,
            None => !self.fs.exists(path),
        };
        if is_free(candidate) {
            return candidate.to_path_buf();
        }
        let mut suffix = 2;
        loop {
            let next = with_collision_suffix(candidate, suffix);
            if is_free(&next) {
                return next;
            }
            suffix += 1;
        }
    }

    fn target_path(&self, note: &Note) -> PathBuf {
        self.notes_root.join(relative_note_path(
            &note.title,
            &note.created_at,
            note.meeting_start_time.as_ref(),
        ))
    }

    /// Persists `next` and swaps it in only when the write succeeded.
    fn commit_index(&self, index: &mut NoteIndex, next: NoteIndex) -> StoreResult<()> {
        next.persist(&self.fs, &self.index_file)?;
        *index = next;
        Ok(())
    }

    fn read_existing(&self, path: &Path) -> StoreResult<Option<String>> {
        match self.fs.read(path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Puts `path` back to `prior`, removing it when it did not exist.
    fn restore_document(&self, path: &Path, prior: Option<&str>) {
        let outcome = match prior {
            Some(text) => self.fs.write(path, text),
            None => self.fs.delete(path).map(|_| ()),
        };
        if let Err(err) = outcome {
            warn!(
                "event=note_rollback module=repo status=error path={} reason={}",
                path.display(),
                err
            );
        }
    }
}

/// Encodes `note` and reads it back, yielding the text to write and the note
/// exactly as a later `get` will return it.
fn render(note: &Note, path: &Path) -> StoreResult<(String, Note)> {
    let text = encode_note(note).map_err(|err| document_error(path, err))?;
    let stored = decode_note(&text).map_err(|err| document_error(path, err))?;
    Ok((text, stored))
}

fn document_error(path: &Path, err: DocumentError) -> StoreError {
    match err {
        DocumentError::Encode(message) => StoreError::Serialization {
            path: path.to_path_buf(),
            message,
        },
        other => StoreError::MalformedDocument {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    }
}

fn sort_newest_first(notes: &mut [Note]) {
    notes.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

impl<F: FileSystem> NoteRepository for NoteStore<F> {
    fn create(&self, input: &NoteCreate) -> StoreResult<Note> {
        let title = normalize_title(&input.title)?;
        let created_at = Local::now();
        let note = Note {
            id: note_id(&title, &created_at),
            title,
            content: input.content.clone(),
            attendees: normalize_attendees(&input.attendees),
            meeting_start_time: input.meeting_start_time,
            created_at,
            updated_at: None,
            action_item_ids: input.action_item_ids.clone(),
        };

        self.with_index(|index| {
            let path = self.claim_path(index, &self.target_path(&note), &note.id);
            let (text, stored) = render(&note, &path)?;
            let prior = self.read_existing(&path)?;
            self.fs.write(&path, &text)?;

            let mut next = index.clone();
            let previous = next.insert(stored.id.clone(), path.clone());
            if let Err(err) = self.commit_index(index, next) {
                self.restore_document(&path, prior.as_deref());
                return Err(err);
            }
            if let Some(previous) = previous.filter(|previous| *previous != path) {
                warn!(
                    "event=note_create module=repo status=id_collision id={} previous={}",
                    stored.id,
                    previous.display()
                );
            }
            info!(
                "event=note_create module=repo status=ok id={} path={}",
                stored.id,
                path.display()
            );
            Ok(stored)
        })
    }

    fn get(&self, id: &str) -> StoreResult<Option<Note>> {
        self.with_index(|index| {
            let Some(path) = index.get(id).map(Path::to_path_buf) else {
                return Ok(None);
            };
            if !self.fs.exists(&path) {
                let mut next = index.clone();
                next.remove(id);
                self.commit_index(index, next)?;
                warn!(
                    "event=note_get module=repo status=dangling id={} path={}",
                    id,
                    path.display()
                );
                return Ok(None);
            }
            self.read_note(&path)
        })
    }

    fn list(&self) -> StoreResult<Vec<Note>> {
        self.with_index(|index| Ok(self.read_all(index.iter().map(|(_, path)| path))))
    }

    fn list_by_date(&self, date: NaiveDate) -> StoreResult<Vec<Note>> {
        self.with_index(|_| {
            let dir = self.notes_root.join(date_directory_for(date));
            let paths = self.fs.list_with_extension(&dir, NOTE_EXTENSION, false)?;
            Ok(self.read_all(paths.iter().map(PathBuf::as_path)))
        })
    }

    fn update(&self, id: &str, update: &NoteUpdate) -> StoreResult<Option<Note>> {
        let title = update.title.as_deref().map(normalize_title).transpose()?;

        self.with_index(|index| {
            let Some(current_path) = index.get(id).map(Path::to_path_buf) else {
                return Ok(None);
            };
            let Some(mut note) = self.read_note(&current_path)? else {
                return Ok(None);
            };

            if let Some(title) = title {
                note.title = title;
            }
            if let Some(content) = update.content.as_ref() {
                note.content = content.clone();
            }
            if let Some(attendees) = update.attendees.as_ref() {
                note.attendees = normalize_attendees(attendees);
            }
            if let Some(start) = update.meeting_start_time {
                note.meeting_start_time = Some(start);
            }
            if let Some(ids) = update.action_item_ids.as_ref() {
                note.action_item_ids = ids.clone();
            }
            note.updated_at = Some(Local::now());

            let candidate = self.target_path(&note);
            let path = if candidate == current_path {
                current_path.clone()
            } else {
                self.claim_path(index, &candidate, &note.id)
            };
            let (text, stored) = render(&note, &path)?;
            if path == current_path {
                self.fs.write(&path, &text)?;
                info!("event=note_update module=repo status=ok id={}", stored.id);
                return Ok(Some(stored));
            }

            let prior = self.read_existing(&path)?;
            self.fs.write(&path, &text)?;
            let mut next = index.clone();
            next.insert(stored.id.clone(), path.clone());
            if let Err(err) = self.commit_index(index, next) {
                self.restore_document(&path, prior.as_deref());
                return Err(err);
            }
            // The switch is committed; a leftover old document is only noise.
            if let Err(err) = self.fs.delete(&current_path) {
                warn!(
                    "event=note_update module=repo status=stale_document id={} path={} reason={}",
                    stored.id,
                    current_path.display(),
                    err
                );
            }
            info!(
                "event=note_update module=repo status=renamed id={} from={} to={}",
                stored.id,
                current_path.display(),
                path.display()
            );
            Ok(Some(stored))
        })
    }

    fn delete(&self, id: &str) -> StoreResult<bool> {
        self.with_index(|index| {
            let Some(path) = index.get(id).map(Path::to_path_buf) else {
                return Ok(false);
            };
            let prior = self.read_existing(&path)?;
            self.fs.delete(&path)?;
            let mut next = index.clone();
            next.remove(id);
            if let Err(err) = self.commit_index(index, next) {
                self.restore_document(&path, prior.as_deref());
                return Err(err);
            }
            info!(
                "event=note_delete module=repo status=ok id={} path={}",
                id,
                path.display()
            );
            Ok(true)
        })
    }

    fn rebuild_index(&self) -> StoreResult<usize> {
        let mut state = self.index.lock().map_err(|_| StoreError::LockPoisoned)?;
        let index = self.scan_and_persist()?;
        let count = index.len();
        *state = Lifecycle::loaded(index);
        Ok(count)
    }
}
