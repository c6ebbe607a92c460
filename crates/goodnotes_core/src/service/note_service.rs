//! Note use-case service.
//!
//! # Responsibility
//! - Combine the note store and the action-item store into note-level
//!   use-cases (create with items, read with items, cascade delete).
//!
//! # Invariants
//! - Items created alongside a note are linked both ways: each item carries
//!   the note id and the note metadata lists the item ids.
//! - Cross-store steps are sequential, not transactional. A crash between
//!   them can leave orphaned action items behind.

use crate::model::action_item::{ActionItem, ActionItemCreate};
use crate::model::note::{Note, NoteCreate, NoteId, NoteUpdate};
use crate::repo::{ActionItemRepository, NoteRepository, StoreError};
use chrono::NaiveDate;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Target note does not exist.
    NoteNotFound(NoteId),
    /// Persistence-layer failure.
    Store(StoreError),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::NoteNotFound(_) => None,
        }
    }
}

impl From<StoreError> for NoteServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

pub type NoteServiceResult<T> = Result<T, NoteServiceError>;

/// A note together with its action items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDetail {
    pub note: Note,
    pub action_items: Vec<ActionItem>,
}

/// Create input: a note plus the action items captured with it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub note: NoteCreate,
    /// `note_id` on each entry is ignored; items are bound to the new note.
    pub action_items: Vec<ActionItemCreate>,
}

impl NoteDraft {
    pub fn new(note: NoteCreate) -> Self {
        Self {
            note,
            action_items: Vec::new(),
        }
    }

    pub fn with_action_items<I, S>(mut self, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.action_items = titles.into_iter().map(ActionItemCreate::new).collect();
        self
    }
}

/// Note service facade over repository implementations.
pub struct NoteService<N: NoteRepository, A: ActionItemRepository> {
    notes: N,
    action_items: A,
}

impl<N: NoteRepository, A: ActionItemRepository> NoteService<N, A> {
    pub fn new(notes: N, action_items: A) -> Self {
        Self {
            notes,
            action_items,
        }
    }

    pub fn notes(&self) -> &N {
        &self.notes
    }

    pub fn action_items(&self) -> &A {
        &self.action_items
    }

    /// Creates a note, its action items, and links them.
    pub fn create(&self, draft: &NoteDraft) -> NoteServiceResult<NoteDetail> {
        let note = self.notes.create(&draft.note)?;
        if draft.action_items.is_empty() {
            return Ok(NoteDetail {
                note,
                action_items: Vec::new(),
            });
        }

        let action_items = self.create_items_for(&note.id, &draft.action_items)?;
        let link = NoteUpdate {
            action_item_ids: Some(action_items.iter().map(|item| item.id.clone()).collect()),
            ..NoteUpdate::default()
        };
        let note = self
            .notes
            .update(&note.id, &link)?
            .ok_or_else(|| NoteServiceError::NoteNotFound(note.id.clone()))?;

        info!(
            "event=note_service_create module=service status=ok id={} action_items={}",
            note.id,
            action_items.len()
        );
        Ok(NoteDetail { note, action_items })
    }

    pub fn get(&self, id: &str) -> NoteServiceResult<Option<NoteDetail>> {
        match self.notes.get(id)? {
            Some(note) => Ok(Some(self.detail(note)?)),
            None => Ok(None),
        }
    }

    /// Every note with its items, newest first.
    pub fn list(&self) -> NoteServiceResult<Vec<NoteDetail>> {
        self.notes
            .list()?
            .into_iter()
            .map(|note| self.detail(note))
            .collect()
    }

    pub fn list_by_date(&self, date: NaiveDate) -> NoteServiceResult<Vec<NoteDetail>> {
        self.notes
            .list_by_date(date)?
            .into_iter()
            .map(|note| self.detail(note))
            .collect()
    }

    /// Merges `update` into a note.
    ///
    /// When `replacement_items` is given, the note's current items are
    /// deleted and replaced, and the note's item id list follows.
    pub fn update(
        &self,
        id: &str,
        update: &NoteUpdate,
        replacement_items: Option<&[ActionItemCreate]>,
    ) -> NoteServiceResult<NoteDetail> {
        if self.notes.get(id)?.is_none() {
            return Err(NoteServiceError::NoteNotFound(id.to_string()));
        }

        let mut update = update.clone();
        if let Some(items) = replacement_items {
            let removed = self.action_items.delete_by_note(id)?;
            let created = self.create_items_for(id, items)?;
            info!(
                "event=note_service_replace_items module=service status=ok id={} removed={} created={}",
                id,
                removed,
                created.len()
            );
            update.action_item_ids = Some(created.iter().map(|item| item.id.clone()).collect());
        }

        let note = self
            .notes
            .update(id, &update)?
            .ok_or_else(|| NoteServiceError::NoteNotFound(id.to_string()))?;
        self.detail(note)
    }

    /// Deletes a note's action items, then the note.
    pub fn delete(&self, id: &str) -> NoteServiceResult<()> {
        let removed = self.action_items.delete_by_note(id)?;
        if !self.notes.delete(id)? {
            return Err(NoteServiceError::NoteNotFound(id.to_string()));
        }
        info!(
            "event=note_service_delete module=service status=ok id={} action_items={}",
            id, removed
        );
        Ok(())
    }

    fn create_items_for(
        &self,
        note_id: &str,
        items: &[ActionItemCreate],
    ) -> NoteServiceResult<Vec<ActionItem>> {
        let bound: Vec<ActionItemCreate> = items
            .iter()
            .map(|item| ActionItemCreate::for_note(item.title.clone(), note_id))
            .collect();
        Ok(self.action_items.create_batch(&bound)?)
    }

    /// Items listed in the note metadata, or items pointing at the note when
    /// the metadata lists none.
    fn detail(&self, note: Note) -> NoteServiceResult<NoteDetail> {
        let action_items = if note.action_item_ids.is_empty() {
            self.action_items.list_by_note(&note.id)?
        } else {
            self.action_items.get_by_ids(&note.action_item_ids)?
        };
        Ok(NoteDetail { note, action_items })
    }
}
