//! Action item repository contracts and single-file implementation.
//!
//! # Responsibility
//! - Keep the whole action-item collection in memory after first access.
//! - Rewrite the backing file (`{items: [...], updated_at}`) on every mutation.
//!
//! # Invariants
//! - Mutations are computed on a copy and committed only after the write succeeds.
//! - A batch create shares one timestamp and writes the file once.
//! - A file that fails to parse is never overwritten.
//! - `list` is newest-first; `list_by_note` and `list_incomplete` are oldest-first.

use super::record_file::{load_yaml, save_yaml};
use super::{Lifecycle, StoreError, StoreResult};
use crate::model::action_item::{
    normalize_action_item_title, ActionItem, ActionItemCreate, ActionItemUpdate,
};
use crate::storage::{FileSystem, LocalFileSystem};
use chrono::{DateTime, Local};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Default, Serialize, Deserialize)]
struct ActionItemDocument {
    #[serde(default)]
    items: Vec<ActionItem>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::codec::timestamp_serde::option"
    )]
    updated_at: Option<DateTime<Local>>,
}

/// Repository interface for action item operations.
pub trait ActionItemRepository {
    fn create(&self, input: &ActionItemCreate) -> StoreResult<ActionItem>;
    /// Creates every item with one shared `created_at` and a single write.
    fn create_batch(&self, inputs: &[ActionItemCreate]) -> StoreResult<Vec<ActionItem>>;
    fn get(&self, id: &str) -> StoreResult<Option<ActionItem>>;
    /// Found items in the order of `ids`; unknown ids are skipped.
    fn get_by_ids(&self, ids: &[String]) -> StoreResult<Vec<ActionItem>>;
    /// Every item, newest-created first.
    fn list(&self) -> StoreResult<Vec<ActionItem>>;
    /// Items linked to `note_id`, oldest first.
    fn list_by_note(&self, note_id: &str) -> StoreResult<Vec<ActionItem>>;
    /// Incomplete items, oldest first, capped at `limit` when given.
    /// A limit of zero means no cap.
    fn list_incomplete(&self, limit: Option<usize>) -> StoreResult<Vec<ActionItem>>;
    fn update(&self, id: &str, update: &ActionItemUpdate) -> StoreResult<Option<ActionItem>>;
    /// Returns `false` when there was nothing to delete.
    fn delete(&self, id: &str) -> StoreResult<bool>;
    /// Removes every item linked to `note_id` and returns how many went away.
    fn delete_by_note(&self, note_id: &str) -> StoreResult<usize>;

    fn complete(&self, id: &str) -> StoreResult<Option<ActionItem>> {
        self.update(
            id,
            &ActionItemUpdate {
                completed: Some(true),
                ..ActionItemUpdate::default()
            },
        )
    }

    fn uncomplete(&self, id: &str) -> StoreResult<Option<ActionItem>> {
        self.update(
            id,
            &ActionItemUpdate {
                completed: Some(false),
                ..ActionItemUpdate::default()
            },
        )
    }
}

/// YAML-file backed action item store.
pub struct ActionItemStore<F: FileSystem = LocalFileSystem> {
    fs: F,
    path: PathBuf,
    items: Mutex<Lifecycle<Vec<ActionItem>>>,
}

impl ActionItemStore<LocalFileSystem> {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(LocalFileSystem::new(), path)
    }
}

impl<F: FileSystem> ActionItemStore<F> {
    pub fn new(fs: F, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
            items: Mutex::new(Lifecycle::unloaded()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> StoreResult<Vec<ActionItem>> {
        let document: ActionItemDocument = load_yaml(&self.fs, &self.path)?.unwrap_or_default();
        info!(
            "event=action_items_load module=repo status=ok items={}",
            document.items.len()
        );
        Ok(document.items)
    }

    fn read<T>(&self, op: impl FnOnce(&[ActionItem]) -> T) -> StoreResult<T> {
        let mut state = self.items.lock().map_err(|_| StoreError::LockPoisoned)?;
        let items = state.get_or_load(|| self.load())?;
        Ok(op(items))
    }

    /// Applies `op` to a copy of the collection. The copy is written and
    /// committed only when `op` reports a change.
    fn mutate<T>(
        &self,
        op: impl FnOnce(&mut Vec<ActionItem>) -> StoreResult<(T, bool)>,
    ) -> StoreResult<T> {
        let mut state = self.items.lock().map_err(|_| StoreError::LockPoisoned)?;
        let items = state.get_or_load(|| self.load())?;
        let mut next = items.clone();
        let (result, changed) = op(&mut next)?;
        if changed {
            let document = ActionItemDocument {
                items: next,
                updated_at: Some(Local::now()),
            };
            save_yaml(&self.fs, &self.path, &document)?;
            *items = document.items;
        }
        Ok(result)
    }
}

fn oldest_first(mut items: Vec<ActionItem>) -> Vec<ActionItem> {
    items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    items
}

impl<F: FileSystem> ActionItemRepository for ActionItemStore<F> {
    fn create(&self, input: &ActionItemCreate) -> StoreResult<ActionItem> {
        let title = normalize_action_item_title(&input.title)?;
        let item = ActionItem::new(title, input.note_id.clone(), Local::now());
        self.mutate(|items| {
            items.push(item.clone());
            Ok(((), true))
        })?;
        info!("event=action_item_create module=repo status=ok id={}", item.id);
        Ok(item)
    }

    fn create_batch(&self, inputs: &[ActionItemCreate]) -> StoreResult<Vec<ActionItem>> {
        let titles = inputs
            .iter()
            .map(|input| normalize_action_item_title(&input.title))
            .collect::<Result<Vec<_>, _>>()?;
        if titles.is_empty() {
            return Ok(Vec::new());
        }

        let created_at = Local::now();
        let created: Vec<ActionItem> = titles
            .into_iter()
            .zip(inputs)
            .map(|(title, input)| ActionItem::new(title, input.note_id.clone(), created_at))
            .collect();

        self.mutate(|items| {
            items.extend(created.iter().cloned());
            Ok(((), true))
        })?;
        info!(
            "event=action_items_create module=repo status=ok count={}",
            created.len()
        );
        Ok(created)
    }

    fn get(&self, id: &str) -> StoreResult<Option<ActionItem>> {
        self.read(|items| items.iter().find(|item| item.id == id).cloned())
    }

    fn get_by_ids(&self, ids: &[String]) -> StoreResult<Vec<ActionItem>> {
        self.read(|items| {
            ids.iter()
                .filter_map(|id| items.iter().find(|item| &item.id == id).cloned())
                .collect()
        })
    }

    fn list(&self) -> StoreResult<Vec<ActionItem>> {
        self.read(|items| {
            let mut listed: Vec<ActionItem> = items.iter().rev().cloned().collect();
            listed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            listed
        })
    }

    fn list_by_note(&self, note_id: &str) -> StoreResult<Vec<ActionItem>> {
        self.read(|items| {
            oldest_first(
                items
                    .iter()
                    .filter(|item| item.note_id.as_deref() == Some(note_id))
                    .cloned()
                    .collect(),
            )
        })
    }

    fn list_incomplete(&self, limit: Option<usize>) -> StoreResult<Vec<ActionItem>> {
        self.read(|items| {
            let mut pending =
                oldest_first(items.iter().filter(|item| !item.completed).cloned().collect());
            if let Some(limit) = limit.filter(|limit| *limit > 0) {
                pending.truncate(limit);
            }
            pending
        })
    }

    fn update(&self, id: &str, update: &ActionItemUpdate) -> StoreResult<Option<ActionItem>> {
        let now = Local::now();
        self.mutate(|items| {
            let Some(item) = items.iter_mut().find(|item| item.id == id) else {
                return Ok((None, false));
            };
            item.apply(update, now)?;
            Ok((Some(item.clone()), true))
        })
    }

    fn delete(&self, id: &str) -> StoreResult<bool> {
        let removed = self.mutate(|items| {
            let before = items.len();
            items.retain(|item| item.id != id);
            let removed = items.len() != before;
            Ok((removed, removed))
        })?;
        if removed {
            info!("event=action_item_delete module=repo status=ok id={}", id);
        }
        Ok(removed)
    }

    fn delete_by_note(&self, note_id: &str) -> StoreResult<usize> {
        let removed = self.mutate(|items| {
            let before = items.len();
            items.retain(|item| item.note_id.as_deref() != Some(note_id));
            let removed = before - items.len();
            Ok((removed, removed > 0))
        })?;
        if removed > 0 {
            info!(
                "event=action_items_delete_by_note module=repo status=ok note_id={} count={}",
                note_id, removed
            );
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::{ActionItemRepository, ActionItemStore};
    use crate::model::action_item::ActionItemCreate;
    use crate::model::ValidationError;
    use crate::repo::StoreError;
    use tempfile::tempdir;

    #[test]
    fn batch_with_one_blank_title_creates_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("action_items.yaml");
        let store = ActionItemStore::open(&path);

        let err = store
            .create_batch(&[ActionItemCreate::new("ok"), ActionItemCreate::new(" ")])
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::EmptyActionItemTitle)
        ));
        assert!(store.list().unwrap().is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("action_items.yaml");
        let store = ActionItemStore::open(&path);

        assert!(store.create_batch(&[]).unwrap().is_empty());
        assert!(!path.exists());
    }
}
