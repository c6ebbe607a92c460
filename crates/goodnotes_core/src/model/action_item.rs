//! Action item domain model.
//!
//! # Invariants
//! - `completed_at` is set iff `completed` is `true`.
//! - `note_id` is a soft link; the owning note may no longer exist.

use super::ValidationError;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Follow-up task captured from a note or created on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_id: Option<String>,
    #[serde(with = "crate::codec::timestamp_serde")]
    pub created_at: DateTime<Local>,
    #[serde(default, with = "crate::codec::timestamp_serde::option")]
    pub updated_at: Option<DateTime<Local>>,
    #[serde(default, with = "crate::codec::timestamp_serde::option")]
    pub completed_at: Option<DateTime<Local>>,
    #[serde(default)]
    pub completed: bool,
}

impl ActionItem {
    /// Builds a fresh, incomplete item with a generated id.
    pub fn new(title: String, note_id: Option<String>, created_at: DateTime<Local>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            note_id,
            created_at,
            updated_at: None,
            completed_at: None,
            completed: false,
        }
    }

    /// Applies a partial update and stamps `updated_at`.
    pub fn apply(
        &mut self,
        update: &ActionItemUpdate,
        now: DateTime<Local>,
    ) -> Result<(), ValidationError> {
        if let Some(title) = update.title.as_deref() {
            self.title = normalize_action_item_title(title)?;
        }
        if let Some(completed) = update.completed {
            self.completed = completed;
            self.completed_at = if completed { Some(now) } else { None };
        }
        self.updated_at = Some(now);
        Ok(())
    }
}

/// Input for creating one action item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItemCreate {
    pub title: String,
    #[serde(default)]
    pub note_id: Option<String>,
}

impl ActionItemCreate {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            note_id: None,
        }
    }

    pub fn for_note(title: impl Into<String>, note_id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            note_id: Some(note_id.into()),
        }
    }
}

/// Partial update for an action item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItemUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
}

pub fn normalize_action_item_title(title: &str) -> Result<String, ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        Err(ValidationError::EmptyActionItemTitle)
    } else {
        Ok(trimmed.to_string())
    }
}
