//! Note domain model.
//!
//! # Responsibility
//! - Define the note record and its create/update inputs.
//! - Normalize titles and attendee lists before they hit the codec.
//!
//! # Invariants
//! - `id` is derived once from title + creation time and never changes.
//! - `title` is a single non-blank line.
//! - Attendees are trimmed, single-line and never blank; order is preserved.

use super::ValidationError;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Stable note identifier (`YYYYMMDD-HHMMSS-title-slug`).
pub type NoteId = String;

/// Canonical note record as read back from its markdown document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    /// Markdown body without the title/attendee sections.
    pub content: String,
    pub attendees: Vec<String>,
    pub meeting_start_time: Option<DateTime<Local>>,
    pub created_at: DateTime<Local>,
    pub updated_at: Option<DateTime<Local>>,
    /// Action items linked from the note metadata block.
    pub action_item_ids: Vec<String>,
}

/// Input for creating a note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteCreate {
    pub title: String,
    /// Markdown or editor HTML; HTML is normalized to markdown on write.
    pub content: String,
    pub attendees: Vec<String>,
    pub meeting_start_time: Option<DateTime<Local>>,
    pub action_item_ids: Vec<String>,
}

impl NoteCreate {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_attendees<I, S>(mut self, attendees: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attendees = attendees.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_meeting_start_time(mut self, start: DateTime<Local>) -> Self {
        self.meeting_start_time = Some(start);
        self
    }
}

/// Partial update for a note. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    /// `Some(vec![])` clears the attendee list.
    pub attendees: Option<Vec<String>>,
    pub meeting_start_time: Option<DateTime<Local>>,
    pub action_item_ids: Option<Vec<String>>,
}

impl NoteUpdate {
    /// Returns whether this update would leave every field untouched.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.attendees.is_none()
            && self.meeting_start_time.is_none()
            && self.action_item_ids.is_none()
    }
}

/// Trims a title and rejects blank or multi-line values.
pub fn normalize_title(title: &str) -> Result<String, ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    if trimmed.contains(['\n', '\r']) {
        return Err(ValidationError::MultilineTitle);
    }
    Ok(trimmed.to_string())
}

/// Normalizes attendee names while preserving order.
///
/// Line breaks inside a name collapse to single spaces; blank names are dropped.
pub fn normalize_attendees(attendees: &[String]) -> Vec<String> {
    attendees
        .iter()
        .map(|name| name.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|name| !name.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{normalize_attendees, normalize_title, NoteUpdate};
    use crate::model::ValidationError;

    #[test]
    fn normalize_title_trims_and_rejects_blank() {
        assert_eq!(normalize_title("  Standup ").unwrap(), "Standup");
        assert_eq!(normalize_title("   "), Err(ValidationError::EmptyTitle));
        assert_eq!(
            normalize_title("one\ntwo"),
            Err(ValidationError::MultilineTitle)
        );
    }

    #[test]
    fn normalize_attendees_keeps_order_and_drops_blanks() {
        let input = vec![
            " Bob ".to_string(),
            "".to_string(),
            "Alice\nSmith".to_string(),
        ];
        assert_eq!(normalize_attendees(&input), vec!["Bob", "Alice Smith"]);
    }

    #[test]
    fn default_update_is_empty() {
        assert!(NoteUpdate::default().is_empty());
        let update = NoteUpdate {
            title: Some("x".to_string()),
            ..NoteUpdate::default()
        };
        assert!(!update.is_empty());
    }
}
