//! Markdown document encode/decode.
//!
//! Layout written by [`encode_note`]:
//!
//! ```text
//! ---
//! id: 20260304-091500-standup
//! created_at: 2026-03-04T09:15:00.123+01:00
//! action_item_ids:
//! - 6c1f...
//! ---
//! # Standup
//!
//! ## Attendees
//!
//! - Alice
//! - Bob
//!
//! ## Notes
//!
//! body markdown
//! ```
//!
//! # Invariants
//! - Only the first `# ` line is the title; later ones are body content.
//! - Only the first `## Notes` line is a marker, and `## Attendees` is only
//!   structural before that marker, so user headings with the same text survive.
//! - The line that closes the attendee section is kept as body content.

use super::{format_timestamp, normalize_content, parse_timestamp, DocumentError, DocumentResult};
use crate::model::note::Note;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

const METADATA_DELIMITER: &str = "---";
const ATTENDEES_HEADING: &str = "## Attendees";
const NOTES_HEADING: &str = "## Notes";
const ATTENDEE_BULLET: &str = "- ";
const TITLE_PREFIX: &str = "# ";

#[derive(Debug, Serialize, Deserialize)]
struct DocumentMetadata {
    id: String,
    created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    meeting_start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    action_item_ids: Vec<String>,
}

/// Renders a note as a markdown document.
///
/// `note.title` and `note.attendees` are expected to be normalized already;
/// `note.content` is normalized to markdown here.
pub fn encode_note(note: &Note) -> DocumentResult<String> {
    let metadata = DocumentMetadata {
        id: note.id.clone(),
        created_at: format_timestamp(&note.created_at),
        updated_at: note.updated_at.as_ref().map(format_timestamp),
        meeting_start_time: note.meeting_start_time.as_ref().map(format_timestamp),
        action_item_ids: note.action_item_ids.clone(),
    };
    let yaml =
        serde_yaml::to_string(&metadata).map_err(|err| DocumentError::Encode(err.to_string()))?;

    let mut lines: Vec<String> = vec![format!("{TITLE_PREFIX}{}", note.title), String::new()];

    if !note.attendees.is_empty() {
        lines.push(ATTENDEES_HEADING.to_string());
        lines.push(String::new());
        for attendee in &note.attendees {
            lines.push(format!("{ATTENDEE_BULLET}{attendee}"));
        }
        lines.push(String::new());
    }

    let content = normalize_content(&note.content);
    if !content.trim().is_empty() {
        lines.push(NOTES_HEADING.to_string());
        lines.push(String::new());
        lines.push(content);
    }

    let body = lines.join("\n");
    Ok(format!(
        "{METADATA_DELIMITER}\n{yaml}{METADATA_DELIMITER}\n{}\n",
        body.trim_end()
    ))
}

/// Parses a markdown document back into a note.
///
/// # Errors
/// - [`DocumentError::MissingMetadata`] when no metadata block opens the document.
/// - [`DocumentError::InvalidMetadata`] when the block is not valid note metadata.
pub fn decode_note(text: &str) -> DocumentResult<Note> {
    let (yaml, body) = split_metadata(text).ok_or(DocumentError::MissingMetadata)?;
    let metadata: DocumentMetadata =
        serde_yaml::from_str(&yaml).map_err(|err| DocumentError::InvalidMetadata(err.to_string()))?;

    if metadata.id.trim().is_empty() {
        return Err(DocumentError::InvalidMetadata("empty id".to_string()));
    }
    let created_at = required_timestamp("created_at", &metadata.created_at)?;
    let updated_at = optional_timestamp("updated_at", metadata.updated_at.as_deref())?;
    let meeting_start_time =
        optional_timestamp("meeting_start_time", metadata.meeting_start_time.as_deref())?;

    let sections = parse_body(body);

    Ok(Note {
        id: metadata.id,
        title: sections.title,
        content: sections.content,
        attendees: sections.attendees,
        meeting_start_time,
        created_at,
        updated_at,
        action_item_ids: metadata.action_item_ids,
    })
}

fn required_timestamp(field: &str, value: &str) -> DocumentResult<DateTime<Local>> {
    parse_timestamp(value).ok_or_else(|| {
        DocumentError::InvalidMetadata(format!("invalid {field} timestamp `{value}`"))
    })
}

fn optional_timestamp(field: &str, value: Option<&str>) -> DocumentResult<Option<DateTime<Local>>> {
    value.map(|raw| required_timestamp(field, raw)).transpose()
}

/// Splits `---\n<yaml>---\n<body>` into its two halves.
fn split_metadata(text: &str) -> Option<(String, &str)> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.split_inclusive('\n');
    let first = lines.next()?;
    if first.trim_end() != METADATA_DELIMITER {
        return None;
    }

    let mut consumed = first.len();
    let mut yaml = String::new();
    for line in lines {
        consumed += line.len();
        if line.trim_end() == METADATA_DELIMITER {
            return Some((yaml, &text[consumed..]));
        }
        yaml.push_str(line);
    }
    None
}

#[derive(Debug, Default)]
struct BodySections {
    title: String,
    attendees: Vec<String>,
    content: String,
}

fn parse_body(body: &str) -> BodySections {
    let mut title: Option<String> = None;
    let mut attendees = Vec::new();
    let mut content_lines: Vec<&str> = Vec::new();
    let mut in_attendees = false;
    let mut attendees_seen = false;
    let mut notes_marker_seen = false;

    for line in body.lines() {
        let stripped = line.trim();

        if in_attendees {
            if let Some(name) = stripped.strip_prefix(ATTENDEE_BULLET) {
                let name = name.trim();
                if !name.is_empty() {
                    attendees.push(name.to_string());
                }
                continue;
            }
            if stripped.is_empty() {
                continue;
            }
            // Section ends here; the closing line is processed as ordinary input.
            in_attendees = false;
        }

        if title.is_none() {
            if let Some(rest) = stripped.strip_prefix(TITLE_PREFIX) {
                title = Some(rest.trim().to_string());
                continue;
            }
        }

        if !attendees_seen
            && !notes_marker_seen
            && stripped.eq_ignore_ascii_case(ATTENDEES_HEADING)
        {
            in_attendees = true;
            attendees_seen = true;
            continue;
        }

        if !notes_marker_seen && stripped.eq_ignore_ascii_case(NOTES_HEADING) {
            notes_marker_seen = true;
            continue;
        }

        if title.is_some() {
            content_lines.push(line);
        }
    }

    let start = content_lines
        .iter()
        .position(|line| !line.trim().is_empty())
        .unwrap_or(content_lines.len());
    let end = content_lines
        .iter()
        .rposition(|line| !line.trim().is_empty())
        .map(|index| index + 1)
        .unwrap_or(start);

    BodySections {
        title: title.unwrap_or_default(),
        attendees,
        content: content_lines[start..end.max(start)].join("\n"),
    }
}
