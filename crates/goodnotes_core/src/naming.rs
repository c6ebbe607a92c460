//! Path naming strategy for note documents.
//!
//! # Responsibility
//! - Derive the `YYYYMMDD/<slug>[-HHMM].md` storage path of a note.
//! - Derive the time-sortable note identifier.
//!
//! # Invariants
//! - Every function here is pure and deterministic.
//! - Slugs only contain `[a-z0-9-]`, never start/end with `-`, and are never empty.
//! - Identifiers sort lexicographically by creation time (second precision).

use chrono::{DateTime, Local, NaiveDate};
use deunicode::deunicode_with_tofu;
use std::path::{Path, PathBuf};

/// Extension of every note document.
pub const NOTE_EXTENSION: &str = "md";
/// Fallback slug for titles without any transliterable character.
pub const UNTITLED_SLUG: &str = "untitled";

const FILENAME_SLUG_MAX: usize = 50;
const ID_SLUG_MAX: usize = 30;

/// Lower-cased, hyphen-separated ASCII slug capped at `max_len` bytes.
///
/// Truncation happens on word boundaries; a single word longer than the cap
/// is cut at the cap. Returns an empty string when nothing survives.
pub fn slugify(text: &str, max_len: usize) -> String {
    // Characters without a transliteration become separators.
    let ascii = deunicode_with_tofu(text, " ").to_ascii_lowercase();

    let words: Vec<&str> = ascii
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect();

    let mut slug = String::new();
    for word in &words {
        let needed = if slug.is_empty() {
            word.len()
        } else {
            slug.len() + 1 + word.len()
        };
        if needed > max_len {
            break;
        }
        if !slug.is_empty() {
            slug.push('-');
        }
        slug.push_str(word);
    }

    if slug.is_empty() {
        if let Some(first) = words.first() {
            // ASCII only at this point, so byte slicing is char-safe.
            slug = first[..first.len().min(max_len)].to_string();
        }
    }
    slug
}

fn slug_or_untitled(text: &str, max_len: usize) -> String {
    let slug = slugify(text, max_len);
    if slug.is_empty() {
        UNTITLED_SLUG.to_string()
    } else {
        slug
    }
}

/// Date directory (`YYYYMMDD`) for a creation timestamp.
pub fn date_directory(created_at: &DateTime<Local>) -> String {
    created_at.format("%Y%m%d").to_string()
}

/// Date directory (`YYYYMMDD`) for a calendar date.
pub fn date_directory_for(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// `<slug>.md`, or `<slug>-HHMM.md` when a meeting start time is known.
pub fn note_filename(title: &str, meeting_start_time: Option<&DateTime<Local>>) -> String {
    let slug = slug_or_untitled(title, FILENAME_SLUG_MAX);
    match meeting_start_time {
        Some(start) => format!("{slug}-{}.{NOTE_EXTENSION}", start.format("%H%M")),
        None => format!("{slug}.{NOTE_EXTENSION}"),
    }
}

/// Storage path relative to the notes root.
pub fn relative_note_path(
    title: &str,
    created_at: &DateTime<Local>,
    meeting_start_time: Option<&DateTime<Local>>,
) -> PathBuf {
    PathBuf::from(date_directory(created_at)).join(note_filename(title, meeting_start_time))
}

/// `YYYYMMDD-HHMMSS-<short slug>`.
///
/// Two notes with the same title created within the same second share an id.
pub fn note_id(title: &str, created_at: &DateTime<Local>) -> String {
    format!(
        "{}-{}",
        created_at.format("%Y%m%d-%H%M%S"),
        slug_or_untitled(title, ID_SLUG_MAX)
    )
}

/// `dir/<stem>-<n>.md`, used to step around a path owned by another note.
pub fn with_collision_suffix(path: &Path, n: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|value| value.to_string_lossy().to_string())
        .unwrap_or_else(|| UNTITLED_SLUG.to_string());
    path.with_file_name(format!("{stem}-{n}.{NOTE_EXTENSION}"))
}

#[cfg(test)]
mod tests {
    use super::{
        date_directory, note_filename, note_id, relative_note_path, slugify,
        with_collision_suffix,
    };
    use chrono::{Local, TimeZone};
    use std::path::{Path, PathBuf};

    #[test]
    fn slugify_lowercases_and_collapses_separators() {
        assert_eq!(slugify("Weekly  Sync: Q3 / Planning!", 50), "weekly-sync-q3-planning");
        assert_eq!(slugify("--already-slugged--", 50), "already-slugged");
    }

    #[test]
    fn slugify_transliterates_latin_diacritics() {
        assert_eq!(slugify("Café Crème Übersicht", 50), "cafe-creme-ubersicht");
        assert_eq!(slugify("Straße", 50), "strasse");
    }

    #[test]
    fn slugify_truncates_on_word_boundary() {
        assert_eq!(slugify("alpha beta gamma", 12), "alpha-beta");
        assert_eq!(slugify("supercalifragilistic", 5), "super");
    }

    #[test]
    fn slugify_transliterates_non_latin_scripts() {
        assert_eq!(slugify("Привет мир", 50), "privet-mir");
        let cjk = slugify("会议记录", 50);
        assert!(!cjk.is_empty());
        assert!(cjk.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
    }

    #[test]
    fn slugify_returns_empty_for_punctuation_only_text() {
        assert_eq!(slugify("!!!", 50), "");
        assert_eq!(slugify("   ", 50), "");
    }

    #[test]
    fn non_latin_titles_do_not_fall_back_to_untitled() {
        assert_eq!(note_filename("Привет мир", None), "privet-mir.md");
    }

    #[test]
    fn filename_appends_meeting_time_and_falls_back_to_untitled() {
        let start = Local.with_ymd_and_hms(2026, 3, 4, 9, 5, 0).unwrap();
        assert_eq!(note_filename("Standup", Some(&start)), "standup-0905.md");
        assert_eq!(note_filename("Standup", None), "standup.md");
        assert_eq!(note_filename("???", None), "untitled.md");
    }

    #[test]
    fn id_and_directory_follow_creation_time() {
        let created = Local.with_ymd_and_hms(2026, 3, 4, 14, 30, 15).unwrap();
        assert_eq!(date_directory(&created), "20260304");
        assert_eq!(note_id("Design Review", &created), "20260304-143015-design-review");
        assert_eq!(
            relative_note_path("Design Review", &created, None),
            PathBuf::from("20260304").join("design-review.md")
        );
    }

    #[test]
    fn ids_sort_by_creation_time() {
        let earlier = Local.with_ymd_and_hms(2026, 1, 9, 23, 59, 59).unwrap();
        let later = Local.with_ymd_and_hms(2026, 1, 10, 0, 0, 0).unwrap();
        assert!(note_id("zzz", &earlier) < note_id("aaa", &later));
    }

    #[test]
    fn collision_suffix_keeps_directory_and_extension() {
        let path = Path::new("20260304/standup.md");
        assert_eq!(
            with_collision_suffix(path, 2),
            PathBuf::from("20260304/standup-2.md")
        );
    }
}
