use chrono::{Duration, Local, TimeZone};
use goodnotes_core::{NoteCreate, NoteRepository, NoteStore, NoteUpdate};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn store_in(dir: &Path) -> NoteStore {
    NoteStore::open(dir.join("notes"), dir.join("notes_index.yaml"))
}

fn indexed_paths(dir: &Path) -> Vec<(String, String)> {
    let text = fs::read_to_string(dir.join("notes_index.yaml")).unwrap();
    let value: serde_yaml::Value = serde_yaml::from_str(&text).unwrap();
    value["notes"]
        .as_mapping()
        .unwrap()
        .iter()
        .map(|(id, path)| {
            (
                id.as_str().unwrap().to_string(),
                path.as_str().unwrap().to_string(),
            )
        })
        .collect()
}

fn date_dir(dir: &Path, created_at: &chrono::DateTime<Local>) -> PathBuf {
    dir.join("notes").join(created_at.format("%Y%m%d").to_string())
}

#[test]
fn create_writes_document_under_date_directory_and_indexes_it() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());
    let start = Local.with_ymd_and_hms(2026, 3, 4, 9, 30, 0).unwrap();

    let note = store
        .create(
            &NoteCreate::new("  Design Review ")
                .with_content("Agreed on the layout.")
                .with_attendees(["Alice", " ", "Bob"])
                .with_meeting_start_time(start),
        )
        .unwrap();

    assert_eq!(note.title, "Design Review");
    assert_eq!(note.attendees, vec!["Alice", "Bob"]);
    assert!(note.id.ends_with("-design-review"));
    let path = date_dir(dir.path(), &note.created_at).join("design-review-0930.md");
    assert!(path.is_file());

    assert_eq!(store.get(&note.id).unwrap(), Some(note.clone()));
    let entries = indexed_paths(dir.path());
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0, note.id);
    assert!(entries[0].1.ends_with("design-review-0930.md"));
}

#[test]
fn html_content_is_stored_as_markdown() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());

    let note = store
        .create(&NoteCreate::new("Kickoff").with_content("<p>Hello <strong>team</strong></p>"))
        .unwrap();

    assert_eq!(note.content, "Hello **team**");
    let on_disk = fs::read_to_string(date_dir(dir.path(), &note.created_at).join("kickoff.md"))
        .unwrap();
    assert!(on_disk.contains("## Notes\n\nHello **team**\n"));
}

#[test]
fn rebuild_indexes_valid_documents_and_skips_malformed_ones() {
    let dir = tempdir().unwrap();
    {
        let store = store_in(dir.path());
        for title in ["Alpha", "Beta", "Gamma"] {
            store.create(&NoteCreate::new(title)).unwrap();
        }
    }
    let broken_dir = dir.path().join("notes/20250101");
    fs::create_dir_all(&broken_dir).unwrap();
    fs::write(broken_dir.join("broken.md"), "# No metadata here\n\nJust text.\n").unwrap();
    fs::remove_file(dir.path().join("notes_index.yaml")).unwrap();

    let store = store_in(dir.path());
    assert_eq!(store.rebuild_index().unwrap(), 3);
    assert_eq!(store.list().unwrap().len(), 3);
    assert_eq!(indexed_paths(dir.path()).len(), 3);
}

#[test]
fn renaming_title_moves_the_document_and_updates_the_index() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());
    let created = store.create(&NoteCreate::new("Standup")).unwrap();
    let day = date_dir(dir.path(), &created.created_at);
    assert!(day.join("standup.md").is_file());

    let updated = store
        .update(
            &created.id,
            &NoteUpdate {
                title: Some("Retro".to_string()),
                ..NoteUpdate::default()
            },
        )
        .unwrap()
        .unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.title, "Retro");
    assert!(updated.updated_at.is_some());
    assert!(!day.join("standup.md").exists());
    assert!(day.join("retro.md").is_file());

    let entries = indexed_paths(dir.path());
    assert_eq!(entries.len(), 1);
    assert!(entries[0].1.ends_with("retro.md"));

    let reopened = store_in(dir.path());
    assert_eq!(reopened.get(&created.id).unwrap().unwrap().title, "Retro");
}

#[test]
fn update_merges_only_provided_fields() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());
    let created = store
        .create(
            &NoteCreate::new("Planning")
                .with_content("first draft")
                .with_attendees(["Alice"]),
        )
        .unwrap();

    let updated = store
        .update(
            &created.id,
            &NoteUpdate {
                content: Some("second draft".to_string()),
                ..NoteUpdate::default()
            },
        )
        .unwrap()
        .unwrap();

    assert_eq!(updated.title, "Planning");
    assert_eq!(updated.attendees, vec!["Alice"]);
    assert_eq!(updated.content, "second draft");
    assert_eq!(updated.created_at, created.created_at);
}

#[test]
fn rename_onto_another_notes_path_gets_a_suffix() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());
    let planning = store.create(&NoteCreate::new("Planning")).unwrap();
    let retro = store.create(&NoteCreate::new("Retro")).unwrap();

    store
        .update(
            &retro.id,
            &NoteUpdate {
                title: Some("Planning".to_string()),
                ..NoteUpdate::default()
            },
        )
        .unwrap()
        .unwrap();

    let day = date_dir(dir.path(), &planning.created_at);
    assert!(day.join("planning.md").is_file());
    assert!(day.join("planning-2.md").is_file());
    assert_eq!(store.get(&planning.id).unwrap().unwrap().title, "Planning");
    assert_eq!(store.get(&retro.id).unwrap().unwrap().title, "Planning");
}

#[test]
fn deleting_twice_reports_not_found_the_second_time() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());
    let note = store.create(&NoteCreate::new("Throwaway")).unwrap();
    let path = date_dir(dir.path(), &note.created_at).join("throwaway.md");

    assert!(store.delete(&note.id).unwrap());
    assert!(!path.exists());
    assert!(!store.delete(&note.id).unwrap());
    assert!(store.get(&note.id).unwrap().is_none());
    assert!(indexed_paths(dir.path()).is_empty());
}

#[test]
fn list_is_newest_first() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());
    let first = store.create(&NoteCreate::new("First")).unwrap();
    let second = store.create(&NoteCreate::new("Second")).unwrap();
    let third = store.create(&NoteCreate::new("Third")).unwrap();

    let ids: Vec<String> = store.list().unwrap().into_iter().map(|note| note.id).collect();
    assert_eq!(ids, vec![third.id, second.id, first.id]);
}

#[test]
fn list_by_date_only_reads_that_days_directory() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());
    let first = store.create(&NoteCreate::new("Morning")).unwrap();
    let second = store.create(&NoteCreate::new("Evening")).unwrap();

    let today = first.created_at.date_naive();
    if second.created_at.date_naive() == today {
        let titles: Vec<String> = store
            .list_by_date(today)
            .unwrap()
            .into_iter()
            .map(|note| note.title)
            .collect();
        assert_eq!(titles, vec!["Evening", "Morning"]);
    }

    let long_ago = today - Duration::days(400);
    assert!(store.list_by_date(long_ago).unwrap().is_empty());
}

#[test]
fn lost_or_corrupt_index_is_rebuilt_on_first_access() {
    let dir = tempdir().unwrap();
    let note = store_in(dir.path())
        .create(&NoteCreate::new("Survivor"))
        .unwrap();

    fs::remove_file(dir.path().join("notes_index.yaml")).unwrap();
    assert_eq!(
        store_in(dir.path()).get(&note.id).unwrap().unwrap().title,
        "Survivor"
    );

    fs::write(dir.path().join("notes_index.yaml"), "notes: [broken").unwrap();
    assert_eq!(
        store_in(dir.path()).get(&note.id).unwrap().unwrap().title,
        "Survivor"
    );
    assert_eq!(indexed_paths(dir.path()).len(), 1);
}

#[test]
fn dangling_index_entries_are_dropped_on_load() {
    let dir = tempdir().unwrap();
    let (kept, removed) = {
        let store = store_in(dir.path());
        let kept = store.create(&NoteCreate::new("Kept")).unwrap();
        let removed = store.create(&NoteCreate::new("Removed")).unwrap();
        (kept, removed)
    };
    fs::remove_file(date_dir(dir.path(), &removed.created_at).join("removed.md")).unwrap();

    let store = store_in(dir.path());
    let ids: Vec<String> = store.list().unwrap().into_iter().map(|note| note.id).collect();
    assert_eq!(ids, vec![kept.id.clone()]);
    let entries = indexed_paths(dir.path());
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0, kept.id);
}

#[test]
fn malformed_document_reads_as_missing_and_is_skipped_by_list() {
    let dir = tempdir().unwrap();
    let store = store_in(dir.path());
    let good = store.create(&NoteCreate::new("Good")).unwrap();
    let bad = store.create(&NoteCreate::new("Bad")).unwrap();
    fs::write(
        date_dir(dir.path(), &bad.created_at).join("bad.md"),
        "garbage without metadata",
    )
    .unwrap();

    assert!(store.get(&bad.id).unwrap().is_none());
    let listed: Vec<String> = store.list().unwrap().into_iter().map(|note| note.id).collect();
    assert_eq!(listed, vec![good.id]);
}
