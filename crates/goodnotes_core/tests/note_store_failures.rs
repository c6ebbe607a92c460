use chrono::{Local, TimeZone};
use goodnotes_core::storage::FsResult;
use goodnotes_core::{
    FileSystem, FsError, LocalFileSystem, NoteCreate, NoteRepository, NoteStore, NoteUpdate,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::tempdir;

/// Local disk whose writes to the index file fail while `failing` is set.
struct IndexWriteFailure {
    inner: LocalFileSystem,
    index_file: PathBuf,
    failing: Arc<AtomicBool>,
}

impl FileSystem for IndexWriteFailure {
    fn read(&self, path: &Path) -> FsResult<String> {
        self.inner.read(path)
    }

    fn write(&self, path: &Path, contents: &str) -> FsResult<()> {
        if self.failing.load(Ordering::SeqCst) && path == self.index_file {
            return Err(FsError::Io {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::Other, "disk full"),
            });
        }
        self.inner.write(path, contents)
    }

    fn delete(&self, path: &Path) -> FsResult<bool> {
        self.inner.delete(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn list_with_extension(
        &self,
        dir: &Path,
        extension: &str,
        recursive: bool,
    ) -> FsResult<Vec<PathBuf>> {
        self.inner.list_with_extension(dir, extension, recursive)
    }

    fn rename(&self, from: &Path, to: &Path) -> FsResult<()> {
        self.inner.rename(from, to)
    }
}

fn failing_store(dir: &Path) -> (NoteStore<IndexWriteFailure>, Arc<AtomicBool>) {
    let failing = Arc::new(AtomicBool::new(false));
    let index_file = dir.join("notes_index.yaml");
    let fs = IndexWriteFailure {
        inner: LocalFileSystem::new(),
        index_file: index_file.clone(),
        failing: Arc::clone(&failing),
    };
    (NoteStore::new(fs, dir.join("notes"), index_file), failing)
}

fn reopened(dir: &Path) -> NoteStore {
    NoteStore::open(dir.join("notes"), dir.join("notes_index.yaml"))
}

fn titles<F: FileSystem>(store: &NoteStore<F>) -> Vec<String> {
    store
        .list()
        .unwrap()
        .into_iter()
        .map(|note| note.title)
        .collect()
}

fn day_dir(dir: &Path, created_at: &chrono::DateTime<Local>) -> PathBuf {
    dir.join("notes").join(created_at.format("%Y%m%d").to_string())
}

#[test]
fn create_that_cannot_persist_the_index_leaves_no_trace() {
    let dir = tempdir().unwrap();
    let (store, failing) = failing_store(dir.path());
    let first = store.create(&NoteCreate::new("First")).unwrap();

    failing.store(true, Ordering::SeqCst);
    assert!(store.create(&NoteCreate::new("Second")).is_err());

    assert_eq!(titles(&store), vec!["First"]);
    assert!(!day_dir(dir.path(), &first.created_at).join("second.md").exists());

    failing.store(false, Ordering::SeqCst);
    assert_eq!(titles(&reopened(dir.path())), vec!["First"]);
}

#[test]
fn rename_that_cannot_persist_the_index_keeps_the_old_document() {
    let dir = tempdir().unwrap();
    let (store, failing) = failing_store(dir.path());
    let created = store.create(&NoteCreate::new("Standup")).unwrap();
    let day = day_dir(dir.path(), &created.created_at);

    failing.store(true, Ordering::SeqCst);
    let rename = NoteUpdate {
        title: Some("Retro".to_string()),
        ..NoteUpdate::default()
    };
    assert!(store.update(&created.id, &rename).is_err());

    assert_eq!(store.get(&created.id).unwrap().unwrap().title, "Standup");
    assert!(day.join("standup.md").is_file());
    assert!(!day.join("retro.md").exists());

    failing.store(false, Ordering::SeqCst);
    assert_eq!(reopened(dir.path()).get(&created.id).unwrap().unwrap(), created);
}

#[test]
fn delete_that_cannot_persist_the_index_keeps_the_note() {
    let dir = tempdir().unwrap();
    let (store, failing) = failing_store(dir.path());
    let created = store.create(&NoteCreate::new("Keeper")).unwrap();

    failing.store(true, Ordering::SeqCst);
    assert!(store.delete(&created.id).is_err());

    assert_eq!(store.get(&created.id).unwrap(), Some(created.clone()));
    assert!(day_dir(dir.path(), &created.created_at)
        .join("keeper.md")
        .is_file());

    failing.store(false, Ordering::SeqCst);
    assert!(store.delete(&created.id).unwrap());
    assert!(reopened(dir.path()).get(&created.id).unwrap().is_none());
}

#[test]
fn changing_only_the_meeting_time_moves_the_document() {
    let dir = tempdir().unwrap();
    let store = reopened(dir.path());
    let nine = Local.with_ymd_and_hms(2026, 3, 4, 9, 0, 0).unwrap();
    let half_ten = Local.with_ymd_and_hms(2026, 3, 4, 10, 30, 0).unwrap();
    let created = store
        .create(&NoteCreate::new("Sync").with_meeting_start_time(nine))
        .unwrap();
    let day = day_dir(dir.path(), &created.created_at);
    assert!(day.join("sync-0900.md").is_file());

    let moved = store
        .update(
            &created.id,
            &NoteUpdate {
                meeting_start_time: Some(half_ten),
                ..NoteUpdate::default()
            },
        )
        .unwrap()
        .unwrap();

    assert_eq!(moved.meeting_start_time, Some(half_ten));
    assert_eq!(moved.title, "Sync");
    assert!(!day.join("sync-0900.md").exists());
    assert!(day.join("sync-1030.md").is_file());

    let fresh = reopened(dir.path());
    assert_eq!(fresh.get(&created.id).unwrap(), Some(moved));
    assert_eq!(fresh.list().unwrap().len(), 1);
}
