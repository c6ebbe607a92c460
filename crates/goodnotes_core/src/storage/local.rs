//! `std::fs` backed implementation of [`FileSystem`].

use super::{FileSystem, FsError, FsResult};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const TEMP_SUFFIX: &str = ".tmp";

/// Local disk filesystem. Writes go through a sibling temp file + rename.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub fn new() -> Self {
        Self
    }
}

fn ensure_parent(path: &Path) -> FsResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| FsError::from_io(parent, err))?;
        }
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|value| value.to_os_string())
        .unwrap_or_default();
    name.push(TEMP_SUFFIX);
    path.with_file_name(name)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

impl FileSystem for LocalFileSystem {
    fn read(&self, path: &Path) -> FsResult<String> {
        fs::read_to_string(path).map_err(|err| FsError::from_io(path, err))
    }

    fn write(&self, path: &Path, contents: &str) -> FsResult<()> {
        ensure_parent(path)?;
        let temp = temp_path_for(path);
        fs::write(&temp, contents).map_err(|err| FsError::from_io(&temp, err))?;
        if let Err(err) = fs::rename(&temp, path) {
            let _ = fs::remove_file(&temp);
            return Err(FsError::from_io(path, err));
        }
        Ok(())
    }

    fn delete(&self, path: &Path) -> FsResult<bool> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(FsError::from_io(path, err)),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn list_with_extension(
        &self,
        dir: &Path,
        extension: &str,
        recursive: bool,
    ) -> FsResult<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(if recursive { usize::MAX } else { 1 })
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.path()));

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    // Unreadable subtrees are skipped; the rest of the walk stays usable.
                    debug!(
                        "event=fs_list module=storage status=skip dir={} error={}",
                        dir.display(),
                        err
                    );
                    continue;
                }
            };
            let path = entry.path();
            if entry.file_type().is_file()
                && path.extension().map(|ext| ext == extension).unwrap_or(false)
            {
                files.push(path.to_path_buf());
            }
        }
        Ok(files)
    }

    fn rename(&self, from: &Path, to: &Path) -> FsResult<()> {
        ensure_parent(to)?;
        fs::rename(from, to).map_err(|err| FsError::from_io(from, err))
    }
}

#[cfg(test)]
mod tests {
    use super::LocalFileSystem;
    use crate::storage::FileSystem;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn write_creates_parents_and_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let fs_impl = LocalFileSystem::new();
        let target = dir.path().join("a/b/note.md");

        fs_impl.write(&target, "hello").unwrap();

        assert_eq!(fs_impl.read(&target).unwrap(), "hello");
        assert!(!dir.path().join("a/b/note.md.tmp").exists());
    }

    #[test]
    fn read_missing_reports_not_found() {
        let dir = tempdir().unwrap();
        let err = LocalFileSystem::new()
            .read(&dir.path().join("missing.md"))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn delete_reports_whether_a_file_was_removed() {
        let dir = tempdir().unwrap();
        let fs_impl = LocalFileSystem::new();
        let target = dir.path().join("x.md");
        fs::write(&target, "x").unwrap();

        assert!(fs_impl.delete(&target).unwrap());
        assert!(!fs_impl.delete(&target).unwrap());
    }

    #[test]
    fn list_with_extension_honors_recursion_and_skips_hidden() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("top.md"), "t").unwrap();
        fs::write(root.join("top.txt"), "t").unwrap();
        fs::create_dir_all(root.join("20260101")).unwrap();
        fs::write(root.join("20260101/nested.md"), "n").unwrap();
        fs::create_dir_all(root.join(".trash")).unwrap();
        fs::write(root.join(".trash/old.md"), "o").unwrap();

        let fs_impl = LocalFileSystem::new();
        let recursive = fs_impl.list_with_extension(root, "md", true).unwrap();
        assert_eq!(recursive.len(), 2);

        let flat = fs_impl.list_with_extension(root, "md", false).unwrap();
        assert_eq!(flat, vec![root.join("top.md")]);

        let missing = fs_impl
            .list_with_extension(&root.join("nope"), "md", true)
            .unwrap();
        assert!(missing.is_empty());
    }

    #[test]
    fn rename_creates_destination_parents() {
        let dir = tempdir().unwrap();
        let fs_impl = LocalFileSystem::new();
        let from = dir.path().join("old.md");
        let to = dir.path().join("20260102/new.md");
        fs::write(&from, "body").unwrap();

        fs_impl.rename(&from, &to).unwrap();

        assert!(!from.exists());
        assert_eq!(fs::read_to_string(&to).unwrap(), "body");
    }
}
