//! Directory tree snapshots and their difference as filesystem events.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use contracts::FsEvent;
use walkdir::WalkDir;

use crate::error::{Result, WatcherError};

/// What a poll remembers about a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStamp {
    pub len: u64,
    pub modified: Option<SystemTime>,
}

/// Every regular file under a root, recursively
pub type Snapshot = BTreeMap<PathBuf, FileStamp>;

/// Walk `root` recursively. A missing root yields an empty snapshot.
pub fn take_snapshot(root: &Path) -> Result<Snapshot> {
    let mut snapshot = Snapshot::new();
    if !root.is_dir() {
        return Ok(snapshot);
    }
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            // vanished between listing and stat
            Err(e) if e.io_error().is_some_and(|io| io.kind() == ErrorKind::NotFound) => continue,
            Err(e) => {
                return Err(WatcherError::Scan {
                    path: e.path().unwrap_or(root).to_path_buf(),
                    source: e.into(),
                })
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(meta) = entry.metadata() else {
            continue;
        };
        snapshot.insert(
            entry.into_path(),
            FileStamp {
                len: meta.len(),
                modified: meta.modified().ok(),
            },
        );
    }
    Ok(snapshot)
}

/// Events turning `old` into `new`: Created for new paths, Modified for
/// changed size or mtime. Removals produce nothing.
pub fn diff(old: &Snapshot, new: &Snapshot) -> Vec<FsEvent> {
    new.iter()
        .filter_map(|(path, stamp)| match old.get(path) {
            None => Some(FsEvent::created(path.clone())),
            Some(prev) if prev != stamp => Some(FsEvent::modified(path.clone())),
            Some(_) => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::FsEventKind;

    fn stamp(len: u64) -> FileStamp {
        FileStamp {
            len,
            modified: None,
        }
    }

    #[test]
    fn test_diff() {
        let mut old = Snapshot::new();
        old.insert("/in/a.jpg".into(), stamp(1));
        old.insert("/in/b.jpg".into(), stamp(1));
        old.insert("/in/gone.jpg".into(), stamp(1));

        let mut new = Snapshot::new();
        new.insert("/in/a.jpg".into(), stamp(1));
        new.insert("/in/b.jpg".into(), stamp(2));
        new.insert("/in/c.jpg".into(), stamp(1));

        let events = diff(&old, &new);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, FsEventKind::Modified);
        assert_eq!(events[0].path, PathBuf::from("/in/b.jpg"));
        assert_eq!(events[1].kind, FsEventKind::Created);
        assert!(!events[1].is_dir);
    }

    #[test]
    fn test_snapshot_is_recursive() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("Polar/nested")).unwrap();
        std::fs::write(dir.path().join("Polar/a_RR.txt"), b"ts;RR\n").unwrap();
        std::fs::write(dir.path().join("Polar/nested/b.txt"), b"").unwrap();

        let snapshot = take_snapshot(dir.path()).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[&dir.path().join("Polar/a_RR.txt")].len, 6);
    }

    #[test]
    fn test_directories_are_not_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("starfit/empty")).unwrap();
        assert!(take_snapshot(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_root_is_empty() {
        assert!(take_snapshot(Path::new("/nonexistent/root")).unwrap().is_empty());
    }
}
