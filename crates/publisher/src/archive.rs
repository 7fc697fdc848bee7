//! Archiver - moves processed captures from incoming to processed.
//!
//! `<incoming>/<device>/<name>` lands at `<processed>/<device>/<name>`. An
//! existing target is never overwritten: `name (1).ext`, `name (2).ext`, ...

use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};

use crate::error::{PublisherError, Result};

/// Files moved and files left behind for one group
#[derive(Debug, Default)]
pub struct ArchiveReport {
    pub moved: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, PublisherError)>,
}

impl ArchiveReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Archiver {
    incoming_root: PathBuf,
    processed_root: PathBuf,
}

impl Archiver {
    pub fn new(incoming_root: impl Into<PathBuf>, processed_root: impl Into<PathBuf>) -> Self {
        Self {
            incoming_root: incoming_root.into(),
            processed_root: processed_root.into(),
        }
    }

    pub fn incoming_root(&self) -> &Path {
        &self.incoming_root
    }

    pub fn processed_root(&self) -> &Path {
        &self.processed_root
    }

    /// Preferred target for `source`, before collision handling
    pub fn target_for(&self, source: &Path) -> Result<PathBuf> {
        let relative = source
            .strip_prefix(&self.incoming_root)
            .map_err(|_| PublisherError::outside_incoming(source, &self.incoming_root))?;
        Ok(self.processed_root.join(relative))
    }

    /// Move one file. Returns where it landed.
    #[instrument(name = "archive_file", skip(self, source), fields(source = %source.display()))]
    pub async fn archive(&self, source: &Path) -> Result<PathBuf> {
        let preferred = self.target_for(source)?;
        if let Some(parent) = preferred.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut counter = 0u32;
        loop {
            let target = numbered(&preferred, counter);
            match move_no_clobber(source, &target).await {
                Ok(()) => {
                    debug!(target = %target.display(), "archived");
                    return Ok(target);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => counter += 1,
                Err(e) => {
                    return Err(PublisherError::Move {
                        from: source.to_path_buf(),
                        to: target,
                        source: e,
                    })
                }
            }
        }
    }

    /// Move every path, continuing past failures
    pub async fn archive_all<'a, I>(&self, sources: I) -> ArchiveReport
    where
        I: IntoIterator<Item = &'a Path>,
    {
        let mut report = ArchiveReport::default();
        for source in sources {
            match self.archive(source).await {
                Ok(target) => report.moved.push(target),
                Err(e) => {
                    warn!(source = %source.display(), error = %e, "archive failed");
                    report.failed.push((source.to_path_buf(), e));
                }
            }
        }
        report
    }
}

/// `preferred` for 0, else its ` (n)` variant
fn numbered(preferred: &Path, counter: u32) -> PathBuf {
    if counter == 0 {
        return preferred.to_path_buf();
    }
    let stem = preferred
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match preferred.extension() {
        Some(ext) => format!("{stem} ({counter}).{}", ext.to_string_lossy()),
        None => format!("{stem} ({counter})"),
    };
    preferred.with_file_name(name)
}

/// Move `from` to `to`, failing with `AlreadyExists` instead of replacing
/// an existing `to`. Hard link then unlink; across filesystems, copy into a
/// freshly created file.
async fn move_no_clobber(from: &Path, to: &Path) -> io::Result<()> {
    match tokio::fs::hard_link(from, to).await {
        Ok(()) => {}
        Err(e) if matches!(e.kind(), ErrorKind::AlreadyExists | ErrorKind::NotFound) => {
            return Err(e)
        }
        Err(e) => {
            debug!(error = %e, "hard link failed, copying instead");
            copy_new(from, to).await?;
        }
    }
    tokio::fs::remove_file(from).await
}

async fn copy_new(from: &Path, to: &Path) -> io::Result<()> {
    let mut reader = tokio::fs::File::open(from).await?;
    let mut writer = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(to)
        .await?;
    let copied = async {
        tokio::io::copy(&mut reader, &mut writer).await?;
        writer.sync_all().await
    }
    .await;
    if copied.is_err() {
        // partial copy must not occupy the name
        let _ = tokio::fs::remove_file(to).await;
    }
    copied
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (tempfile::TempDir, Archiver) {
        let dir = tempfile::tempdir().unwrap();
        let archiver = Archiver::new(dir.path().join("incoming"), dir.path().join("processed"));
        std::fs::create_dir_all(dir.path().join("incoming/starfit")).unwrap();
        (dir, archiver)
    }

    #[tokio::test]
    async fn test_archive_preserves_device_folder() {
        let (dir, archiver) = setup();
        let source = dir.path().join("incoming/starfit/IMG_20240101_a.jpg");
        std::fs::write(&source, b"jpeg").unwrap();

        let target = archiver.archive(&source).await.unwrap();
        assert_eq!(target, dir.path().join("processed/starfit/IMG_20240101_a.jpg"));
        assert!(!source.exists());
        assert_eq!(std::fs::read(&target).unwrap(), b"jpeg");
    }

    #[tokio::test]
    async fn test_collision_gets_counter_suffix() {
        let (dir, archiver) = setup();
        std::fs::create_dir_all(dir.path().join("processed/starfit")).unwrap();
        std::fs::write(dir.path().join("processed/starfit/a.jpg"), b"old").unwrap();
        std::fs::write(dir.path().join("processed/starfit/a (1).jpg"), b"older").unwrap();

        let source = dir.path().join("incoming/starfit/a.jpg");
        std::fs::write(&source, b"new").unwrap();
        let target = archiver.archive(&source).await.unwrap();

        assert_eq!(target, dir.path().join("processed/starfit/a (2).jpg"));
        assert_eq!(std::fs::read(dir.path().join("processed/starfit/a.jpg")).unwrap(), b"old");
        assert_eq!(std::fs::read(&target).unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_move_never_replaces_existing_target() {
        let (dir, _) = setup();
        let from = dir.path().join("incoming/starfit/a.jpg");
        let to = dir.path().join("incoming/starfit/taken.jpg");
        std::fs::write(&from, b"new").unwrap();
        std::fs::write(&to, b"old").unwrap();

        let err = move_no_clobber(&from, &to).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(std::fs::read(&from).unwrap(), b"new");
        assert_eq!(std::fs::read(&to).unwrap(), b"old");

        let err = copy_new(&from, &to).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(std::fs::read(&to).unwrap(), b"old");
    }

    #[test]
    fn test_numbered_names() {
        let preferred = Path::new("/p/starfit/a.b.jpg");
        assert_eq!(numbered(preferred, 0), preferred);
        assert_eq!(numbered(preferred, 3), Path::new("/p/starfit/a.b (3).jpg"));
        assert_eq!(numbered(Path::new("/p/README"), 1), Path::new("/p/README (1)"));
    }

    #[tokio::test]
    async fn test_archive_all_reports_failures() {
        let (dir, archiver) = setup();
        let present = dir.path().join("incoming/starfit/a.jpg");
        std::fs::write(&present, b"x").unwrap();
        let missing = dir.path().join("incoming/starfit/b.jpg");
        let outside = PathBuf::from("/elsewhere/c.jpg");

        let report = archiver
            .archive_all([present.as_path(), missing.as_path(), outside.as_path()])
            .await;
        assert_eq!(report.moved.len(), 1);
        assert_eq!(report.failed.len(), 2);
        assert!(!report.is_complete());
        assert!(matches!(report.failed[1].1, PublisherError::OutsideIncoming { .. }));
    }
}
