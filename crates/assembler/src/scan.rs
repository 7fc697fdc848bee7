//! Hot folder listing for full rescans.

use std::path::Path;

use contracts::{DeviceId, RawFile};
use tracing::debug;

use crate::error::{AssemblerError, Result};

/// Files directly under `dir` whose extension is in `extensions`
/// (case-insensitive), sorted by path. A missing directory lists as empty.
pub fn scan_directory(dir: &Path, device: &DeviceId, extensions: &[String]) -> Result<Vec<RawFile>> {
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "hot folder missing, nothing to scan");
        return Ok(Vec::new());
    }

    let entries = std::fs::read_dir(dir).map_err(|e| AssemblerError::scan(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| AssemblerError::scan(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let file = RawFile::new(path, device.clone());
        if extensions
            .iter()
            .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(&file.extension))
        {
            files.push(file);
        }
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_filters_extensions() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.JPG", "a.png", "notes.txt", "c.jpeg"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.jpg")).unwrap();

        let exts = vec!["jpg".to_string(), "jpeg".to_string(), ".png".to_string()];
        let files = scan_directory(dir.path(), &"starfit".into(), &exts).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.file_name()).collect();
        assert_eq!(names, ["a.png", "b.JPG", "c.jpeg"]);
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let files =
            scan_directory(Path::new("/nonexistent/hot"), &"polar".into(), &["txt".to_string()])
                .unwrap();
        assert!(files.is_empty());
    }
}
