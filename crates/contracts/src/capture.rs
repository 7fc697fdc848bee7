//! Capture artifacts - raw files and the groups they are assembled into.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::DeviceId;

static DATE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{8}").expect("date token pattern"));

static STAMP_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{8}_\d{4}").expect("stamp token pattern"));

/// A file observed in a device hot folder.
///
/// Identity is the path. Every token is derived from the file name once at
/// construction; the struct is never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFile {
    /// Absolute path in the incoming tree
    pub path: PathBuf,

    /// Device owning the hot folder the file was dropped in
    pub device: DeviceId,

    /// Lower-cased extension without the dot (empty when absent)
    pub extension: String,

    /// First 8-digit run in the file name (`YYYYMMDD`)
    pub date_token: Option<String>,

    /// Date+time token (`YYYYMMDD_HHMM`)
    pub stamp_token: Option<String>,

    /// Upper-cased last `_` segment of the file stem (`RR`, `ACC`, `HR`, ...)
    pub sub_kind: Option<String>,
}

impl RawFile {
    /// Build a RawFile, parsing the name tokens.
    pub fn new(path: impl Into<PathBuf>, device: DeviceId) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let date_token = DATE_TOKEN.find(&name).map(|m| m.as_str().to_string());
        let stamp_token = STAMP_TOKEN.find(&name).map(|m| m.as_str().to_string());
        let sub_kind = stem
            .rsplit_once('_')
            .map(|(_, tail)| tail.trim().to_uppercase())
            .filter(|tail| !tail.is_empty());

        Self {
            path,
            device,
            extension,
            date_token,
            stamp_token,
            sub_kind,
        }
    }

    /// File name as transmitted to the record store
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Whether the file is still present at its incoming location
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Key a capture group is bucketed under
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    /// Date+time stamp (fixed-triplet devices)
    Stamp(String),
    /// 8-digit date (multi-photo devices)
    Date(String),
    /// Multi-photo file without a date token
    NoDate,
    /// Single-file device; keyed by file name
    File(String),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stamp(s) | Self::Date(s) | Self::File(s) => write!(f, "{s}"),
            Self::NoDate => write!(f, "<no-date>"),
        }
    }
}

/// A device-scoped bucket of raw files that together form one capture session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureGroup {
    pub device: DeviceId,
    pub key: GroupKey,
    members: BTreeMap<PathBuf, RawFile>,
}

impl CaptureGroup {
    /// Create an empty group
    pub fn new(device: DeviceId, key: GroupKey) -> Self {
        Self {
            device,
            key,
            members: BTreeMap::new(),
        }
    }

    /// Add a member. Returns false when the path is already a member.
    pub fn insert(&mut self, file: RawFile) -> bool {
        if self.members.contains_key(&file.path) {
            return false;
        }
        self.members.insert(file.path.clone(), file);
        true
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.members.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members in path order
    pub fn members(&self) -> impl Iterator<Item = &RawFile> {
        self.members.values()
    }

    /// First member in path order; its name carries the group's date
    pub fn first_member(&self) -> Option<&RawFile> {
        self.members.values().next()
    }

    pub fn member_paths(&self) -> Vec<PathBuf> {
        self.members.keys().cloned().collect()
    }

    /// Number of members whose sub-kind equals `sub_kind` (case-insensitive)
    pub fn sub_kind_count(&self, sub_kind: &str) -> usize {
        self.members
            .values()
            .filter(|f| {
                f.sub_kind
                    .as_deref()
                    .is_some_and(|k| k.eq_ignore_ascii_case(sub_kind))
            })
            .count()
    }

    /// The member carrying `sub_kind`, if exactly one does
    pub fn member_for_sub_kind(&self, sub_kind: &str) -> Option<&RawFile> {
        if self.sub_kind_count(sub_kind) != 1 {
            return None;
        }
        self.members.values().find(|f| {
            f.sub_kind
                .as_deref()
                .is_some_and(|k| k.eq_ignore_ascii_case(sub_kind))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_file_tokens() {
        let file = RawFile::new("/in/Polar/20240101_0800_RR.txt", "polar".into());
        assert_eq!(file.extension, "txt");
        assert_eq!(file.date_token.as_deref(), Some("20240101"));
        assert_eq!(file.stamp_token.as_deref(), Some("20240101_0800"));
        assert_eq!(file.sub_kind.as_deref(), Some("RR"));
        assert_eq!(file.file_name(), "20240101_0800_RR.txt");
    }

    #[test]
    fn test_raw_file_without_tokens() {
        let file = RawFile::new("/in/starfit/IMG.JPG", "starfit".into());
        assert_eq!(file.extension, "jpg");
        assert!(file.date_token.is_none());
        assert!(file.stamp_token.is_none());
        assert!(file.sub_kind.is_none());
    }

    #[test]
    fn test_group_insert_is_idempotent() {
        let mut group = CaptureGroup::new("starfit".into(), GroupKey::Date("20240101".into()));
        let file = RawFile::new("/in/starfit/20240101_a.jpg", "starfit".into());
        assert!(group.insert(file.clone()));
        assert!(!group.insert(file));
        assert_eq!(group.len(), 1);
    }

    #[test]
    fn test_member_for_sub_kind_requires_uniqueness() {
        let mut group = CaptureGroup::new("polar".into(), GroupKey::Stamp("20240101_0800".into()));
        group.insert(RawFile::new("/in/Polar/20240101_0800_RR.txt", "polar".into()));
        assert!(group.member_for_sub_kind("rr").is_some());

        group.insert(RawFile::new("/in/Polar/copy_20240101_0800_RR.txt", "polar".into()));
        assert_eq!(group.sub_kind_count("RR"), 2);
        assert!(group.member_for_sub_kind("RR").is_none());
    }

    #[test]
    fn test_group_key_display() {
        assert_eq!(GroupKey::NoDate.to_string(), "<no-date>");
        assert_eq!(GroupKey::Date("20240101".into()).to_string(), "20240101");
    }
}
