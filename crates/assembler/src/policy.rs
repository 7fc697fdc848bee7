//! Grouping policy evaluation: which bucket a file belongs to and when a
//! bucket is complete.

use contracts::{CaptureGroup, GroupKey, GroupingPolicy, RawFile};

/// Why a file was not admitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// File belongs to another device
    ForeignDevice,
    /// Triplet file without a `YYYYMMDD_HHMM` stamp
    MissingStamp,
    /// Triplet file whose sub-kind is not one of the required ones
    UnexpectedSubKind(Option<String>),
    /// Already processed and archived
    Retired,
    /// Processing failed; waits for the next full rescan
    Abandoned,
}

impl IgnoreReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ForeignDevice => "foreign_device",
            Self::MissingStamp => "missing_stamp",
            Self::UnexpectedSubKind(_) => "unexpected_sub_kind",
            Self::Retired => "retired",
            Self::Abandoned => "abandoned",
        }
    }
}

/// Bucket key of `file` under `policy`
pub fn key_for(policy: &GroupingPolicy, file: &RawFile) -> Result<GroupKey, IgnoreReason> {
    match policy {
        GroupingPolicy::Triplet { sub_kinds } => {
            let stamp = file.stamp_token.clone().ok_or(IgnoreReason::MissingStamp)?;
            let known = file
                .sub_kind
                .as_deref()
                .is_some_and(|k| sub_kinds.iter().any(|s| s.eq_ignore_ascii_case(k)));
            if !known {
                return Err(IgnoreReason::UnexpectedSubKind(file.sub_kind.clone()));
            }
            Ok(GroupKey::Stamp(stamp))
        }
        GroupingPolicy::MultiPhoto { .. } => Ok(file
            .date_token
            .clone()
            .map(GroupKey::Date)
            .unwrap_or(GroupKey::NoDate)),
        GroupingPolicy::Single => Ok(GroupKey::File(file.file_name())),
    }
}

/// Completeness predicate
pub fn is_satisfied(policy: &GroupingPolicy, group: &CaptureGroup) -> bool {
    match policy {
        GroupingPolicy::Triplet { sub_kinds } => sub_kinds
            .iter()
            .all(|kind| group.sub_kind_count(kind) == 1),
        GroupingPolicy::MultiPhoto { min_members } => group.len() >= *min_members,
        GroupingPolicy::Single => !group.is_empty(),
    }
}

/// Whether a ready group keeps accepting same-key files
pub fn accepts_late_members(policy: &GroupingPolicy) -> bool {
    matches!(policy, GroupingPolicy::MultiPhoto { .. })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triplet() -> GroupingPolicy {
        GroupingPolicy::Triplet {
            sub_kinds: vec!["RR".into(), "ACC".into(), "HR".into()],
        }
    }

    fn polar(name: &str) -> RawFile {
        RawFile::new(format!("/in/Polar/{name}"), "polar".into())
    }

    #[test]
    fn test_triplet_keys() {
        let p = triplet();
        assert_eq!(
            key_for(&p, &polar("20240101_0800_RR.txt")),
            Ok(GroupKey::Stamp("20240101_0800".into()))
        );
        assert_eq!(
            key_for(&p, &polar("20240101_RR.txt")),
            Err(IgnoreReason::MissingStamp)
        );
        assert_eq!(
            key_for(&p, &polar("20240101_0800_ECG.txt")),
            Err(IgnoreReason::UnexpectedSubKind(Some("ECG".into())))
        );
    }

    #[test]
    fn test_multi_photo_keys() {
        let p = GroupingPolicy::MultiPhoto { min_members: 2 };
        let dated = RawFile::new("/in/starfit/IMG_20240101_1.jpg", "starfit".into());
        let undated = RawFile::new("/in/starfit/IMG_1.jpg", "starfit".into());
        assert_eq!(key_for(&p, &dated), Ok(GroupKey::Date("20240101".into())));
        assert_eq!(key_for(&p, &undated), Ok(GroupKey::NoDate));
    }

    #[test]
    fn test_triplet_predicate_needs_one_of_each() {
        let p = triplet();
        let key = GroupKey::Stamp("20240101_0800".into());
        let mut group = CaptureGroup::new("polar".into(), key);
        group.insert(polar("20240101_0800_RR.txt"));
        group.insert(polar("20240101_0800_ACC.txt"));
        assert!(!is_satisfied(&p, &group));
        group.insert(polar("20240101_0800_HR.txt"));
        assert!(is_satisfied(&p, &group));
        group.insert(polar("copy_20240101_0800_HR.txt"));
        assert!(!is_satisfied(&p, &group));
    }
}
