//! CaptureSetAssembler - per-device grouping state machine.
//!
//! ```text
//! observe ──> pending ──(predicate holds)──> ready ──consume──> retired (if still on disk)
//!                                              └──abandon──> abandoned
//! ```
//! `rescan` rebuilds everything from a directory listing.

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use contracts::{CaptureGroup, DeviceId, GroupKey, GroupingPolicy, RawFile};
use tracing::{debug, instrument};

use crate::policy::{accepts_late_members, is_satisfied, key_for, IgnoreReason};

/// Result of observing one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// Added to a group that is still incomplete (or to a ready group that
    /// accepts late members)
    Admitted(GroupKey),
    /// Path already tracked
    Duplicate,
    Ignored(IgnoreReason),
    /// The file completed its group, which is now ready
    Fired(GroupKey),
}

/// Groups files of one device into capture sets
#[derive(Debug)]
pub struct CaptureSetAssembler {
    device: DeviceId,
    policy: GroupingPolicy,
    pending: BTreeMap<GroupKey, CaptureGroup>,
    ready: BTreeMap<GroupKey, CaptureGroup>,
    /// Members of consumed groups that were still in the hot folder
    retired: HashSet<PathBuf>,
    /// Members of abandoned groups; cleared by `rescan`
    abandoned: HashSet<PathBuf>,
}

impl CaptureSetAssembler {
    pub fn new(device: DeviceId, policy: GroupingPolicy) -> Self {
        Self {
            device,
            policy,
            pending: BTreeMap::new(),
            ready: BTreeMap::new(),
            retired: HashSet::new(),
            abandoned: HashSet::new(),
        }
    }

    pub fn device(&self) -> &DeviceId {
        &self.device
    }

    pub fn policy(&self) -> &GroupingPolicy {
        &self.policy
    }

    /// Track a file. Idempotent by path.
    pub fn observe(&mut self, file: RawFile) -> Observation {
        if file.device != self.device {
            return Observation::Ignored(IgnoreReason::ForeignDevice);
        }
        if self.retired.contains(&file.path) {
            return Observation::Ignored(IgnoreReason::Retired);
        }
        if self.abandoned.contains(&file.path) {
            return Observation::Ignored(IgnoreReason::Abandoned);
        }
        if self.is_tracked(&file) {
            return Observation::Duplicate;
        }

        let key = match key_for(&self.policy, &file) {
            Ok(key) => key,
            Err(reason) => {
                debug!(device = %self.device, file = %file.path.display(), reason = reason.as_str(), "file ignored");
                return Observation::Ignored(reason);
            }
        };

        if accepts_late_members(&self.policy) {
            if let Some(group) = self.ready.get_mut(&key) {
                group.insert(file);
                return Observation::Admitted(key);
            }
        }

        let group = self
            .pending
            .entry(key.clone())
            .or_insert_with(|| CaptureGroup::new(self.device.clone(), key.clone()));
        group.insert(file);

        if self.promote(&key) {
            Observation::Fired(key)
        } else {
            Observation::Admitted(key)
        }
    }

    /// Rebuild from a full listing. Clears pending, ready, retired and
    /// abandoned state first. Returns the number of ready groups.
    #[instrument(level = "debug", skip_all, fields(device = %self.device))]
    pub fn rescan<I>(&mut self, files: I) -> usize
    where
        I: IntoIterator<Item = RawFile>,
    {
        self.pending.clear();
        self.ready.clear();
        self.retired.clear();
        self.abandoned.clear();
        for file in files {
            self.observe(file);
        }
        debug!(pending = self.pending.len(), ready = self.ready.len(), "rescan complete");
        self.ready.len()
    }

    /// Snapshot of ready groups ordered by key. Does not change state.
    pub fn ready_groups(&self) -> Vec<CaptureGroup> {
        self.ready.values().cloned().collect()
    }

    /// Drop a processed group. Members still on disk (their archive move
    /// failed) are retired; moved paths are free for a later capture of the
    /// same name.
    pub fn consume(&mut self, key: &GroupKey) -> Option<CaptureGroup> {
        let group = self.ready.remove(key)?;
        let left_behind: Vec<PathBuf> = group
            .member_paths()
            .into_iter()
            .filter(|path| path.exists())
            .collect();
        if !left_behind.is_empty() {
            debug!(device = %self.device, key = %key, files = left_behind.len(), "members retired in place");
        }
        self.retired.extend(left_behind);
        self.promote(key);
        Some(group)
    }

    /// Drop a failed group; its members are ignored until the next rescan
    pub fn abandon(&mut self, key: &GroupKey) -> Option<CaptureGroup> {
        let group = self.ready.remove(key)?;
        self.abandoned.extend(group.member_paths());
        self.promote(key);
        Some(group)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn ready_len(&self) -> usize {
        self.ready.len()
    }

    fn is_tracked(&self, file: &RawFile) -> bool {
        self.pending
            .values()
            .chain(self.ready.values())
            .any(|g| g.contains(&file.path))
    }

    /// Move the pending group under `key` to ready if complete and the ready
    /// slot is free.
    fn promote(&mut self, key: &GroupKey) -> bool {
        if self.ready.contains_key(key) {
            return false;
        }
        let complete = self
            .pending
            .get(key)
            .is_some_and(|g| is_satisfied(&self.policy, g));
        if !complete {
            return false;
        }
        if let Some(group) = self.pending.remove(key) {
            debug!(device = %self.device, key = %key, members = group.len(), "capture group ready");
            self.ready.insert(key.clone(), group);
            return true;
        }
        false
    }
}
