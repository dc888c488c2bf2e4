//! Three-way classification of the remote roster against the master list.
//!
//! Partitions, keyed by username:
//! - `new`      — remote only; materialized from the **remote** records
//! - `departed` — local only; materialized from the **local** records
//! - `existing` — both; materialized from the **local** records, which the
//!   drift merger then updates from remote
//!
//! Duplicate usernames within one snapshot: the first occurrence wins, later
//! ones are left out of classification and reported as [`Duplicate`]s.

use std::collections::{BTreeSet, HashMap, HashSet};

use roster_core::{StudentRecord, Username};

use crate::report::{Snapshot, Warning};

/// A username seen more than once in one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duplicate {
    pub snapshot: Snapshot,
    pub username: Username,
    /// Every occurrence, in input order; the first one is the record kept.
    pub records: Vec<StudentRecord>,
}

impl Duplicate {
    pub fn to_warning(&self) -> Warning {
        Warning::DuplicateUsername {
            username: self.username.clone(),
            snapshot: self.snapshot,
            occurrences: self.records.len(),
        }
    }
}

/// Output of [`reconcile`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub new: Vec<StudentRecord>,
    pub departed: Vec<StudentRecord>,
    pub existing: Vec<StudentRecord>,
    pub duplicates: Vec<Duplicate>,
}

impl Classification {
    /// `true` when there was nothing to compare against.
    pub fn is_initial_run(&self) -> bool {
        self.departed.is_empty() && self.existing.is_empty()
    }
}

/// Classify `remote` and `local` by username. Pure; never fails.
pub fn reconcile(remote: &[StudentRecord], local: &[StudentRecord]) -> Classification {
    let (remote, mut duplicates) = first_occurrences(remote, Snapshot::Remote);
    let (local, local_dupes) = first_occurrences(local, Snapshot::Local);
    duplicates.extend(local_dupes);

    // Initial run: nothing to compare.
    if local.is_empty() {
        return Classification {
            new: remote.into_iter().cloned().collect(),
            departed: vec![],
            existing: vec![],
            duplicates,
        };
    }

    let remote_names: HashSet<&Username> = remote.iter().map(|r| &r.username).collect();
    let local_names: HashSet<&Username> = local.iter().map(|r| &r.username).collect();

    let new = remote
        .iter()
        .filter(|r| !local_names.contains(&r.username))
        .map(|r| (*r).clone())
        .collect();
    let (existing, departed): (Vec<StudentRecord>, Vec<StudentRecord>) = local
        .iter()
        .map(|r| (*r).clone())
        .partition(|r| remote_names.contains(&r.username));

    Classification {
        new,
        departed,
        existing,
        duplicates,
    }
}

/// Index remote records by username for the drift merger (first occurrence wins).
pub fn index_by_username(records: &[StudentRecord]) -> HashMap<Username, StudentRecord> {
    let mut map = HashMap::with_capacity(records.len());
    for record in records {
        map.entry(record.username.clone())
            .or_insert_with(|| record.clone());
    }
    map
}

/// Keep the first record per username; collect every repeated username.
fn first_occurrences(
    records: &[StudentRecord],
    snapshot: Snapshot,
) -> (Vec<&StudentRecord>, Vec<Duplicate>) {
    let mut seen: HashSet<&Username> = HashSet::with_capacity(records.len());
    let mut repeated: BTreeSet<&Username> = BTreeSet::new();
    let mut kept = Vec::with_capacity(records.len());
    for record in records {
        if seen.insert(&record.username) {
            kept.push(record);
        } else {
            repeated.insert(&record.username);
        }
    }

    let duplicates = repeated
        .into_iter()
        .map(|username| Duplicate {
            snapshot,
            username: username.clone(),
            records: records
                .iter()
                .filter(|r| &r.username == username)
                .cloned()
                .collect(),
        })
        .collect();
    (kept, duplicates)
}
