//! Remote-wins drift merge for records present on both sides.
//!
//! Compared fields, each independently and in this order: `year_level`,
//! `class_name`, `email`. The email target is always the derived
//! `"<username>@<domain>"`, never the remote literal. `username` is never
//! touched and no value is invented: every overwrite comes from the matched
//! remote record or its derived email.

use std::collections::HashMap;

use roster_core::{derived_email, StudentRecord, Username};

use crate::report::{ChangeLogEntry, TrackedField, Warning};

/// Output of [`merge_existing`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Same records, same order, updated from remote.
    pub records: Vec<StudentRecord>,
    /// One entry per overwritten field, in input order.
    pub changes: Vec<ChangeLogEntry>,
    /// Existing records that had no remote counterpart; passed through as-is.
    pub anomalies: Vec<Warning>,
}

/// Sync tracked fields of `existing` records from their remote counterparts.
pub fn merge_existing(
    existing: Vec<StudentRecord>,
    remote_by_username: &HashMap<Username, StudentRecord>,
    email_domain: &str,
) -> MergeOutcome {
    let mut outcome = MergeOutcome {
        records: Vec::with_capacity(existing.len()),
        ..MergeOutcome::default()
    };

    for mut local in existing {
        let Some(remote) = remote_by_username.get(&local.username) else {
            outcome.anomalies.push(Warning::ExistingWithoutRemote {
                username: local.username.clone(),
            });
            outcome.records.push(local);
            continue;
        };

        for field in TrackedField::ALL {
            let expected = expected_value(field, remote, email_domain);
            let slot = field_mut(&mut local, field);
            if *slot != expected {
                let old = std::mem::replace(slot, expected.clone());
                tracing::info!(username = %local.username, field = %field, "{old:?} -> {expected:?}");
                outcome.changes.push(ChangeLogEntry {
                    username: local.username.clone(),
                    field,
                    old,
                    new: expected,
                });
            }
        }
        outcome.records.push(local);
    }

    outcome
}

fn expected_value(field: TrackedField, remote: &StudentRecord, email_domain: &str) -> String {
    match field {
        TrackedField::YearLevel => remote.year_level.clone(),
        TrackedField::ClassName => remote.class_name.clone(),
        TrackedField::Email => derived_email(&remote.username, email_domain),
    }
}

fn field_mut(record: &mut StudentRecord, field: TrackedField) -> &mut String {
    match field {
        TrackedField::YearLevel => &mut record.year_level,
        TrackedField::ClassName => &mut record.class_name,
        TrackedField::Email => &mut record.email,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::index_by_username;

    const DOMAIN: &str = "school.test";

    fn rec(username: &str, year: &str, class: &str, email: &str, secret: Option<&str>) -> StudentRecord {
        StudentRecord {
            username: Username::from(username),
            first_name: "First".into(),
            last_name: "Last".into(),
            year_level: year.into(),
            class_name: class.into(),
            email: email.into(),
            secret: secret.map(str::to_owned),
            remote_ref: None,
        }
    }

    #[test]
    fn promotes_year_and_class_and_fixes_email() {
        let local = vec![rec("amy", "1", "1A", "old@x", Some("Pear.1111"))];
        let remote = index_by_username(&[rec("amy", "2", "2B", "whatever@remote", None)]);

        let out = merge_existing(local, &remote, DOMAIN);
        let amy = &out.records[0];
        assert_eq!(amy.year_level, "2");
        assert_eq!(amy.class_name, "2B");
        assert_eq!(amy.email, "amy@school.test");
        assert_eq!(amy.secret.as_deref(), Some("Pear.1111"));

        let fields: Vec<_> = out.changes.iter().map(|c| c.field).collect();
        assert_eq!(
            fields,
            vec![TrackedField::YearLevel, TrackedField::ClassName, TrackedField::Email]
        );
        assert_eq!(out.changes[2].old, "old@x");
    }

    #[test]
    fn matching_email_produces_no_email_change() {
        let local = vec![rec("amy", "1", "1A", "amy@school.test", None)];
        let remote = index_by_username(&[rec("amy", "2", "1A", "", None)]);
        let out = merge_existing(local, &remote, DOMAIN);
        assert_eq!(out.changes.len(), 1);
        assert_eq!(out.changes[0].field, TrackedField::YearLevel);
    }

    #[test]
    fn second_merge_is_a_noop() {
        let local = vec![rec("amy", "1", "1A", "old@x", None)];
        let remote = index_by_username(&[rec("amy", "2", "2B", "", None)]);

        let first = merge_existing(local, &remote, DOMAIN);
        assert_eq!(first.changes.len(), 3);
        let second = merge_existing(first.records.clone(), &remote, DOMAIN);
        assert!(second.changes.is_empty());
        assert_eq!(second.records, first.records);
    }

    #[test]
    fn missing_remote_counterpart_passes_through_with_warning() {
        let local = vec![
            rec("amy", "1", "1A", "old@x", None),
            rec("bob", "3", "3C", "bob@school.test", None),
        ];
        let remote = index_by_username(&[rec("bob", "4", "4C", "", None)]);

        let out = merge_existing(local, &remote, DOMAIN);
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.records[0].email, "old@x", "amy untouched");
        assert_eq!(
            out.anomalies,
            vec![Warning::ExistingWithoutRemote {
                username: Username::from("amy")
            }]
        );
        assert_eq!(out.changes.len(), 2);
        assert!(out.changes.iter().all(|c| c.username.as_str() == "bob"));
    }

    #[test]
    fn names_and_identity_are_not_synced() {
        let local = vec![rec("amy", "1", "1A", "amy@school.test", None)];
        let mut remote_amy = rec("amy", "1", "1A", "", None);
        remote_amy.first_name = "Amelia".into();
        let remote = index_by_username(&[remote_amy]);

        let out = merge_existing(local, &remote, DOMAIN);
        assert!(out.changes.is_empty());
        assert_eq!(out.records[0].first_name, "First");
        assert_eq!(out.records[0].username.as_str(), "amy");
    }
}
