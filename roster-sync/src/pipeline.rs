//! Single-pass reconcile → merge → provision → persist run.
//!
//! This is the entrypoint shared by `roster sync` and `roster diff`.
//! Fatal errors (roster fetch, master list I/O) abort before anything is
//! saved; per-record directory failures and a failed duplicates export only
//! show up in the [`RunReport`].

use std::path::PathBuf;

use roster_core::{
    derived_email, master_list, ExecutionMode, MasterListStore, RosterConfig, SaveOutcome,
    StudentRecord,
};

use crate::directory::AccountDirectory;
use crate::error::SyncError;
use crate::merge::merge_existing;
use crate::provision::Provisioner;
use crate::reconcile::{index_by_username, reconcile};
use crate::report::{ClassificationCounts, RunReport, Warning};
use crate::secret::SecretSource;

/// Settings resolved before the pipeline runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub org_id: String,
    pub email_domain: String,
    pub mode: ExecutionMode,
    pub services: Vec<String>,
}

impl RunOptions {
    /// Options from `config`, with `mode_override` (e.g. `--dry-run`) taking precedence.
    pub fn from_config(config: &RosterConfig, mode_override: Option<ExecutionMode>) -> Self {
        Self {
            org_id: config.org_id.clone(),
            email_domain: config.email_domain.clone(),
            mode: mode_override.unwrap_or(config.mode),
            services: config.services.clone(),
        }
    }
}

/// Everything a finished run produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub report: RunReport,
    /// Master list as loaded at the start of the run.
    pub previous: Vec<StudentRecord>,
    /// Reconciled, merged, provisioned list, sorted by username.
    pub records: Vec<StudentRecord>,
    /// `None` in dry-run mode.
    pub save: Option<SaveOutcome>,
    pub duplicates_file: Option<PathBuf>,
}

/// Run the pipeline once.
///
/// In [`ExecutionMode::Live`] the store's `save` is called exactly once with
/// the final list. In dry-run mode nothing outside memory is touched.
pub fn run<D, M, S>(
    directory: D,
    store: &M,
    secrets: S,
    options: &RunOptions,
) -> Result<RunOutcome, SyncError>
where
    D: AccountDirectory,
    M: MasterListStore + ?Sized,
    S: SecretSource,
{
    let mut report = RunReport::new(options.org_id.clone(), options.mode);
    tracing::info!(org_id = %options.org_id, mode = %options.mode, "starting roster run");

    let remote = directory
        .fetch_roster(&options.org_id)
        .map_err(|e| SyncError::from_fetch(&options.org_id, e))?;
    let previous = store.load()?;
    tracing::info!(
        "fetched {} remote record(s); master list has {}",
        remote.len(),
        previous.len()
    );

    let classification = reconcile(&remote, &previous);
    if classification.is_initial_run() && !remote.is_empty() {
        tracing::info!("no prior master list entries; every remote record is new");
    }
    let duplicate_records: Vec<StudentRecord> = classification
        .duplicates
        .iter()
        .flat_map(|d| d.records.iter().cloned())
        .collect();
    for duplicate in &classification.duplicates {
        report.record_warning(duplicate.to_warning());
    }
    report.classification = ClassificationCounts {
        new: classification.new.len(),
        departed: classification.departed.len(),
        existing: classification.existing.len(),
        departed_usernames: classification
            .departed
            .iter()
            .map(|r| r.username.clone())
            .collect(),
    };
    for gone in &classification.departed {
        tracing::info!(username = %gone.username, "departed; dropping from master list");
    }

    let remote_index = index_by_username(&remote);
    let merged = merge_existing(classification.existing, &remote_index, &options.email_domain);
    for change in merged.changes {
        report.record_change(change);
    }
    for anomaly in merged.anomalies {
        report.record_warning(anomaly);
    }
    let mut existing = merged.records;

    let mut new_records: Vec<StudentRecord> = classification
        .new
        .into_iter()
        .map(|r| prepare_new(r, &options.email_domain))
        .collect();

    let mut provisioner = Provisioner::new(&directory, secrets, options.mode, options.services.clone());
    for outcome in provisioner.provision(&mut new_records, &mut existing) {
        report.record_outcome(outcome);
    }

    new_records.extend(existing);
    let records = master_list::normalize(&new_records);

    let (save, duplicates_file) = match options.mode {
        ExecutionMode::Live => {
            let save = store.save(&records)?;
            // The master list is committed at this point; the side file must not fail the run.
            let duplicates_file = match store.export_duplicates(&duplicate_records) {
                Ok(path) => path,
                Err(err) => {
                    report.record_warning(Warning::DuplicatesExportFailed {
                        detail: err.to_string(),
                    });
                    None
                }
            };
            (Some(save), duplicates_file)
        }
        ExecutionMode::DryRun => {
            tracing::info!("[dry-run] master list not written ({} rows)", records.len());
            (None, None)
        }
    };

    let summary = report.summary();
    tracing::info!(
        new = summary.new,
        departed = summary.departed,
        existing = summary.existing,
        changes = summary.changes,
        failed = summary.failed,
        warnings = summary.warnings,
        "roster run finished"
    );

    Ok(RunOutcome {
        report,
        previous,
        records,
        save,
        duplicates_file,
    })
}

/// A newcomer starts with the derived email and no secret of its own.
fn prepare_new(mut record: StudentRecord, email_domain: &str) -> StudentRecord {
    record.email = derived_email(&record.username, email_domain);
    record.secret = None;
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_override_beats_configured_mode() {
        let mut cfg = RosterConfig::new("8472", "school.test", "https://d.test");
        cfg.mode = ExecutionMode::Live;

        let opts = RunOptions::from_config(&cfg, Some(ExecutionMode::DryRun));
        assert_eq!(opts.mode, ExecutionMode::DryRun);
        assert_eq!(RunOptions::from_config(&cfg, None).mode, ExecutionMode::Live);
        assert_eq!(opts.services, vec!["service-a", "service-b"]);
    }

    #[test]
    fn new_records_get_derived_email_and_no_secret() {
        let r = StudentRecord {
            username: "amy".into(),
            first_name: "Amy".into(),
            last_name: "Lee".into(),
            year_level: "1".into(),
            class_name: "1A".into(),
            email: "amy.lee@personal.test".into(),
            secret: Some("leaked".into()),
            remote_ref: Some("dir-1".into()),
        };
        let r = prepare_new(r, "school.test");
        assert_eq!(r.email, "amy@school.test");
        assert!(r.secret.is_none());
        assert_eq!(r.remote_ref.as_deref(), Some("dir-1"));
    }
}
