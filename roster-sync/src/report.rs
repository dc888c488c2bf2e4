//! Structured run narrative.
//!
//! Every component appends typed entries to a [`RunReport`] passed by `&mut`.
//! Summaries are computed from those entries, never from formatted text.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use roster_core::{ExecutionMode, Username};

// ---------------------------------------------------------------------------
// Field drift
// ---------------------------------------------------------------------------

/// Fields compared between the master list and the remote roster, in
/// comparison order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedField {
    YearLevel,
    ClassName,
    Email,
}

impl TrackedField {
    pub const ALL: [TrackedField; 3] = [
        TrackedField::YearLevel,
        TrackedField::ClassName,
        TrackedField::Email,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TrackedField::YearLevel => "year_level",
            TrackedField::ClassName => "class_name",
            TrackedField::Email => "email",
        }
    }
}

impl fmt::Display for TrackedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One field overwritten on an existing record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeLogEntry {
    pub username: Username,
    pub field: TrackedField,
    pub old: String,
    pub new: String,
}

impl fmt::Display for ChangeLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} {:?} -> {:?}",
            self.username, self.field, self.old, self.new
        )
    }
}

// ---------------------------------------------------------------------------
// Provisioning
// ---------------------------------------------------------------------------

/// A directory mutation attempted for one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "service", rename_all = "snake_case")]
pub enum Operation {
    SetPassword,
    EnableService(String),
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::SetPassword => write!(f, "set-password"),
            Operation::EnableService(service) => write!(f, "enable-service({service})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Succeeded,
    /// Dry run: the call was logged but not issued.
    Simulated,
    Failed { detail: String },
}

/// Result of one directory mutation. Never carries the secret itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisioningOutcome {
    pub username: Username,
    pub operation: Operation,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

impl ProvisioningOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self.status, OutcomeStatus::Failed { .. })
    }
}

impl fmt::Display for ProvisioningOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            OutcomeStatus::Succeeded => write!(f, "{}: {} ok", self.username, self.operation),
            OutcomeStatus::Simulated => {
                write!(f, "{}: {} simulated", self.username, self.operation)
            }
            OutcomeStatus::Failed { detail } => {
                write!(f, "{}: {} failed: {detail}", self.username, self.operation)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Which snapshot a data-quality finding came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Snapshot {
    Remote,
    Local,
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Snapshot::Remote => write!(f, "remote roster"),
            Snapshot::Local => write!(f, "master list"),
        }
    }
}

/// Non-fatal data-quality finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// Classified as existing but no remote counterpart at merge time.
    ExistingWithoutRemote { username: Username },
    /// Username seen more than once in one snapshot; the first occurrence was kept.
    DuplicateUsername {
        username: Username,
        snapshot: Snapshot,
        occurrences: usize,
    },
    /// The master list was saved but `duplicates.csv` could not be written.
    DuplicatesExportFailed { detail: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::ExistingWithoutRemote { username } => {
                write!(f, "{username}: existing record has no remote match; kept unchanged")
            }
            Warning::DuplicateUsername {
                username,
                snapshot,
                occurrences,
            } => write!(
                f,
                "{username}: appears {occurrences} times in {snapshot}; first occurrence kept"
            ),
            Warning::DuplicatesExportFailed { detail } => {
                write!(f, "duplicate rows not exported: {detail}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// RunReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReportEntry {
    Change(ChangeLogEntry),
    Provisioning(ProvisioningOutcome),
    Warning(Warning),
}

/// Partition sizes produced by the reconciler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassificationCounts {
    pub new: usize,
    pub departed: usize,
    pub existing: usize,
    /// Usernames dropped from the master list this run.
    pub departed_usernames: Vec<Username>,
}

/// Typed counts for summary rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub new: usize,
    pub departed: usize,
    pub existing: usize,
    pub changes: usize,
    pub provisioned: usize,
    pub simulated: usize,
    pub failed: usize,
    pub warnings: usize,
}

/// Append-only, ordered log of everything one run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub org_id: String,
    pub mode: ExecutionMode,
    pub classification: ClassificationCounts,
    pub entries: Vec<ReportEntry>,
}

impl RunReport {
    pub fn new(org_id: impl Into<String>, mode: ExecutionMode) -> Self {
        Self {
            started_at: Utc::now(),
            org_id: org_id.into(),
            mode,
            classification: ClassificationCounts::default(),
            entries: Vec::new(),
        }
    }

    pub fn record_change(&mut self, change: ChangeLogEntry) {
        self.entries.push(ReportEntry::Change(change));
    }

    pub fn record_outcome(&mut self, outcome: ProvisioningOutcome) {
        self.entries.push(ReportEntry::Provisioning(outcome));
    }

    pub fn record_warning(&mut self, warning: Warning) {
        tracing::warn!("{warning}");
        self.entries.push(ReportEntry::Warning(warning));
    }

    pub fn changes(&self) -> impl Iterator<Item = &ChangeLogEntry> {
        self.entries.iter().filter_map(|e| match e {
            ReportEntry::Change(c) => Some(c),
            _ => None,
        })
    }

    pub fn outcomes(&self) -> impl Iterator<Item = &ProvisioningOutcome> {
        self.entries.iter().filter_map(|e| match e {
            ReportEntry::Provisioning(o) => Some(o),
            _ => None,
        })
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Warning> {
        self.entries.iter().filter_map(|e| match e {
            ReportEntry::Warning(w) => Some(w),
            _ => None,
        })
    }

    /// `true` when the run finished but something needs a human to look at it.
    pub fn has_problems(&self) -> bool {
        self.warnings().next().is_some() || self.outcomes().any(ProvisioningOutcome::is_failure)
    }

    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary {
            new: self.classification.new,
            departed: self.classification.departed,
            existing: self.classification.existing,
            ..RunSummary::default()
        };
        for entry in &self.entries {
            match entry {
                ReportEntry::Change(_) => summary.changes += 1,
                ReportEntry::Warning(_) => summary.warnings += 1,
                ReportEntry::Provisioning(o) => match o.status {
                    OutcomeStatus::Succeeded => summary.provisioned += 1,
                    OutcomeStatus::Simulated => summary.simulated += 1,
                    OutcomeStatus::Failed { .. } => summary.failed += 1,
                },
            }
        }
        summary
    }
}
