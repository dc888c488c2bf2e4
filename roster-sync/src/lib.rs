//! # roster-sync
//!
//! Reconciliation and provisioning engine.
//!
//! Call [`pipeline::run`] with an [`AccountDirectory`], a
//! [`MasterListStore`](roster_core::MasterListStore) and a [`SecretSource`] to
//! classify the remote roster against the master list, merge drift, provision
//! accounts and persist the result.

pub mod diff;
pub mod directory;
pub mod error;
pub mod merge;
pub mod pipeline;
pub mod provision;
pub mod reconcile;
pub mod report;
pub mod secret;

pub use diff::master_list_diff;
pub use directory::AccountDirectory;
pub use error::{DirectoryError, SyncError, SyncErrorKind};
pub use merge::{merge_existing, MergeOutcome};
pub use pipeline::{run, RunOptions, RunOutcome};
pub use provision::Provisioner;
pub use reconcile::{reconcile, Classification, Duplicate};
pub use report::{
    ChangeLogEntry, Operation, OutcomeStatus, ProvisioningOutcome, ReportEntry, RunReport,
    RunSummary, TrackedField, Warning,
};
pub use secret::{SecretGenerator, SecretSource, SECRET_MASK};
