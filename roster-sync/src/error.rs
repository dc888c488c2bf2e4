//! Error types for roster-sync.

use thiserror::Error;

use roster_core::StoreError;

/// Failure of a single [`AccountDirectory`](crate::AccountDirectory) call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    /// Remote unreachable, or it answered with a payload we could not decode.
    #[error("directory unavailable: {0}")]
    Unavailable(String),

    /// Credentials were rejected.
    #[error("directory authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The directory refused a mutation.
    #[error("directory rejected request (status {status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Machine-usable classification of a fatal [`SyncError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncErrorKind {
    DirectoryUnavailable,
    AuthenticationFailed,
    Store,
}

/// Run-aborting errors. Per-record directory failures never surface here.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Roster fetch could not reach the directory or decode its answer.
    #[error("cannot fetch roster for org '{org_id}': {message}")]
    DirectoryUnavailable { org_id: String, message: String },

    /// Roster fetch was refused for bad credentials.
    #[error("directory rejected credentials while fetching roster for org '{org_id}': {message}")]
    AuthenticationFailed { org_id: String, message: String },

    /// Master list load or save failed.
    #[error("master list error: {0}")]
    Store(#[from] StoreError),
}

impl SyncError {
    pub fn kind(&self) -> SyncErrorKind {
        match self {
            SyncError::DirectoryUnavailable { .. } => SyncErrorKind::DirectoryUnavailable,
            SyncError::AuthenticationFailed { .. } => SyncErrorKind::AuthenticationFailed,
            SyncError::Store(_) => SyncErrorKind::Store,
        }
    }

    /// Lift a roster-fetch failure into the fatal taxonomy.
    pub(crate) fn from_fetch(org_id: &str, err: DirectoryError) -> Self {
        match err {
            DirectoryError::AuthenticationFailed(message) => SyncError::AuthenticationFailed {
                org_id: org_id.to_string(),
                message,
            },
            DirectoryError::Unavailable(message) => SyncError::DirectoryUnavailable {
                org_id: org_id.to_string(),
                message,
            },
            DirectoryError::Rejected { status, message } => SyncError::DirectoryUnavailable {
                org_id: org_id.to_string(),
                message: format!("status {status}: {message}"),
            },
        }
    }
}
