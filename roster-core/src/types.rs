//! Domain types for the student roster.
//!
//! A [`StudentRecord`] is one row of roster data, keyed by its [`Username`].
//! Records fetched from the directory carry a `remote_ref`; records loaded
//! from the master list never do.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Unique, case-sensitive identity of a student within a roster snapshot.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(pub String);

impl Username {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` for empty or whitespace-only usernames, which never identify a student.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Username {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Username {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Whether remote mutations are issued or only simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    Live,
    /// Mock mode: directory mutations are logged but never sent.
    #[default]
    DryRun,
}

impl ExecutionMode {
    pub fn is_dry_run(self) -> bool {
        matches!(self, ExecutionMode::DryRun)
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Live => write!(f, "live"),
            ExecutionMode::DryRun => write!(f, "dry-run"),
        }
    }
}

// ---------------------------------------------------------------------------
// Student record
// ---------------------------------------------------------------------------

/// One student, as seen either in the remote roster or in the master list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub username: Username,
    pub first_name: String,
    pub last_name: String,
    /// Free-form label such as `"Prep"` or `"7"`.
    pub year_level: String,
    pub class_name: String,
    pub email: String,
    /// `None` or blank means the account still needs a password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    /// Directory handle; only present on freshly fetched records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_ref: Option<String>,
}

impl StudentRecord {
    /// `true` when the record has no usable password yet.
    pub fn needs_secret(&self) -> bool {
        self.secret
            .as_deref()
            .map(|s| s.trim().is_empty())
            .unwrap_or(true)
    }

    /// Strip fields that never leave a single run (`remote_ref`) and turn a
    /// blank secret into `None`.
    pub fn normalized(mut self) -> Self {
        self.remote_ref = None;
        if self.needs_secret() {
            self.secret = None;
        }
        self
    }
}

/// `"<username>@<domain>"`, the only email a student account may carry.
pub fn derived_email(username: &Username, domain: &str) -> String {
    format!("{}@{}", username.0, domain.trim_start_matches('@'))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
