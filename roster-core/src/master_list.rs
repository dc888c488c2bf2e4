//! Master list persistence — the roster carried over between runs.
//!
//! ## CSV schema
//!
//! `Username, FirstName, LastName, YearLevel, Class, Email, Password`
//!
//! Column names and order are a compatibility contract with downstream
//! report tooling; do not reorder.
//!
//! ## `CsvMasterList::save` — hash-gated archival write
//!
//! 1. Normalize (drop `remote_ref`, sort by username, first occurrence wins).
//! 2. Serialize to CSV and SHA-256 the content.
//! 3. Compare with the hash of the current file → skip if identical.
//! 4. Copy the current file to `archive/master-<UTC timestamp>.csv`.
//! 5. Write to `<path>.tmp`, `chmod 0600`.
//! 6. Rename to final path (atomic on POSIX).

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{store_io, StoreError};
use crate::types::{StudentRecord, Username};

/// Header row of every persisted master list.
pub const MASTER_COLUMNS: [&str; 7] = [
    "Username",
    "FirstName",
    "LastName",
    "YearLevel",
    "Class",
    "Email",
    "Password",
];

/// Persistence boundary for the master list.
pub trait MasterListStore {
    /// Previously persisted records; empty when no master list exists yet.
    fn load(&self) -> Result<Vec<StudentRecord>, StoreError>;

    /// Durably replace the master list with `records`.
    fn save(&self, records: &[StudentRecord]) -> Result<SaveOutcome, StoreError>;

    /// Export records involved in duplicate usernames for manual review.
    ///
    /// Stores without a side channel ignore the request.
    fn export_duplicates(&self, records: &[StudentRecord]) -> Result<Option<PathBuf>, StoreError> {
        let _ = records;
        Ok(None)
    }
}

/// Outcome of [`MasterListStore::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// File was written; `archived` is the copy of the previous list, if any.
    Written {
        path: PathBuf,
        archived: Option<PathBuf>,
    },
    /// Content matched the current file, nothing was touched.
    Unchanged { path: PathBuf },
}

/// One CSV row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct MasterRow {
    #[serde(rename = "Username")]
    username: String,
    #[serde(rename = "FirstName", default)]
    first_name: String,
    #[serde(rename = "LastName", default)]
    last_name: String,
    #[serde(rename = "YearLevel", default)]
    year_level: String,
    #[serde(rename = "Class", default)]
    class_name: String,
    #[serde(rename = "Email", default)]
    email: String,
    #[serde(rename = "Password", default)]
    password: Option<String>,
}

impl From<&StudentRecord> for MasterRow {
    fn from(r: &StudentRecord) -> Self {
        Self {
            username: r.username.0.clone(),
            first_name: r.first_name.clone(),
            last_name: r.last_name.clone(),
            year_level: r.year_level.clone(),
            class_name: r.class_name.clone(),
            email: r.email.clone(),
            password: r.secret.clone().filter(|s| !s.trim().is_empty()),
        }
    }
}

impl From<MasterRow> for StudentRecord {
    fn from(row: MasterRow) -> Self {
        StudentRecord {
            username: Username(row.username),
            first_name: row.first_name,
            last_name: row.last_name,
            year_level: row.year_level,
            class_name: row.class_name,
            email: row.email,
            secret: row.password.filter(|s| !s.trim().is_empty()),
            remote_ref: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Normalization + CSV codec
// ---------------------------------------------------------------------------

/// Schema-normalize `records` for persistence: strip per-run fields, sort by
/// username ascending, keep only the first record per username.
pub fn normalize(records: &[StudentRecord]) -> Vec<StudentRecord> {
    let mut seen = HashSet::new();
    let mut out: Vec<StudentRecord> = records
        .iter()
        .filter(|r| seen.insert(r.username.clone()))
        .map(|r| r.clone().normalized())
        .collect();
    out.sort_by(|a, b| a.username.cmp(&b.username));
    out
}

/// Render records as master-list CSV (header always present), in the given order.
pub fn to_csv_string(records: &[StudentRecord]) -> Result<String, StoreError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(MASTER_COLUMNS)?;
    for record in records {
        writer.serialize(MasterRow::from(record))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| StoreError::Csv(csv::Error::from(e.into_error())))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Parse master-list CSV; `path` is only used for error context.
///
/// A blank username is fatal here, unlike a blank row from the directory:
/// the row may carry a password that would otherwise be dropped on save.
pub fn from_csv_str(path: &Path, contents: &str) -> Result<Vec<StudentRecord>, StoreError> {
    let parse_err = |source: csv::Error| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(contents.as_bytes());
    let headers = reader.headers().map_err(parse_err)?.clone();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(parse_err)?;
        let parsed: MasterRow = row.deserialize(Some(&headers)).map_err(parse_err)?;
        if parsed.username.is_empty() {
            return Err(StoreError::BlankUsername {
                path: path.to_path_buf(),
                line: row.position().map(|p| p.line()).unwrap_or_default(),
            });
        }
        records.push(StudentRecord::from(parsed));
    }
    Ok(records)
}

// ---------------------------------------------------------------------------
// CsvMasterList
// ---------------------------------------------------------------------------

/// CSV file-backed master list with archival of each replaced version.
#[derive(Debug, Clone)]
pub struct CsvMasterList {
    path: PathBuf,
}

impl CsvMasterList {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `<dir of master list>/archive/`
    pub fn archive_dir(&self) -> PathBuf {
        self.parent_dir().join("archive")
    }

    /// `<dir of master list>/duplicates.csv`
    pub fn duplicates_path(&self) -> PathBuf {
        self.parent_dir().join("duplicates.csv")
    }

    fn parent_dir(&self) -> PathBuf {
        self.path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    fn read_current(&self) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents.replace("\r\n", "\n"))),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(store_io(&self.path, err)),
        }
    }

    /// Copy the current file into the archive directory; returns the copy's path.
    fn archive_current(&self) -> Result<PathBuf, StoreError> {
        let dir = self.archive_dir();
        std::fs::create_dir_all(&dir).map_err(|e| store_io(&dir, e))?;
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%3fZ");
        let mut target = dir.join(format!("master-{stamp}.csv"));
        let mut n = 1;
        while target.exists() {
            target = dir.join(format!("master-{stamp}-{n}.csv"));
            n += 1;
        }
        std::fs::copy(&self.path, &target).map_err(|e| store_io(&target, e))?;
        set_file_permissions(&target)?;
        Ok(target)
    }
}

impl MasterListStore for CsvMasterList {
    fn load(&self) -> Result<Vec<StudentRecord>, StoreError> {
        match self.read_current()? {
            Some(contents) => from_csv_str(&self.path, &contents),
            None => {
                tracing::info!("no master list at {}; treating as initial run", self.path.display());
                Ok(vec![])
            }
        }
    }

    fn save(&self, records: &[StudentRecord]) -> Result<SaveOutcome, StoreError> {
        let content = to_csv_string(&normalize(records))?;

        let current = self.read_current()?;
        if let Some(existing) = current.as_deref() {
            if sha256_hex(existing) == sha256_hex(&content) {
                tracing::debug!("unchanged: {}", self.path.display());
                return Ok(SaveOutcome::Unchanged {
                    path: self.path.clone(),
                });
            }
        }

        let archived = match current {
            Some(_) => Some(self.archive_current()?),
            None => None,
        };

        let dir = self.parent_dir();
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(&dir).map_err(|e| store_io(&dir, e))?;
        }
        let tmp = PathBuf::from(format!("{}.tmp", self.path.display()));
        write_atomic(&tmp, &self.path, &content)?;

        tracing::info!("wrote master list: {} ({} rows)", self.path.display(), records.len());
        Ok(SaveOutcome::Written {
            path: self.path.clone(),
            archived,
        })
    }

    fn export_duplicates(&self, records: &[StudentRecord]) -> Result<Option<PathBuf>, StoreError> {
        let path = self.duplicates_path();
        if records.is_empty() {
            match std::fs::remove_file(&path) {
                Ok(()) => tracing::info!("removed stale {}", path.display()),
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => return Err(store_io(&path, err)),
            }
            return Ok(None);
        }
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| store_io(dir, e))?;
        }
        let content = to_csv_string(records)?;
        let tmp = path.with_extension("csv.tmp");
        write_atomic(&tmp, &path, &content)?;
        tracing::warn!("exported {} duplicate row(s) to {}", records.len(), path.display());
        Ok(Some(path))
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn sha256_hex(content: &str) -> String {
    let mut h = Sha256::new();
    h.update(content.as_bytes());
    hex::encode(h.finalize())
}

fn write_atomic(tmp: &Path, path: &Path, content: &str) -> Result<(), StoreError> {
    std::fs::write(tmp, content).map_err(|e| store_io(tmp, e))?;
    set_file_permissions(tmp)?;
    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(store_io(path, e));
    }
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| store_io(path, e))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
