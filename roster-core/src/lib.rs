//! Roster core library — domain types, configuration, master list persistence.
//!
//! - [`types`] — [`StudentRecord`], [`Username`], [`ExecutionMode`]
//! - [`error`] — [`StoreError`], [`ConfigError`]
//! - [`config`] — `~/.roster/config.yaml` load / save / init
//! - [`master_list`] — [`MasterListStore`] and the CSV implementation

pub mod config;
pub mod error;
pub mod master_list;
pub mod types;

pub use config::{DirectoryConfig, RosterConfig};
pub use error::{ConfigError, StoreError};
pub use master_list::{CsvMasterList, MasterListStore, SaveOutcome};
pub use types::{derived_email, ExecutionMode, StudentRecord, Username};
