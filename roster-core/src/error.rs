//! Error types for roster-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from loading or persisting the master list.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O failure, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed CSV on load — includes file path and the csv crate's position.
    #[error("failed to parse master list at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// CSV serialization error (save path).
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// A persisted row had an empty `Username` cell.
    #[error("master list at {path} has a row without a username (line {line})")]
    BlankUsername { path: PathBuf, line: u64 },
}

/// Errors from loading or writing `config.yaml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (write path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load — includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None` — cannot locate `~/.roster/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// The config file did not exist at the expected path.
    #[error("config not found at {path}; run `roster init` first")]
    NotFound { path: PathBuf },

    /// A required setting is empty.
    #[error("invalid config: {field} must not be empty")]
    Invalid { field: &'static str },
}

pub(crate) fn store_io(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}

pub(crate) fn config_io(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
