//! `~/.roster/config.yaml` — run settings resolved before the pipeline starts.
//!
//! # Storage layout
//!
//! ```text
//! ~/.roster/
//!   config.yaml      (mode 0600)
//!   master.csv       (default master list location)
//!   archive/         (previous master lists, one per live write)
//! ```
//!
//! # API pattern
//!
//! Every function has two forms:
//! - `fn_at(home: &Path, …)` — explicit home; used in tests with `TempDir`
//! - `fn(…)` — derives home from `dirs::home_dir()`, delegates to `_at`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{config_io, ConfigError};
use crate::types::ExecutionMode;

/// Services enabled for every newly provisioned account unless configured otherwise.
pub const DEFAULT_SERVICES: &[&str] = &["service-a", "service-b"];

/// Environment variable holding the directory bearer token by default.
pub const DEFAULT_TOKEN_ENV: &str = "ROSTER_DIRECTORY_TOKEN";

/// Remote account directory endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryConfig {
    pub base_url: String,
    /// Name of the environment variable holding the bearer token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Root of `config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterConfig {
    /// Organization (school) identifier passed to `fetch_roster`.
    pub org_id: String,
    /// Domain used to derive every student's email address.
    pub email_domain: String,
    #[serde(default)]
    pub mode: ExecutionMode,
    #[serde(default = "default_services")]
    pub services: Vec<String>,
    /// Explicit master list location; defaults to `~/.roster/master.csv`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_list: Option<PathBuf>,
    pub directory: DirectoryConfig,
}

impl RosterConfig {
    /// A config with defaults for everything but the three required settings.
    pub fn new(org_id: impl Into<String>, email_domain: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            org_id: org_id.into(),
            email_domain: email_domain.into(),
            mode: ExecutionMode::default(),
            services: default_services(),
            master_list: None,
            directory: DirectoryConfig {
                base_url: base_url.into(),
                token_env: default_token_env(),
                timeout_secs: default_timeout_secs(),
            },
        }
    }

    /// Reject settings the pipeline cannot run without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.org_id.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "org_id" });
        }
        if self.email_domain.trim().trim_start_matches('@').is_empty() {
            return Err(ConfigError::Invalid {
                field: "email_domain",
            });
        }
        if self.directory.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "directory.base_url",
            });
        }
        Ok(())
    }

    /// Configured master list path, or `<home>/.roster/master.csv`.
    pub fn master_list_path(&self, home: &Path) -> PathBuf {
        self.master_list
            .clone()
            .unwrap_or_else(|| roster_dir_at(home).join("master.csv"))
    }
}

fn default_services() -> Vec<String> {
    DEFAULT_SERVICES.iter().map(|s| (*s).to_string()).collect()
}

fn default_token_env() -> String {
    DEFAULT_TOKEN_ENV.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// `<home>/.roster/` — pure, no I/O.
pub fn roster_dir_at(home: &Path) -> PathBuf {
    home.join(".roster")
}

/// `<home>/.roster/config.yaml` — pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    roster_dir_at(home).join("config.yaml")
}

// ---------------------------------------------------------------------------
// Load / save / init
// ---------------------------------------------------------------------------

/// Load and validate `<home>/.roster/config.yaml`.
///
/// Returns `ConfigError::NotFound` if absent,
/// `ConfigError::Parse` (with path + line context) if malformed YAML.
pub fn load_at(home: &Path) -> Result<RosterConfig, ConfigError> {
    let path = config_path_at(home);
    if !path.exists() {
        return Err(ConfigError::NotFound { path });
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| config_io(&path, e))?;
    let config: RosterConfig =
        serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse { path, source: e })?;
    config.validate()?;
    Ok(config)
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<RosterConfig, ConfigError> {
    load_at(&home()?)
}

/// Atomically write the config: serialize → `.yaml.tmp` → `chmod 0600` → `rename`.
pub fn save_at(home: &Path, config: &RosterConfig) -> Result<(), ConfigError> {
    config.validate()?;
    let dir = roster_dir_at(home);
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| config_io(&dir, e))?;
        set_dir_permissions(&dir)?;
    }
    let path = config_path_at(home);
    let tmp = path.with_file_name("config.yaml.tmp");

    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(&tmp, yaml).map_err(|e| config_io(&tmp, e))?;
    set_file_permissions(&tmp)?;
    std::fs::rename(&tmp, &path).map_err(|e| config_io(&path, e))?;
    Ok(())
}

/// Write `config` unless a config already exists.
///
/// Idempotent: if the file already exists, loads and returns it unchanged.
pub fn init_at(home: &Path, config: RosterConfig) -> Result<RosterConfig, ConfigError> {
    if config_path_at(home).exists() {
        return load_at(home);
    }
    save_at(home, &config)?;
    Ok(config)
}

/// `init_at` convenience wrapper.
pub fn init(config: RosterConfig) -> Result<RosterConfig, ConfigError> {
    init_at(&home()?, config)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
        .map_err(|e| config_io(path, e))
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| config_io(path, e))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> RosterConfig {
        RosterConfig::new("8472", "school.test", "https://directory.test/api")
    }

    #[test]
    fn config_path_is_correct() {
        let home = TempDir::new().expect("tempdir");
        assert!(config_path_at(home.path()).ends_with(".roster/config.yaml"));
    }

    #[test]
    fn save_and_load_roundtrip() {
        let home = TempDir::new().expect("tempdir");
        save_at(home.path(), &sample()).expect("save");
        let loaded = load_at(home.path()).expect("load");
        assert_eq!(loaded, sample());
    }

    #[test]
    fn minimal_yaml_fills_defaults() {
        let home = TempDir::new().expect("tempdir");
        std::fs::create_dir_all(roster_dir_at(home.path())).expect("mkdir");
        std::fs::write(
            config_path_at(home.path()),
            "org_id: '8472'\nemail_domain: school.test\ndirectory:\n  base_url: https://d.test\n",
        )
        .expect("write");

        let cfg = load_at(home.path()).expect("load");
        assert_eq!(cfg.mode, ExecutionMode::DryRun);
        assert_eq!(cfg.services, vec!["service-a", "service-b"]);
        assert_eq!(cfg.directory.token_env, DEFAULT_TOKEN_ENV);
        assert_eq!(cfg.directory.timeout_secs, 30);
        assert!(cfg
            .master_list_path(home.path())
            .ends_with(".roster/master.csv"));
    }

    #[test]
    fn load_missing_returns_not_found() {
        let home = TempDir::new().expect("tempdir");
        let err = load_at(home.path()).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn blank_org_is_rejected() {
        let mut cfg = sample();
        cfg.org_id = "  ".into();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Invalid { field: "org_id" })
        ));
    }

    #[test]
    fn init_is_idempotent() {
        let home = TempDir::new().expect("tempdir");
        init_at(home.path(), sample()).expect("first init");

        let mut other = sample();
        other.org_id = "9999".into();
        let kept = init_at(home.path(), other).expect("second init");
        assert_eq!(kept.org_id, "8472");
    }

    #[test]
    fn tmp_file_removed_after_save() {
        let home = TempDir::new().expect("tempdir");
        save_at(home.path(), &sample()).expect("save");
        let tmp = config_path_at(home.path()).with_file_name("config.yaml.tmp");
        assert!(!tmp.exists());
    }
}
