//! `roster init --org <id> --domain <domain> --base-url <url>`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use roster_core::{config, ExecutionMode, RosterConfig};

/// Write `~/.roster/config.yaml`.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Organization (school) identifier in the account directory.
    #[arg(long)]
    pub org: String,

    /// Email domain for student accounts (e.g. "school.example.edu").
    #[arg(long)]
    pub domain: String,

    /// Base URL of the account directory API.
    #[arg(long)]
    pub base_url: String,

    /// Issue real directory calls by default instead of mock mode.
    #[arg(long)]
    pub live: bool,

    /// Master list location (default: ~/.roster/master.csv).
    #[arg(long)]
    pub master_list: Option<PathBuf>,

    /// Environment variable holding the directory token.
    #[arg(long, value_name = "VAR")]
    pub token_env: Option<String>,
}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        let home = crate::home_dir()?;

        let mut cfg = RosterConfig::new(self.org, self.domain, self.base_url);
        if self.live {
            cfg.mode = ExecutionMode::Live;
        }
        cfg.master_list = self.master_list;
        if let Some(var) = self.token_env {
            cfg.directory.token_env = var;
        }

        let existed = config::config_path_at(&home).exists();
        let cfg = config::init_at(&home, cfg).context("failed to write roster config")?;

        if existed {
            println!("✓ Config already present for org '{}'; left unchanged", cfg.org_id);
        } else {
            println!("✓ Configured org '{}' ({} mode)", cfg.org_id, cfg.mode);
        }
        println!("  Config:      {}", config::config_path_at(&home).display());
        println!("  Master list: {}", cfg.master_list_path(&home).display());
        Ok(())
    }
}
