//! `roster diff` — show how a live sync would change the master list.

use anyhow::{Context, Result};
use clap::Args;

use roster_core::ExecutionMode;
use roster_sync::{
    master_list_diff,
    pipeline::{self, RunOptions},
    SecretGenerator,
};

use crate::directory::HttpDirectory;

/// Arguments for `roster diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {}

impl DiffArgs {
    pub fn run(self) -> Result<()> {
        let home = crate::home_dir()?;
        let (config, store) = super::load_workspace(&home)?;
        let directory = HttpDirectory::from_config(&config.directory)?;

        let options = RunOptions::from_config(&config, Some(ExecutionMode::DryRun));
        let outcome = pipeline::run(&directory, &store, SecretGenerator::from_entropy(), &options)
            .with_context(|| format!("diff failed for org '{}'", options.org_id))?;

        let label = store
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "master.csv".to_string());
        match master_list_diff(&outcome.previous, &outcome.records, &label)
            .context("failed to render master list diff")?
        {
            Some(diff) => {
                print!("{diff}");
                if !diff.ends_with('\n') {
                    println!();
                }
            }
            None => println!("No differences for org '{}'.", options.org_id),
        }
        Ok(())
    }
}
