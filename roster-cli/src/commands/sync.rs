//! `roster sync` — reconcile, provision and update the master list.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use roster_core::{ExecutionMode, SaveOutcome};
use roster_sync::{
    pipeline::{self, RunOptions, RunOutcome},
    OutcomeStatus, SecretGenerator,
};

use crate::directory::HttpDirectory;

/// Arguments for `roster sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Simulate directory calls and skip writing the master list.
    #[arg(long)]
    pub dry_run: bool,

    /// Emit the run report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let home = crate::home_dir()?;
        let (config, store) = super::load_workspace(&home)?;
        let directory = HttpDirectory::from_config(&config.directory)?;

        let mode_override = self.dry_run.then_some(ExecutionMode::DryRun);
        let options = RunOptions::from_config(&config, mode_override);
        let outcome = pipeline::run(&directory, &store, SecretGenerator::from_entropy(), &options)
            .with_context(|| format!("sync failed for org '{}'", options.org_id))?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&outcome.report)
                    .context("failed to serialize run report")?
            );
        } else {
            print_outcome(&outcome);
        }
        Ok(())
    }
}

fn print_outcome(outcome: &RunOutcome) {
    let report = &outcome.report;
    let prefix = if report.mode.is_dry_run() { "[dry-run] " } else { "" };
    let s = report.summary();

    println!(
        "{prefix}✓ org '{}': {} new, {} departed, {} existing, {} field change(s)",
        report.org_id, s.new, s.departed, s.existing, s.changes
    );

    for change in report.changes() {
        println!("  ✎  {change}");
    }
    for username in &report.classification.departed_usernames {
        println!("  -  {username} departed");
    }
    for o in report.outcomes() {
        let line = o.to_string();
        match o.status {
            OutcomeStatus::Succeeded => println!("  {}  {line}", "✓".green()),
            OutcomeStatus::Simulated => println!("  ~  {line}"),
            OutcomeStatus::Failed { .. } => println!("  {}  {}", "✗".red(), line.red()),
        }
    }
    for w in report.warnings() {
        println!("  {}  {w}", "!".yellow());
    }

    match &outcome.save {
        Some(SaveOutcome::Written { path, archived }) => {
            println!("{prefix}wrote {} ({} rows)", path.display(), outcome.records.len());
            if let Some(archived) = archived {
                println!("  previous list archived to {}", archived.display());
            }
        }
        Some(SaveOutcome::Unchanged { path }) => {
            println!("{prefix}{} unchanged", path.display());
        }
        None => println!("{prefix}master list not written ({} rows)", outcome.records.len()),
    }
    if let Some(path) = &outcome.duplicates_file {
        println!("  {}  duplicate usernames exported to {}", "!".yellow(), path.display());
    }

    if report.has_problems() {
        println!(
            "{}",
            format!("{} failed call(s), {} warning(s)", s.failed, s.warnings).yellow()
        );
    } else {
        println!("{prefix}{}", "no failures or warnings".green());
    }
}
