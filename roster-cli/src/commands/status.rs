//! `roster status` — master list overview per year level.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use roster_core::{MasterListStore, StudentRecord};

/// Arguments for `roster status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let home = crate::home_dir()?;
        let (config, store) = super::load_workspace(&home)?;
        let records = store
            .load()
            .with_context(|| format!("failed to load master list {}", store.path().display()))?;

        let report = build_report(&config.org_id, &records);
        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize status JSON")?
            );
            return Ok(());
        }
        print_table(&report);
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
struct StatusReport {
    org_id: String,
    students: usize,
    missing_password: usize,
    year_levels: Vec<YearLevelRow>,
}

#[derive(Debug, Clone, Serialize, Tabled)]
struct YearLevelRow {
    #[tabled(rename = "year level")]
    year_level: String,
    #[tabled(rename = "classes")]
    classes: usize,
    #[tabled(rename = "students")]
    students: usize,
    #[tabled(rename = "missing password")]
    missing_password: usize,
}

fn build_report(org_id: &str, records: &[StudentRecord]) -> StatusReport {
    let mut grouped = BTreeMap::<&str, Vec<&StudentRecord>>::new();
    for record in records {
        grouped.entry(record.year_level.as_str()).or_default().push(record);
    }

    let year_levels = grouped
        .into_iter()
        .map(|(year_level, rows)| {
            let mut classes: Vec<&str> = rows.iter().map(|r| r.class_name.as_str()).collect();
            classes.sort_unstable();
            classes.dedup();
            YearLevelRow {
                year_level: if year_level.is_empty() { "-".to_string() } else { year_level.to_string() },
                classes: classes.len(),
                students: rows.len(),
                missing_password: rows.iter().filter(|r| r.needs_secret()).count(),
            }
        })
        .collect();

    StatusReport {
        org_id: org_id.to_string(),
        students: records.len(),
        missing_password: records.iter().filter(|r| r.needs_secret()).count(),
        year_levels,
    }
}

fn print_table(report: &StatusReport) {
    println!(
        "Roster v{} | org {} | {} students",
        env!("CARGO_PKG_VERSION"),
        report.org_id,
        report.students,
    );
    if report.students == 0 {
        println!("Master list is empty. Run `roster sync` first.");
        return;
    }

    let mut table = Table::new(report.year_levels.clone());
    table.with(Style::rounded());
    println!("{table}");

    if report.missing_password > 0 {
        println!(
            "{}",
            format!(
                "{} account(s) without a password; the next `roster sync` will backfill them.",
                report.missing_password
            )
            .yellow()
        );
    }
}
