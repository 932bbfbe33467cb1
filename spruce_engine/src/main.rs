#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
//! ** Spruce **
//! Data-quality checker and fixer for YAML content corpora.

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use spruce_data::CorpusIssue;
use spruce_engine::fixer::{Mode, fix_phase};
use spruce_engine::{backup, corpus, report};

#[derive(Parser)]
#[command(author, version, about = "Data-quality checker and fixer for YAML content corpora.")]
struct Cli {
    /// Apply fixes to data files (creates timestamped backups).
    #[arg(long)]
    fix: bool,
    /// Report all data quality issues without fixing; duplicates fail the run.
    #[arg(long)]
    validate: bool,
    /// Show files with no issues and full missing-field lists.
    #[arg(long)]
    verbose: bool,
    /// Root directory of the content corpus.
    #[arg(long, value_name = "DIR", default_value = "content/data")]
    data_dir: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    // Validate mode overrides fix mode.
    let mode = if cli.validate {
        Mode::ValidateOnly
    } else if cli.fix {
        Mode::Fix
    } else {
        Mode::DryRun
    };

    if !cli.data_dir.is_dir() {
        eprintln!("data directory '{}' does not exist", cli.data_dir.display());
        process::exit(2);
    }

    report::print_banner(mode);

    info!("scanning corpus at {}", cli.data_dir.display());
    let scan = corpus::scan_corpus(&cli.data_dir).context("while scanning the corpus")?;
    report::print_scan_summary(&scan);
    let duplicates = scan.table.duplicates();

    let fix = fix_phase(&cli.data_dir, &scan, mode).context("while checking data quality")?;
    if let Some(outcome) = &fix {
        report::print_fix_header();
        report::print_changes(outcome, mode, cli.verbose);
    }

    let mut errors: Vec<CorpusIssue> = scan.issues.clone();
    if let Some(outcome) = &fix {
        errors.extend(outcome.issues.iter().cloned());
    }

    report::print_quality_report(&duplicates, fix.as_ref(), &errors, cli.verbose);
    let files_scanned = corpus::count_data_files(&cli.data_dir);
    report::print_summary(files_scanned, fix.as_ref(), duplicates.len(), errors.len());

    if mode.writes() && fix.as_ref().is_some_and(|outcome| outcome.files_modified > 0) {
        backup::ensure_backups_ignored(Path::new("."));
    }

    let passed = report::print_verdict(mode, duplicates.len(), errors.len(), fix.as_ref());
    if !passed {
        process::exit(1);
    }
    Ok(())
}
