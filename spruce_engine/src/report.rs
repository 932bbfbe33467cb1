//! Human-readable run report.
//!
//! Everything here prints to stdout; diagnostics that belong to operators
//! rather than the report go through the `log` macros instead.

use std::collections::BTreeMap;

use colored::Colorize;
use spruce_data::{CorpusIssue, Duplicate, EntityKind};

use crate::corpus::ScanOutcome;
use crate::fixer::{Change, FixOutcome, Mode};

fn rule() {
    println!("{}", "=".repeat(70));
}

pub fn print_banner(mode: Mode) {
    rule();
    println!("  Spruce Data Quality");
    rule();
    println!();
    match mode {
        Mode::ValidateOnly => {
            println!("{}", "VALIDATION MODE - reporting data quality issues only".bold());
        },
        Mode::DryRun => {
            println!("{}", "DRY RUN MODE - no files will be modified".bold());
            println!("   run with --fix to apply changes");
        },
        Mode::Fix => {
            println!("{}", "FIX MODE - files will be modified".yellow().bold());
            println!("   backups will be created with a .bak.TIMESTAMP extension");
        },
    }
    println!();
}

pub fn print_scan_summary(scan: &ScanOutcome) {
    println!("{}", "Phase 1: scanning for valid entity ids".bold());
    for kind in EntityKind::SCANNED {
        let count = scan.table.count(kind);
        if count > 0 {
            println!("  {kind}: {count} ids found");
        }
    }
    let duplicates = scan.table.duplicates();
    if !duplicates.is_empty() {
        println!();
        println!("  {}", format!("found {} duplicate ids", duplicates.len()).yellow());
    }
    println!();
}

pub fn print_fix_header() {
    println!("{}", "Phase 2: checking and fixing data quality issues".bold());
    println!();
}

/// Per-file change listing; verbose mode adds the untouched files.
pub fn print_changes(fix: &FixOutcome, mode: Mode, verbose: bool) {
    for file in &fix.changed {
        if mode.writes() {
            println!("{}", format!("{} (modified):", file.file).green());
        } else {
            println!("{}", format!("{} (would modify):", file.file).cyan());
        }
        for change in &file.changes {
            println!("  - {change}");
        }
        println!();
    }
    if verbose && !fix.clean.is_empty() {
        for file in &fix.clean {
            println!("{}", format!("{file} (no issues)").dimmed());
        }
        println!();
    }
}

/// The aggregated quality report: duplicates, unresolved references,
/// missing recommended fields, validation errors.
pub fn print_quality_report(
    duplicates: &[Duplicate],
    fix: Option<&FixOutcome>,
    issues: &[CorpusIssue],
    verbose: bool,
) {
    rule();
    println!("  Data Quality Report");
    rule();
    println!();

    if duplicates.is_empty() {
        println!("{}", "no duplicate ids found".green());
    } else {
        println!("{}", format!("DUPLICATE IDS ({} found):", duplicates.len()).red().bold());
        for duplicate in duplicates {
            println!("  {}: '{}'", duplicate.kind, duplicate.id);
            for file in &duplicate.files {
                println!("      - {file}");
            }
        }
    }
    println!();

    let unresolved: Vec<(&str, &Change)> = fix
        .map(|fix| {
            fix.changed
                .iter()
                .flat_map(|file| {
                    file.changes
                        .iter()
                        .filter(|change| matches!(change, Change::RefUnresolved { .. }))
                        .map(move |change| (file.file.as_str(), change))
                })
                .collect()
        })
        .unwrap_or_default();
    if unresolved.is_empty() {
        println!("{}", "no unresolved references".green());
    } else {
        println!("{}", format!("UNRESOLVED REFERENCES ({} found):", unresolved.len()).red().bold());
        for (file, change) in &unresolved {
            println!("  {file}: {change}");
        }
    }
    println!();

    let missing = fix.map(|fix| fix.missing_fields.as_slice()).unwrap_or_default();
    if missing.is_empty() {
        println!("{}", "no missing recommended fields".green());
    } else {
        let mut by_field: BTreeMap<&'static str, Vec<_>> = BTreeMap::new();
        for entry in missing {
            by_field.entry(entry.field).or_default().push(entry);
        }
        println!(
            "{}",
            format!("MISSING RECOMMENDED FIELDS ({} profiles):", missing.len()).yellow().bold()
        );
        for (field, entries) in &by_field {
            println!("  missing '{field}': {} profiles", entries.len());
            if verbose {
                for entry in entries.iter().take(10) {
                    println!("      - {}: {}", entry.file, entry.entity);
                }
                if entries.len() > 10 {
                    println!("      ... and {} more", entries.len() - 10);
                }
            }
        }
    }
    println!();

    if issues.is_empty() {
        println!("{}", "no validation errors".green());
    } else {
        println!("{}", format!("VALIDATION ERRORS ({} found):", issues.len()).red().bold());
        for issue in issues {
            println!("  - {issue}");
        }
    }
    println!();
}

pub fn print_summary(files_scanned: usize, fix: Option<&FixOutcome>, duplicates: usize, errors: usize) {
    rule();
    println!("  Summary");
    rule();
    println!();
    println!("  files scanned: {files_scanned}");
    println!("  normalization issues: {}", fix.map_or(0, |fix| fix.issues_found));
    println!("  duplicate ids: {duplicates}");
    println!("  missing fields: {}", fix.map_or(0, |fix| fix.missing_fields.len()));
    println!("  validation errors: {errors}");
    println!();
}

/// Print the final verdict and return whether the run counts as passed.
pub fn print_verdict(mode: Mode, duplicates: usize, errors: usize, fix: Option<&FixOutcome>) -> bool {
    match mode {
        Mode::ValidateOnly => {
            if duplicates > 0 || errors > 0 {
                println!(
                    "{}",
                    "VALIDATION FAILED - fix the critical issues above before proceeding".red().bold()
                );
                false
            } else {
                println!("{}", "validation passed".green().bold());
                if fix.is_some_and(|fix| fix.issues_found > 0 || !fix.missing_fields.is_empty()) {
                    println!("   normalization/optional-field issues remain - run with --fix to clean up");
                }
                true
            }
        },
        Mode::DryRun => {
            if fix.is_some_and(|fix| fix.issues_found > 0) {
                println!("{}", "dry run complete - review the changes above".green());
                println!("   run with --fix to apply them");
            } else {
                println!("{}", "no issues found".green());
            }
            true
        },
        Mode::Fix => {
            println!("{}", "fixes applied".green().bold());
            if fix.is_some_and(|fix| fix.files_modified > 0) {
                println!();
                println!("backup files were created next to each modified file");
                println!("   to restore one: mv <file>.bak.<timestamp> <file>");
            }
            true
        },
    }
}
