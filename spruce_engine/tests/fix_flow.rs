//! End-to-end flows over a temporary corpus.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Result;
use spruce_engine::corpus::{count_data_files, scan_corpus};
use spruce_engine::fixer::{Mode, fix_corpus, fix_phase};
use tempfile::tempdir;

fn write_file(root: &Path, dir: &str, name: &str, content: &str) {
    let dir = root.join(dir);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(name), content).unwrap();
}

/// A small corpus with one of everything the fixer handles: an id that
/// needs slugging, two references that resolve only after normalization,
/// and one reference that resolves nowhere.
fn seed_corpus(root: &Path) {
    write_file(root, "standards", "standards.yml", "standards:\n- id: stig\n  name: DISA STIG\n");
    write_file(root, "organizations", "orgs.yml", "organizations:\n- id: disa\n");
    write_file(
        root,
        "profiles",
        "web.yml",
        "profiles:\n- id: Web Server\n  standard: STIG\n  organization: DISA\n  team: ghosts\n",
    );
}

fn snapshot(root: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut files = BTreeMap::new();
    for entry in walk(root) {
        files.insert(entry.clone(), fs::read(root.join(&entry)).unwrap());
    }
    files
}

fn walk(root: &Path) -> Vec<String> {
    let mut found = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else {
                found.push(path.strip_prefix(root).unwrap().display().to_string());
            }
        }
    }
    found.sort();
    found
}

#[test]
fn fix_repairs_references_and_is_idempotent() -> Result<()> {
    let dir = tempdir()?;
    seed_corpus(dir.path());

    let scan = scan_corpus(dir.path())?;
    let first = fix_corpus(dir.path(), &scan.table, Mode::Fix)?;
    assert_eq!(first.files_modified, 1);

    let rewritten = fs::read_to_string(dir.path().join("profiles/web.yml"))?;
    assert!(rewritten.contains("id: web-server"));
    assert!(rewritten.contains("standard: stig"));
    assert!(rewritten.contains("organization: disa"));
    // No teams exist, so the reference is nulled rather than left dangling.
    assert!(rewritten.contains("team: null"));

    // A second run over the fixed corpus finds nothing left to do.
    let rescan = scan_corpus(dir.path())?;
    let second = fix_corpus(dir.path(), &rescan.table, Mode::Fix)?;
    assert_eq!(second.files_modified, 0);
    assert_eq!(second.issues_found, 0);
    Ok(())
}

#[test]
fn dry_run_changes_nothing_on_disk() -> Result<()> {
    let dir = tempdir()?;
    seed_corpus(dir.path());
    let before = snapshot(dir.path());

    let scan = scan_corpus(dir.path())?;
    let outcome = fix_corpus(dir.path(), &scan.table, Mode::DryRun)?;
    assert!(outcome.issues_found > 0);

    assert_eq!(snapshot(dir.path()), before);
    Ok(())
}

#[test]
fn every_rewrite_is_preceded_by_a_byte_exact_backup() -> Result<()> {
    let dir = tempdir()?;
    seed_corpus(dir.path());
    let original = fs::read(dir.path().join("profiles/web.yml"))?;

    let scan = scan_corpus(dir.path())?;
    fix_corpus(dir.path(), &scan.table, Mode::Fix)?;

    let backups: Vec<_> = walk(dir.path())
        .into_iter()
        .filter(|path| path.contains(".bak."))
        .collect();
    assert_eq!(backups.len(), 1);
    assert!(backups[0].starts_with("profiles/web.yml.bak."));
    assert_eq!(fs::read(dir.path().join(&backups[0]))?, original);
    Ok(())
}

#[test]
fn validate_mode_skips_the_fix_pass_when_duplicates_exist() -> Result<()> {
    let dir = tempdir()?;
    seed_corpus(dir.path());
    write_file(dir.path(), "organizations", "more.yml", "organizations:\n- id: DISA\n");

    let scan = scan_corpus(dir.path())?;
    let duplicates = scan.table.duplicates();
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0].id, "disa");
    assert_eq!(duplicates[0].files, vec!["organizations/more.yml", "organizations/orgs.yml"]);

    assert!(fix_phase(dir.path(), &scan, Mode::ValidateOnly)?.is_none());
    // Duplicates do not block dry runs or fixes.
    assert!(fix_phase(dir.path(), &scan, Mode::DryRun)?.is_some());
    Ok(())
}

#[test]
fn missing_recommended_fields_are_collected_per_profile() -> Result<()> {
    let dir = tempdir()?;
    seed_corpus(dir.path());
    write_file(
        dir.path(),
        "hardening",
        "linux.yml",
        "hardeningProfiles:\n- id: linux-baseline\n  standard: stig\n",
    );

    let scan = scan_corpus(dir.path())?;
    let outcome = fix_corpus(dir.path(), &scan.table, Mode::DryRun)?;

    let hardening: Vec<_> = outcome
        .missing_fields
        .iter()
        .filter(|missing| missing.file == "hardening/linux.yml")
        .map(|missing| missing.field)
        .collect();
    assert_eq!(hardening, vec!["technology", "organization", "team"]);
    Ok(())
}

#[test]
fn lib_version_is_set() {
    assert!(!spruce_engine::SPRUCE_VERSION.is_empty());
}

#[test]
fn files_scanned_counts_all_kind_directories() -> Result<()> {
    let dir = tempdir()?;
    seed_corpus(dir.path());
    assert_eq!(count_data_files(dir.path()), 3);
    Ok(())
}
