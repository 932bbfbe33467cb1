//! Corpus discovery and the Phase-1 identifier scan.
//!
//! The scan must run to completion before any reference can be judged
//! resolvable, so the whole valid-ID universe is collected up front and
//! handed to the fix phase as an immutable value.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use spruce_data::{CorpusIssue, DocumentDef, DocumentError, EntityKind, IdTable};

/// Everything the scan phase learns about the corpus.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub table: IdTable,
    pub issues: Vec<CorpusIssue>,
}

/// Enumerate the YAML data files directly under `dir`, sorted by name so
/// report output is stable across filesystems.
///
/// # Errors
/// Returns an error if the directory contents cannot be read or enumerated.
pub fn data_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let entry = entry.with_context(|| format!("enumerating {}", dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yml" | "yaml") => files.push(path),
            _ => {},
        }
    }
    files.sort();
    Ok(files)
}

/// Path of `file` relative to the corpus root, for report lines.
pub fn display_path(root: &Path, file: &Path) -> String {
    file.strip_prefix(root).unwrap_or(file).display().to_string()
}

/// Load the document for `kind` from `file`.
///
/// `Ok(None)` means the file holds no records for the kind. Read, parse,
/// and structure problems come back as a [`CorpusIssue`] so callers can log
/// them and continue with the rest of the corpus.
///
/// # Errors
/// Returns a [`CorpusIssue`] naming the file and the underlying cause.
pub fn load_document(
    file: &Path,
    kind: EntityKind,
    root: &Path,
) -> Result<Option<DocumentDef>, CorpusIssue> {
    let name = display_path(root, file);
    let source = fs::read_to_string(file).map_err(|err| CorpusIssue::FileError {
        file: name.clone(),
        message: err.to_string(),
    })?;
    match DocumentDef::parse(kind, &source) {
        Ok(doc) => Ok(doc),
        Err(DocumentError::NotAList(key)) => Err(CorpusIssue::NotAList { file: name, key }),
        Err(DocumentError::Malformed(message)) => {
            Err(CorpusIssue::FileError { file: name, message })
        },
    }
}

/// Phase 1: collect every known identifier and where it lives.
///
/// Missing kind directories are skipped; malformed files are recorded as
/// issues without stopping the scan.
///
/// # Errors
/// Returns an error only when a kind directory exists but cannot be
/// enumerated at all.
pub fn scan_corpus(data_dir: &Path) -> Result<ScanOutcome> {
    let mut outcome = ScanOutcome::default();
    for kind in EntityKind::SCANNED {
        let dir = data_dir.join(kind.dir_name());
        if !dir.is_dir() {
            debug!("no {} directory under {}", kind.dir_name(), data_dir.display());
            continue;
        }
        for file in data_files(&dir)? {
            let doc = match load_document(&file, kind, data_dir) {
                Ok(Some(doc)) => doc,
                Ok(None) => continue,
                Err(issue) => {
                    warn!("{issue}");
                    outcome.issues.push(issue);
                    continue;
                },
            };
            let name = display_path(data_dir, &file);
            for record in &doc.records {
                if let Some(id) = &record.id {
                    outcome.table.record(kind, id, &name);
                }
            }
        }
        info!("{} ids known for {} after scan", outcome.table.count(kind), kind);
    }
    Ok(outcome)
}

/// Count every YAML data file across all kind directories, for the summary.
pub fn count_data_files(data_dir: &Path) -> usize {
    EntityKind::ALL
        .iter()
        .map(|kind| {
            let dir = data_dir.join(kind.dir_name());
            if dir.is_dir() {
                data_files(&dir).map_or(0, |files| files.len())
            } else {
                0
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    fn write_file(root: &Path, dir: &str, name: &str, content: &str) {
        let dir = root.join(dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn scan_of_empty_root_finds_nothing() -> Result<()> {
        let dir = tempdir()?;
        let outcome = scan_corpus(dir.path())?;
        assert!(outcome.issues.is_empty());
        assert_eq!(outcome.table.count(EntityKind::Standards), 0);
        Ok(())
    }

    #[test]
    fn scan_collects_ids_and_detects_duplicates() -> Result<()> {
        let dir = tempdir()?;
        write_file(dir.path(), "organizations", "a.yml", "organizations:\n- id: DISA\n");
        write_file(dir.path(), "organizations", "b.yml", "organizations:\n- id: disa\n- id: mitre\n");

        let outcome = scan_corpus(dir.path())?;
        assert!(outcome.issues.is_empty());
        assert!(outcome.table.contains(EntityKind::Organizations, "DISA"));
        assert!(outcome.table.contains(EntityKind::Organizations, "disa"));
        assert!(outcome.table.contains(EntityKind::Organizations, "mitre"));

        let dups = outcome.table.duplicates();
        assert_eq!(dups.len(), 1);
        assert_eq!(dups[0].id, "disa");
        assert_eq!(dups[0].files, vec!["organizations/a.yml", "organizations/b.yml"]);
        Ok(())
    }

    #[test]
    fn malformed_files_are_reported_and_skipped() -> Result<()> {
        let dir = tempdir()?;
        write_file(dir.path(), "standards", "bad.yml", "standards: 17\n");
        write_file(dir.path(), "standards", "broken.yml", "standards: [unclosed\n");
        write_file(dir.path(), "standards", "good.yml", "standards:\n- id: stig\n");

        let outcome = scan_corpus(dir.path())?;
        assert_eq!(outcome.issues.len(), 2);
        assert!(outcome.table.contains(EntityKind::Standards, "stig"));
        Ok(())
    }

    #[test]
    fn non_yaml_files_are_ignored() -> Result<()> {
        let dir = tempdir()?;
        write_file(dir.path(), "standards", "notes.txt", "not yaml");
        write_file(dir.path(), "standards", "main.yaml", "standards:\n- id: cis\n");

        let outcome = scan_corpus(dir.path())?;
        assert!(outcome.issues.is_empty());
        assert_eq!(outcome.table.count(EntityKind::Standards), 1);
        assert_eq!(count_data_files(dir.path()), 1);
        Ok(())
    }
}
