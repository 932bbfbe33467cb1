//! Phase 2: the fix pass.
//!
//! Walks every entity kind, checks each record's own identifier and its
//! foreign-key references against the scanned ID table, and (in fix mode)
//! rewrites files after taking a backup.

use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use spruce_data::{CorpusIssue, DocumentDef, EntityKind, FieldState, IdTable, normalize_id};

use crate::backup::backup_file;
use crate::corpus::{ScanOutcome, data_files, display_path, load_document};

/// How a run treats the files it inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Report changes without touching any file.
    DryRun,
    /// Apply changes, taking a timestamped backup before each write.
    Fix,
    /// Report only; duplicate ids become blocking failures.
    ValidateOnly,
}

impl Mode {
    pub fn writes(self) -> bool {
        matches!(self, Mode::Fix)
    }
}

/// One change detected in a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    IdRewrite {
        from: String,
        to: String,
    },
    RefRewrite {
        entity: String,
        field: &'static str,
        from: String,
        to: String,
    },
    RefUnresolved {
        entity: String,
        field: &'static str,
        value: String,
    },
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::IdRewrite { from, to } => write!(f, "id: {from} -> {to}"),
            Change::RefRewrite { entity, field, from, to } => {
                write!(f, "{entity}.{field}: {from} -> {to}")
            },
            Change::RefUnresolved { entity, field, value } => {
                write!(f, "{entity}.{field}: {value} -> NOT FOUND (nulled)")
            },
        }
    }
}

/// All changes found in one file.
#[derive(Debug, Clone)]
pub struct FileChanges {
    pub file: String,
    pub changes: Vec<Change>,
}

/// A profile record missing a recommended (but optional) foreign-key field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingField {
    pub file: String,
    pub entity: String,
    pub field: &'static str,
}

/// Aggregate result of the fix pass.
///
/// In dry-run and validate modes `files_modified` counts the files that
/// *would* change; nothing is written in those modes.
#[derive(Debug, Clone, Default)]
pub struct FixOutcome {
    pub issues_found: usize,
    pub files_modified: usize,
    pub changed: Vec<FileChanges>,
    pub clean: Vec<String>,
    pub missing_fields: Vec<MissingField>,
    pub issues: Vec<CorpusIssue>,
}

/// Run the fix pass unless validate-only mode is blocked by duplicates.
///
/// Duplicate ids need a human decision, so validation refuses to judge
/// references against an ambiguous id universe and skips the pass entirely.
///
/// # Errors
/// Errors bubble up from [`fix_corpus`].
pub fn fix_phase(data_dir: &Path, scan: &ScanOutcome, mode: Mode) -> Result<Option<FixOutcome>> {
    if mode == Mode::ValidateOnly && !scan.table.duplicates().is_empty() {
        info!("skipping fix pass: duplicate ids present in validate mode");
        return Ok(None);
    }
    fix_corpus(data_dir, &scan.table, mode).map(Some)
}

/// Phase 2: check and fix every data file of every kind.
///
/// Per-file processing failures are recorded as issues; the pass continues
/// with the remaining files.
///
/// # Errors
/// Returns an error only when a kind directory exists but cannot be
/// enumerated at all.
pub fn fix_corpus(data_dir: &Path, table: &IdTable, mode: Mode) -> Result<FixOutcome> {
    let mut outcome = FixOutcome::default();
    for kind in EntityKind::ALL {
        let dir = data_dir.join(kind.dir_name());
        if !dir.is_dir() {
            continue;
        }
        for file in data_files(&dir)? {
            if let Err(issue) = fix_file(&file, kind, data_dir, table, mode, &mut outcome) {
                warn!("{issue}");
                outcome.issues.push(issue);
            }
        }
    }
    Ok(outcome)
}

fn fix_file(
    file: &Path,
    kind: EntityKind,
    root: &Path,
    table: &IdTable,
    mode: Mode,
    outcome: &mut FixOutcome,
) -> Result<(), CorpusIssue> {
    let name = display_path(root, file);
    let Some(mut doc) = load_document(file, kind, root)? else {
        return Ok(());
    };

    let mut changes = Vec::new();
    for record in &mut doc.records {
        let entity = record.display_id().to_string();

        // Own-identifier check first so report lines lead with the rename.
        if let Some(id) = record.id.clone() {
            let normalized = normalize_id(&id, kind);
            if normalized != id {
                changes.push(Change::IdRewrite { from: id, to: normalized.clone() });
                if mode.writes() {
                    record.id = Some(normalized);
                }
            }
        }

        for fk in kind.fk_fields() {
            let current = record.fk(fk.field).as_str().map(str::to_string);
            match current {
                Some(value) if !value.is_empty() => {
                    if table.contains(fk.target, &value) {
                        continue;
                    }
                    let normalized = normalize_id(&value, fk.target);
                    if table.contains(fk.target, &normalized) {
                        changes.push(Change::RefRewrite {
                            entity: entity.clone(),
                            field: fk.field,
                            from: value,
                            to: normalized.clone(),
                        });
                        if mode.writes() {
                            record.set_fk(fk.field, FieldState::Value(normalized));
                        }
                    } else {
                        // Neither form resolves: null the reference rather
                        // than leave it dangling.
                        changes.push(Change::RefUnresolved {
                            entity: entity.clone(),
                            field: fk.field,
                            value,
                        });
                        if mode.writes() {
                            record.set_fk(fk.field, FieldState::Null);
                        }
                    }
                },
                _ => {
                    // Absent, null, or empty: advisory only.
                    outcome.missing_fields.push(MissingField {
                        file: name.clone(),
                        entity: entity.clone(),
                        field: fk.field,
                    });
                },
            }
        }
    }

    if changes.is_empty() {
        outcome.clean.push(name);
        return Ok(());
    }

    outcome.issues_found += changes.len();
    outcome.files_modified += 1;
    if mode.writes() {
        write_fixed(file, &doc).map_err(|err| CorpusIssue::FileError {
            file: name.clone(),
            message: format!("{err:#}"),
        })?;
        info!("rewrote {name}");
    }
    outcome.changed.push(FileChanges { file: name, changes });
    Ok(())
}

/// Rewrite `file` in place, taking a backup first so every write is
/// preceded by a recovery point.
fn write_fixed(file: &Path, doc: &DocumentDef) -> Result<()> {
    let backup = backup_file(file)?;
    debug!("backup written to {}", backup.display());
    let yaml = doc
        .to_yaml()
        .with_context(|| format!("serializing {}", file.display()))?;
    fs::write(file, yaml).with_context(|| format!("writing {}", file.display()))
}
