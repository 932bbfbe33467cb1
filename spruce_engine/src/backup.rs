//! Backup files and related housekeeping.
//!
//! Every rewrite is preceded by a byte-exact, timestamped copy of the
//! original file so any single file can be restored by hand. Backups are
//! never read back programmatically.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};
use time::OffsetDateTime;
use time::macros::format_description;

/// Pattern ignoring backup files, appended to `.gitignore` after fix runs.
pub const BACKUP_IGNORE_PATTERN: &str = "*.bak.*";

/// Copy `file` to a sibling `<name>.bak.<timestamp>` path and return it.
///
/// # Errors
/// Returns an error if the file has no usable name or the copy fails.
pub fn backup_file(file: &Path) -> Result<PathBuf> {
    let name = file
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("no usable file name in {}", file.display()))?;
    let backup = file.with_file_name(format!("{name}.bak.{}", timestamp()));
    fs::copy(file, &backup).with_context(|| format!("backing up {}", file.display()))?;
    Ok(backup)
}

/// Local wall-clock timestamp used in backup names, UTC when the local
/// offset is unavailable.
fn timestamp() -> String {
    let format = format_description!("[year][month][day]-[hour][minute][second]");
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    now.format(&format).unwrap_or_else(|_| "unknown".to_string())
}

/// Best-effort: make sure `.gitignore` under `root` ignores backup files.
///
/// Failures are logged and swallowed; this is housekeeping, not core
/// behavior.
pub fn ensure_backups_ignored(root: &Path) {
    let path = root.join(".gitignore");
    match append_ignore_pattern(&path) {
        Ok(true) => info!("added '{BACKUP_IGNORE_PATTERN}' to {}", path.display()),
        Ok(false) => {},
        Err(err) => warn!("could not update {}: {err:#}", path.display()),
    }
}

/// Append the backup pattern unless an identical line is already present.
/// Returns whether the file was changed.
fn append_ignore_pattern(path: &Path) -> Result<bool> {
    let existing = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => String::new(),
        Err(err) => return Err(err).with_context(|| format!("reading {}", path.display())),
    };
    if existing.lines().any(|line| line.trim() == BACKUP_IGNORE_PATTERN) {
        return Ok(false);
    }

    let mut content = existing;
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    content.push_str("\n# Spruce backup files\n");
    content.push_str(BACKUP_IGNORE_PATTERN);
    content.push('\n');
    fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn backup_is_a_byte_exact_sibling_copy() -> Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("data.yml");
        fs::write(&file, "standards:\n- id: stig\n")?;

        let backup = backup_file(&file)?;
        assert_eq!(backup.parent(), file.parent());
        let backup_name = backup.file_name().and_then(|name| name.to_str()).unwrap();
        assert!(backup_name.starts_with("data.yml.bak."));
        assert_eq!(fs::read(&backup)?, fs::read(&file)?);
        Ok(())
    }

    #[test]
    fn ignore_pattern_append_is_idempotent() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(".gitignore");
        fs::write(&path, "target/\n")?;

        assert!(append_ignore_pattern(&path)?);
        assert!(!append_ignore_pattern(&path)?);

        let content = fs::read_to_string(&path)?;
        assert_eq!(content.matches(BACKUP_IGNORE_PATTERN).count(), 1);
        assert!(content.starts_with("target/\n"));
        Ok(())
    }

    #[test]
    fn ignore_file_is_created_when_missing() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(".gitignore");

        assert!(append_ignore_pattern(&path)?);
        let content = fs::read_to_string(&path)?;
        assert!(content.contains(BACKUP_IGNORE_PATTERN));
        Ok(())
    }
}
