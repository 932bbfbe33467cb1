//! Corpus-wide identifier bookkeeping and duplicate detection.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use crate::defs::{EntityKind, Id};
use crate::normalize::normalize_id;

/// A problem that prevented a file from being processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorpusIssue {
    /// The file could not be read, parsed, or rewritten.
    FileError { file: String, message: String },
    /// The grouping-key value was not a list of records.
    NotAList { file: String, key: &'static str },
}

impl fmt::Display for CorpusIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorpusIssue::FileError { file, message } => write!(f, "{file}: {message}"),
            CorpusIssue::NotAList { file, key } => write!(f, "{file}: '{key}' should be a list"),
        }
    }
}

impl std::error::Error for CorpusIssue {}

/// A normalized identifier that appears in more than one file of a kind.
///
/// Never resolved automatically: collapsing two records that share an id is
/// a human decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duplicate {
    pub kind: EntityKind,
    pub id: Id,
    pub files: Vec<String>,
}

/// Valid-identifier universe built by the scan phase.
///
/// Holds, per scanned kind, every identifier seen (original and normalized
/// forms) plus the files each normalized identifier appeared in. Read-only
/// during the fix phase.
#[derive(Debug, Clone, Default)]
pub struct IdTable {
    valid: HashMap<EntityKind, HashSet<Id>>,
    locations: HashMap<EntityKind, BTreeMap<Id, Vec<String>>>,
}

impl IdTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one identifier occurrence from `file`.
    pub fn record(&mut self, kind: EntityKind, raw: &str, file: &str) {
        let normalized = normalize_id(raw, kind);
        let valid = self.valid.entry(kind).or_default();
        valid.insert(raw.to_string());
        if normalized != raw {
            valid.insert(normalized.clone());
        }
        self.locations
            .entry(kind)
            .or_default()
            .entry(normalized)
            .or_default()
            .push(file.to_string());
    }

    /// Whether `id` resolves against `kind` as-is.
    pub fn contains(&self, kind: EntityKind, id: &str) -> bool {
        self.valid.get(&kind).is_some_and(|ids| ids.contains(id))
    }

    /// Number of distinct identifier forms known for `kind`.
    pub fn count(&self, kind: EntityKind) -> usize {
        self.valid.get(&kind).map_or(0, HashSet::len)
    }

    /// Normalized identifiers that appear in more than one file of the same
    /// kind, in kind order then id order.
    pub fn duplicates(&self) -> Vec<Duplicate> {
        let mut found = Vec::new();
        for kind in EntityKind::SCANNED {
            let Some(ids) = self.locations.get(&kind) else {
                continue;
            };
            for (id, files) in ids {
                if files.len() > 1 {
                    found.push(Duplicate {
                        kind,
                        id: id.clone(),
                        files: files.clone(),
                    });
                }
            }
        }
        found
    }
}
