//! Identifier normalization.
//!
//! Canonical identifiers are lowercase-with-dashes. Known historical
//! misspellings and renames are mapped explicitly per kind before the
//! algorithmic rule applies.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::defs::EntityKind;

/// Aliases for standard identifiers, including misspellings and old formats
/// that shipped in earlier corpus revisions.
static STANDARD_ALIASES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("STIG", "stig"),
        ("STIG-Ready", "stig-ready"),
        // Erroneous form of STIG-Ready found in older files.
        ("SRG-Ready", "stig-ready"),
        ("CIS", "cis"),
        ("PCI-DSS", "pci-dss"),
        ("NIST 800-53", "nist-800-53"),
        ("NIST-800-53", "nist-800-53"),
        ("NIST CSF", "nist-csf"),
        ("VENDOR-GUIDANCE", "vendor-guidance"),
        ("Vendor Guidance", "vendor-guidance"),
        ("AWS Best Practices", "vendor-guidance"),
        ("Azure Best Practices", "vendor-guidance"),
        ("GCP Best Practices", "vendor-guidance"),
        ("Best Practices", "vendor-guidance"),
        ("OTHER", "other"),
        // Old v4 identifier format.
        ("disa-stigs", "stig"),
        ("CMMC", "cmmc"),
    ])
});

static ORGANIZATION_ALIASES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("MITRE", "mitre"),
        ("DISA", "disa"),
        ("CIS", "cis"),
        ("VMware", "vmware"),
        ("other", "other"),
    ])
});

/// Normalize a raw identifier against the kind it must resolve in.
///
/// Explicit aliases win over the algorithmic rule; anything else is slugged
/// to lowercase-with-dashes. Total over any input: empty strings pass
/// through unchanged.
pub fn normalize_id(raw: &str, target: EntityKind) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let alias = match target {
        EntityKind::Standards => STANDARD_ALIASES.get(raw),
        EntityKind::Organizations => ORGANIZATION_ALIASES.get(raw),
        _ => None,
    };
    if let Some(canonical) = alias {
        return (*canonical).to_string();
    }

    slugify(raw)
}

/// Lowercase `raw` and collapse runs of whitespace, underscores, and
/// hyphens into single hyphens, trimming them from both ends. Characters
/// outside those classes pass through untouched.
fn slugify(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    let mut pending_dash = false;
    for ch in raw.chars() {
        if ch.is_whitespace() || ch == '_' || ch == '-' {
            pending_dash = true;
            continue;
        }
        if pending_dash && !slug.is_empty() {
            slug.push('-');
        }
        pending_dash = false;
        slug.extend(ch.to_lowercase());
    }
    slug
}
