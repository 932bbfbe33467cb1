use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_yaml::{Mapping, Value};

/// Stable identifier used across corpus references.
pub type Id = String;

/// Fixed catalog of entity categories stored in the corpus, each under its
/// own subdirectory of the data root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Standards,
    Technologies,
    Organizations,
    Teams,
    Tags,
    Capabilities,
    Tools,
    Profiles,
    HardeningProfiles,
}

/// A recognized foreign-key field and the kind it must resolve against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FkField {
    pub field: &'static str,
    pub target: EntityKind,
}

const PROFILE_FKS: &[FkField] = &[
    FkField {
        field: "standard",
        target: EntityKind::Standards,
    },
    FkField {
        field: "technology",
        target: EntityKind::Technologies,
    },
    FkField {
        field: "organization",
        target: EntityKind::Organizations,
    },
    FkField {
        field: "team",
        target: EntityKind::Teams,
    },
];

impl EntityKind {
    /// Every kind the fix pass walks.
    pub const ALL: [EntityKind; 9] = [
        EntityKind::Standards,
        EntityKind::Technologies,
        EntityKind::Organizations,
        EntityKind::Teams,
        EntityKind::Tags,
        EntityKind::Capabilities,
        EntityKind::Tools,
        EntityKind::Profiles,
        EntityKind::HardeningProfiles,
    ];

    /// Catalog kinds whose identifiers populate the valid-ID sets during
    /// the scan phase. Profile and tool ids are never referenced by other
    /// records, so they are not tracked.
    pub const SCANNED: [EntityKind; 6] = [
        EntityKind::Standards,
        EntityKind::Technologies,
        EntityKind::Organizations,
        EntityKind::Teams,
        EntityKind::Tags,
        EntityKind::Capabilities,
    ];

    /// Subdirectory of the data root holding this kind's files.
    pub fn dir_name(self) -> &'static str {
        match self {
            EntityKind::Standards => "standards",
            EntityKind::Technologies => "technologies",
            EntityKind::Organizations => "organizations",
            EntityKind::Teams => "teams",
            EntityKind::Tags => "tags",
            EntityKind::Capabilities => "capabilities",
            EntityKind::Tools => "tools",
            EntityKind::Profiles => "profiles",
            EntityKind::HardeningProfiles => "hardening",
        }
    }

    /// Top-level key under which a file stores this kind's record list.
    pub fn group_key(self) -> &'static str {
        match self {
            EntityKind::HardeningProfiles => "hardeningProfiles",
            other => other.dir_name(),
        }
    }

    /// Recognized foreign-key fields for records of this kind.
    pub fn fk_fields(self) -> &'static [FkField] {
        match self {
            EntityKind::Profiles | EntityKind::HardeningProfiles => PROFILE_FKS,
            _ => &[],
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Tri-state value of a recognized foreign-key field.
///
/// `Absent` (key not present) and `Null` (key present, value null) are
/// distinct on purpose: absent fields stay absent on rewrite, while nulled
/// fields are written back as explicit nulls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldState {
    #[default]
    Absent,
    Null,
    Value(Id),
}

impl FieldState {
    pub fn is_absent(&self) -> bool {
        matches!(self, FieldState::Absent)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldState::Value(id) => Some(id),
            FieldState::Absent | FieldState::Null => None,
        }
    }
}

impl Serialize for FieldState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldState::Value(id) => serializer.serialize_str(id),
            FieldState::Absent | FieldState::Null => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for FieldState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<Id>::deserialize(deserializer)? {
            Some(id) => FieldState::Value(id),
            None => FieldState::Null,
        })
    }
}

static ABSENT: FieldState = FieldState::Absent;

/// Typed view of a single entity record.
///
/// Only the identifier and the recognized foreign-key fields are modeled;
/// every other field round-trips untouched through `rest`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    #[serde(default, skip_serializing_if = "FieldState::is_absent")]
    pub standard: FieldState,
    #[serde(default, skip_serializing_if = "FieldState::is_absent")]
    pub technology: FieldState,
    #[serde(default, skip_serializing_if = "FieldState::is_absent")]
    pub organization: FieldState,
    #[serde(default, skip_serializing_if = "FieldState::is_absent")]
    pub team: FieldState,
    #[serde(flatten)]
    pub rest: Mapping,
}

impl RecordDef {
    /// Identifier used in report lines for records that may lack one.
    pub fn display_id(&self) -> &str {
        self.id.as_deref().unwrap_or("unknown")
    }

    pub fn fk(&self, field: &str) -> &FieldState {
        match field {
            "standard" => &self.standard,
            "technology" => &self.technology,
            "organization" => &self.organization,
            "team" => &self.team,
            _ => &ABSENT,
        }
    }

    pub fn set_fk(&mut self, field: &str, state: FieldState) {
        match field {
            "standard" => self.standard = state,
            "technology" => self.technology = state,
            "organization" => self.organization = state,
            "team" => self.team = state,
            _ => {},
        }
    }
}

/// Why a file could not be treated as a corpus document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// The file is not YAML, its top level is not a mapping, or a record
    /// failed typed parsing.
    Malformed(String),
    /// The grouping key is present but its value is not a sequence.
    NotAList(&'static str),
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentError::Malformed(message) => f.write_str(message),
            DocumentError::NotAList(key) => write!(f, "'{key}' should be a list"),
        }
    }
}

impl std::error::Error for DocumentError {}

/// One corpus data file: the full top-level mapping plus the typed record
/// list stored under the kind's grouping key.
#[derive(Debug, Clone)]
pub struct DocumentDef {
    kind: EntityKind,
    doc: Mapping,
    pub records: Vec<RecordDef>,
}

impl DocumentDef {
    /// Parse a document for `kind` from YAML source.
    ///
    /// Returns `Ok(None)` when the file holds nothing under the kind's
    /// grouping key; corpora are allowed to keep unrelated files around.
    ///
    /// # Errors
    /// Returns an error if the source is not valid YAML, its top level is a
    /// non-mapping value, the grouping key holds a non-sequence, or any
    /// record fails typed parsing.
    pub fn parse(kind: EntityKind, source: &str) -> Result<Option<Self>, DocumentError> {
        let root: Value =
            serde_yaml::from_str(source).map_err(|err| DocumentError::Malformed(err.to_string()))?;
        let doc = match root {
            Value::Null => return Ok(None),
            Value::Mapping(doc) => doc,
            _ => return Err(DocumentError::Malformed("top level is not a mapping".into())),
        };

        let key = Value::String(kind.group_key().to_string());
        let Some(group) = doc.get(&key) else {
            return Ok(None);
        };
        let Some(entries) = group.as_sequence() else {
            return Err(DocumentError::NotAList(kind.group_key()));
        };

        let records = entries
            .iter()
            .map(|entry| serde_yaml::from_value::<RecordDef>(entry.clone()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| DocumentError::Malformed(err.to_string()))?;

        Ok(Some(DocumentDef { kind, doc, records }))
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Serialize the document back to YAML with the records written under
    /// the grouping key; unrelated top-level keys keep their position.
    ///
    /// # Errors
    /// Errors bubble up from value serialization.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        let mut doc = self.doc.clone();
        let records = serde_yaml::to_value(&self.records)?;
        doc.insert(Value::String(self.kind.group_key().to_string()), records);
        serde_yaml::to_string(&doc)
    }
}
