//! Canonical field identifiers and the alias map binding them to the
//! key names that actually appear in target files.

use crate::domain::sigfig::SigFig;
use crate::error::{AutoverError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A field the tool knows how to compute, independent of how any given
/// file spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldId {
    /// The full version string, prerelease and build included.
    Version,
    /// The finalized `X.Y.Z` form of the version.
    VersionStrict,
    /// The lock flag. When it holds the configured lock literal the
    /// version is frozen.
    Lock,
    /// The release flag, set to the configured released literal on
    /// `--release` runs.
    Release,
    /// Hash of the current commit.
    Commit,
    /// Number of commits reachable from the current commit.
    CommitCount,
    /// One figure of the version on its own.
    Part(SigFig),
}

impl FieldId {
    pub fn name(&self) -> &'static str {
        match self {
            FieldId::Version => "VERSION_KEY",
            FieldId::VersionStrict => "VERSION_KEY_STRICT",
            FieldId::Lock => "VERSION_LOCK",
            FieldId::Release => "RELEASE_FIELD",
            FieldId::Commit => "COMMIT",
            FieldId::CommitCount => "COMMIT_COUNT",
            FieldId::Part(fig) => fig.name(),
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for FieldId {
    type Err = AutoverError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "VERSION_KEY" => Ok(FieldId::Version),
            "VERSION_KEY_STRICT" => Ok(FieldId::VersionStrict),
            "VERSION_LOCK" => Ok(FieldId::Lock),
            "RELEASE_FIELD" => Ok(FieldId::Release),
            "COMMIT" => Ok(FieldId::Commit),
            "COMMIT_COUNT" => Ok(FieldId::CommitCount),
            other => match other.parse::<SigFig>() {
                Ok(fig) => Ok(FieldId::Part(fig)),
                Err(_) => Err(AutoverError::config(format!(
                    "unknown field identifier: {:?}",
                    s
                ))),
            },
        }
    }
}

impl TryFrom<String> for FieldId {
    type Error = AutoverError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<FieldId> for String {
    fn from(field: FieldId) -> Self {
        field.name().to_string()
    }
}

/// Maps native key names, as spelled in target files, to the fields they
/// carry. Several natives may share a field; a native carries exactly one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldAliases {
    entries: BTreeMap<String, FieldId>,
}

impl FieldAliases {
    pub fn new(entries: BTreeMap<String, FieldId>) -> Self {
        FieldAliases { entries }
    }

    /// The field a native key carries, if any alias covers it.
    pub fn field_for(&self, native: &str) -> Option<FieldId> {
        self.entries.get(native).copied()
    }

    /// One native spelling for a field, for reading it back out of file
    /// data. Ties between aliases break toward the lexicographically
    /// last name.
    pub fn native_for(&self, field: FieldId) -> Option<&str> {
        self.entries
            .iter()
            .filter(|(_, f)| **f == field)
            .map(|(native, _)| native.as_str())
            .next_back()
    }

    /// All native spellings for a field, for fanning a computed value out
    /// to every key that carries it.
    pub fn natives_for(&self, field: FieldId) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, f)| **f == field)
            .map(|(native, _)| native.as_str())
            .collect()
    }

    /// Whether any alias points at the field.
    pub fn references(&self, field: FieldId) -> bool {
        self.entries.values().any(|f| *f == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FieldId)> {
        self.entries.iter().map(|(native, field)| (native.as_str(), *field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_round_trips_through_name() {
        for field in [
            FieldId::Version,
            FieldId::VersionStrict,
            FieldId::Lock,
            FieldId::Release,
            FieldId::Commit,
            FieldId::CommitCount,
            FieldId::Part(SigFig::Major),
            FieldId::Part(SigFig::Build),
        ] {
            assert_eq!(field.name().parse::<FieldId>().unwrap(), field);
        }
    }

    #[test]
    fn test_sigfig_names_are_part_fields() {
        assert_eq!(
            "prerelease".parse::<FieldId>().unwrap(),
            FieldId::Part(SigFig::Prerelease)
        );
    }

    #[test]
    fn test_unknown_field_is_config_error() {
        let err = "BANANA".parse::<FieldId>().unwrap_err();
        assert!(err.to_string().contains("BANANA"));
    }

    #[test]
    fn test_native_lookup_prefers_last_alias() {
        let aliases = FieldAliases::new(BTreeMap::from([
            ("__version__".to_string(), FieldId::Version),
            ("app_version".to_string(), FieldId::Version),
            ("PRODUCTION".to_string(), FieldId::Release),
        ]));
        assert_eq!(aliases.native_for(FieldId::Version), Some("app_version"));
        assert_eq!(
            aliases.natives_for(FieldId::Version),
            vec!["__version__", "app_version"]
        );
        assert_eq!(aliases.native_for(FieldId::Lock), None);
    }

    #[test]
    fn test_field_for_and_references() {
        let aliases = FieldAliases::new(BTreeMap::from([(
            "VERSION_LOCK".to_string(),
            FieldId::Lock,
        )]));
        assert_eq!(aliases.field_for("VERSION_LOCK"), Some(FieldId::Lock));
        assert_eq!(aliases.field_for("nope"), None);
        assert!(aliases.references(FieldId::Lock));
        assert!(!aliases.references(FieldId::Commit));
    }
}
