use crate::domain::{FieldAliases, FieldId, SigFig, TagTemplate};
use crate::error::{AutoverError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Represents the complete configuration for autover.
///
/// Contains the target file list, the per-extension regex registry, trigger
/// patterns, key aliases, and the literals written for release/lock fields.
/// Every field has a default, so a partial (or absent) config file works.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_targets")]
    pub targets: Vec<String>,

    #[serde(default = "default_prerelease_token")]
    pub prerelease_token: String,

    #[serde(default = "default_build_token")]
    pub build_token: String,

    #[serde(default = "default_tag_template")]
    pub tag_template: String,

    /// Optional floating tag moved onto every release commit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_tag: Option<String>,

    #[serde(default = "default_released_value", deserialize_with = "literal")]
    pub released_value: String,

    #[serde(default = "default_lock_value", deserialize_with = "literal")]
    pub lock_value: String,

    #[serde(default = "default_unlock_value", deserialize_with = "literal")]
    pub unlock_value: String,

    /// Treat renamed files as added when detecting file triggers.
    #[serde(default)]
    pub renamed_counts_as_added: bool,

    #[serde(default = "default_regexers")]
    pub regexers: BTreeMap<String, String>,

    #[serde(default = "default_trigger_patterns")]
    pub trigger_patterns: BTreeMap<String, SigFig>,

    #[serde(default = "default_key_aliases")]
    pub key_aliases: BTreeMap<String, FieldId>,
}

/// Returns the default list of files carrying version fields.
fn default_targets() -> Vec<String> {
    vec!["src/_version.py".to_string()]
}

fn default_prerelease_token() -> String {
    "dev".to_string()
}

fn default_build_token() -> String {
    "build".to_string()
}

fn default_tag_template() -> String {
    "release/{version}".to_string()
}

fn default_released_value() -> String {
    "True".to_string()
}

fn default_lock_value() -> String {
    "True".to_string()
}

fn default_unlock_value() -> String {
    "False".to_string()
}

/// Returns the default per-extension key/value regex registry.
///
/// Each regex matches one `key = value` style line of its file format and
/// exposes `KEY` and `VALUE` named groups. `VALUE` may be optional, which
/// marks the point where a value would be inserted on an empty assignment.
fn default_regexers() -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    map.insert(
        ".json".to_string(),
        r#"^\s*[\"]?(?P<KEY>[\w:]+)[\"]?\s*:[\t ]*[\"']?(?P<VALUE>((\\\")?[^\r\n\t\f\v\",](\\\")?)+)[\"']?,?"#.to_string(),
    );
    map.insert(
        ".yaml".to_string(),
        r#"^\s*[\"']?(?P<KEY>[\w]+)[\"']?\s*:\s*[\"']?(?P<VALUE>[\w\-.+\\\/:]*[^'\",\[\]#\s]).*"#.to_string(),
    );
    map.insert(
        ".yml".to_string(),
        r#"^\s*[\"']?(?P<KEY>[\w]+)[\"']?\s*:\s*[\"']?(?P<VALUE>[\w\-.+\\\/:]*[^'\",\[\]#\s]).*"#.to_string(),
    );
    map.insert(
        ".py".to_string(),
        r#"^\s*['\"]?(?P<KEY>\w+)['\"]?\s*[=:]\s*['\"]?(?P<VALUE>[^\r\n\t\f\v\"']+)['\"]?,?"#.to_string(),
    );
    map.insert(
        ".cs".to_string(),
        r#"^(\w*\s+)*(?P<KEY>\w+)\s?[=:]\s*['\"]?(?P<VALUE>[^\r\n\t\f\v\"']+)['\"].*"#.to_string(),
    );
    map.insert(
        ".csproj".to_string(),
        r#"^<(?P<KEY>\w+)>(?P<VALUE>\S+)</\w+>"#.to_string(),
    );
    map.insert(
        ".properties".to_string(),
        r#"^\s*(?P<KEY>\w+)\s*=[\t ]*(?P<VALUE>[^\r\n\t\f\v\"']+)?"#.to_string(),
    );
    map
}

/// Returns the default news-file trigger patterns.
fn default_trigger_patterns() -> BTreeMap<String, SigFig> {
    let mut map = BTreeMap::new();
    map.insert("docs/news/*.major".to_string(), SigFig::Major);
    map.insert("docs/news/*.feature".to_string(), SigFig::Minor);
    map.insert("docs/news/*.bugfix".to_string(), SigFig::Patch);
    map
}

/// Returns the default native-key alias table.
fn default_key_aliases() -> BTreeMap<String, FieldId> {
    let mut map = BTreeMap::new();
    map.insert("__version__".to_string(), FieldId::Version);
    map.insert("__strict_version__".to_string(), FieldId::VersionStrict);
    map.insert("PRODUCTION".to_string(), FieldId::Release);
    map.insert("MAJOR".to_string(), FieldId::Part(SigFig::Major));
    map.insert("MINOR".to_string(), FieldId::Part(SigFig::Minor));
    map.insert("PATCH".to_string(), FieldId::Part(SigFig::Patch));
    map.insert("VERSION_LOCK".to_string(), FieldId::Lock);
    map.insert("COMMIT".to_string(), FieldId::Commit);
    map.insert("COMMIT_COUNT".to_string(), FieldId::CommitCount);
    map
}

/// Accepts the release/lock literals as TOML strings, booleans or integers,
/// normalising to the string written into files (`true` -> `"True"`).
fn literal<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match toml::Value::deserialize(deserializer)? {
        toml::Value::String(s) => Ok(s),
        toml::Value::Boolean(true) => Ok("True".to_string()),
        toml::Value::Boolean(false) => Ok("False".to_string()),
        toml::Value::Integer(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string, boolean or integer, found {}",
            other.type_str()
        ))),
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            targets: default_targets(),
            prerelease_token: default_prerelease_token(),
            build_token: default_build_token(),
            tag_template: default_tag_template(),
            latest_tag: None,
            released_value: default_released_value(),
            lock_value: default_lock_value(),
            unlock_value: default_unlock_value(),
            renamed_counts_as_added: false,
            regexers: default_regexers(),
            trigger_patterns: default_trigger_patterns(),
            key_aliases: default_key_aliases(),
        }
    }
}

impl Config {
    /// The alias table compiled into its lookup form.
    pub fn field_aliases(&self) -> FieldAliases {
        FieldAliases::new(self.key_aliases.clone())
    }

    /// The tag template compiled into its formatting/matching form.
    pub fn template(&self) -> TagTemplate {
        TagTemplate::new(self.tag_template.clone())
    }

    /// Write this configuration out as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let body =
            toml::to_string_pretty(self).map_err(|e| AutoverError::config(e.to_string()))?;
        fs::write(path, format!("# autover configuration\n{}", body))?;
        Ok(())
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter (written out with defaults if the
///    file does not exist yet)
/// 2. `autover.toml` in current directory
/// 3. `.autover.toml` in user config directory
/// 4. Default configuration if no file found
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_path {
        if path.is_file() {
            tracing::debug!("loading config from {}", path.display());
            return parse(&fs::read_to_string(path)?);
        }
        let config = Config::default();
        config.save(path)?;
        tracing::info!("wrote default config to {}", path.display());
        return Ok(config);
    }

    let local = Path::new("./autover.toml");
    if local.is_file() {
        tracing::debug!("loading config from {}", local.display());
        return parse(&fs::read_to_string(local)?);
    }

    if let Some(config_dir) = dirs::config_dir() {
        let fallback = config_dir.join(".autover.toml");
        if fallback.is_file() {
            tracing::debug!("loading config from {}", fallback.display());
            return parse(&fs::read_to_string(fallback)?);
        }
    }

    Ok(Config::default())
}

fn parse(text: &str) -> Result<Config> {
    toml::from_str(text).map_err(|e| AutoverError::config(e.to_string()))
}
