//! File gateway - reads and rewrites version fields in target files.
//!
//! Each target file is handled line by line with the regex registered for
//! its extension. Matching is done on the whitespace-stripped line, and the
//! replacement is spliced back into the original line, so indentation,
//! quoting, trailing comments and line endings all survive a rewrite.

use crate::config::Config;
use crate::error::{AutoverError, Result};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

const KEY_GROUP: &str = "KEY";
const VALUE_GROUP: &str = "VALUE";

/// Compiled per-extension regex registry.
pub struct RegexRegistry {
    by_extension: BTreeMap<String, Regex>,
}

impl RegexRegistry {
    /// Compile every configured regex up front, so a bad pattern fails the
    /// run before any file is touched.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut by_extension = BTreeMap::new();
        for (ext, pattern) in &config.regexers {
            let regex = Regex::new(pattern).map_err(|e| {
                AutoverError::config(format!("invalid regex for {:?}: {}", ext, e))
            })?;
            by_extension.insert(ext.clone(), regex);
        }
        Ok(RegexRegistry { by_extension })
    }

    /// The regex registered for a target's extension.
    pub fn for_path(&self, path: &Path) -> Result<&Regex> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();
        self.by_extension.get(&ext).ok_or_else(|| {
            AutoverError::config(format!(
                "no regex registered for extension {:?} ({})",
                ext,
                path.display()
            ))
        })
    }
}

/// Read key/value pairs from every target. Later occurrences win, within a
/// file and across files.
pub fn read_fields(
    registry: &RegexRegistry,
    targets: &[PathBuf],
) -> Result<BTreeMap<String, String>> {
    let mut results = BTreeMap::new();
    for target in targets {
        let regex = registry.for_path(target)?;
        let text = fs::read_to_string(target)?;
        for line in text.lines() {
            let content = line.trim();
            let caps = match regex.captures(content) {
                Some(caps) => caps,
                None => continue,
            };
            let key = match caps.name(KEY_GROUP) {
                Some(m) => m.as_str(),
                None => continue,
            };
            // an empty assignment has no value capture and records nothing
            if let Some(value) = caps.name(VALUE_GROUP) {
                results.insert(key.to_string(), value.as_str().to_string());
            }
        }
    }
    tracing::debug!("found the following key-value pairs in source: {:?}", results);
    Ok(results)
}

/// Substitute new values into every target.
///
/// Keys are consumed as they are replaced; a key that matched in no target
/// is an error, since it means config and sources have drifted apart.
/// Matched keys that carry no update pass through untouched.
pub fn write_fields(
    registry: &RegexRegistry,
    targets: &[PathBuf],
    updates: &BTreeMap<String, String>,
) -> Result<()> {
    let mut missing: BTreeSet<String> = updates.keys().cloned().collect();
    for target in targets {
        let regex = registry.for_path(target)?;
        let text = fs::read_to_string(target)?;
        let replaced: String = text
            .split_inclusive('\n')
            .map(|line| substitute_line(regex, line, updates, &mut missing))
            .collect();
        fs::write(target, replaced)?;
    }
    if !missing.is_empty() {
        return Err(AutoverError::incomplete_write(format!("{:?}", missing)));
    }
    Ok(())
}

/// Rewrite one raw line (line ending included), splicing the update for its
/// key into the value span. A match with a zero-width or absent value gets
/// the new value inserted at the end of the stripped content, e.g.
/// `blah=` becomes `blah=text`.
fn substitute_line(
    regex: &Regex,
    line: &str,
    updates: &BTreeMap<String, String>,
    missing: &mut BTreeSet<String>,
) -> String {
    let content = line.trim();
    let caps = match regex.captures(content) {
        Some(caps) => caps,
        None => return line.to_string(),
    };
    let key = match caps.name(KEY_GROUP) {
        Some(m) => m.as_str(),
        None => return line.to_string(),
    };
    let value = match updates.get(key) {
        Some(value) => value,
        None => return line.to_string(),
    };
    let (start, end) = match caps.name(VALUE_GROUP) {
        Some(m) => (m.start(), m.end()),
        None => {
            let at = content.trim_end().len();
            (at, at)
        }
    };
    let replaced = format!("{}{}{}", &content[..start], value, &content[end..]);
    missing.remove(key);
    line.replacen(content, &replaced, 1)
}
