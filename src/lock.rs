//! Lock state machine - a two-state gate over the trigger set.
//!
//! An explicit lock request writes the lock literal for the next run to
//! find. A run that arrives with triggers while the persisted lock field
//! holds that literal consumes the lock instead: triggers are cleared and
//! the unlock literal is written, so exactly one bump gets suppressed.

use crate::config::Config;
use crate::domain::{FieldAliases, FieldId, SigFig};
use std::collections::{BTreeMap, BTreeSet};

/// Work out the lock field update, mutating `triggers` when the lock is
/// consumed. Comparison against the persisted value is string-exact.
pub fn apply(
    explicit_lock: bool,
    file_data: &BTreeMap<String, String>,
    aliases: &FieldAliases,
    triggers: &mut BTreeSet<SigFig>,
    config: &Config,
) -> Option<(FieldId, String)> {
    if explicit_lock {
        tracing::debug!("locking version for the next run");
        return Some((FieldId::Lock, config.lock_value.clone()));
    }
    if triggers.is_empty() {
        return None;
    }
    let lock_key = aliases.native_for(FieldId::Lock)?;
    let persisted = file_data.get(lock_key)?;
    if *persisted == config.lock_value {
        tracing::info!("version is locked: skipping this bump and unlocking");
        triggers.clear();
        return Some((FieldId::Lock, config.unlock_value.clone()));
    }
    None
}
