//! Trigger aggregation - merges explicit bump requests with file-presence
//! triggers into the set of significant figures to increment.
//!
//! File triggers: the existence of files matching configured globs (news
//! fragments, typically) votes for a bump at the mapped figure. When the
//! commit of the last release is known, only files added since that commit
//! count, which lets a project keep old news files around forever.

use crate::config::Config;
use crate::domain::SigFig;
use crate::error::{AutoverError, Result};
use crate::vcs::Vcs;
use std::collections::BTreeSet;
use std::path::Path;

/// The aggregated trigger set plus the files that caused it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TriggerReport {
    pub triggers: BTreeSet<SigFig>,
    pub files: BTreeSet<String>,
}

/// Detect file-presence triggers.
///
/// `boundary` is the commit of the last release, when known; without it all
/// matching files count as new.
pub fn detect<V: Vcs>(
    config: &Config,
    vcs: &V,
    boundary: Option<&str>,
    work_dir: &Path,
) -> Result<TriggerReport> {
    let mut report = TriggerReport::default();
    for (pattern, fig) in &config.trigger_patterns {
        let full_pattern = work_dir.join(pattern);
        let mut matches = BTreeSet::new();
        let entries = glob::glob(&full_pattern.to_string_lossy()).map_err(|e| {
            AutoverError::config(format!("bad trigger pattern {:?}: {}", pattern, e))
        })?;
        for entry in entries {
            let path = entry.map_err(glob::GlobError::into_error)?;
            let relative = path.strip_prefix(work_dir).unwrap_or(&path);
            matches.insert(relative.to_string_lossy().into_owned());
        }
        if matches.is_empty() {
            tracing::debug!("trigger: no match on {:?}", pattern);
            continue;
        }

        if let Some(boundary) = boundary {
            // git's filter syntax is compatible with the glob syntax
            // we're already using
            let added: BTreeSet<String> = vcs
                .added_since(boundary, pattern, config.renamed_counts_as_added)?
                .into_iter()
                .collect();
            tracing::debug!("trigger: added since last release: {:?}", added);
            matches.retain(|path| added.contains(path));
        }

        if matches.is_empty() {
            tracing::debug!("trigger: no match on {:?} because files aren't new", pattern);
            continue;
        }
        tracing::debug!("trigger: {} bump from {:?}: {:?}", fig, pattern, matches);
        report.triggers.insert(*fig);
        report.files.extend(matches);
    }
    Ok(report)
}

/// Aggregated set of significant figures to bump: file triggers when
/// enabled, plus the explicit bump request.
pub fn aggregate<V: Vcs>(
    bump: Option<SigFig>,
    file_triggers_enabled: bool,
    config: &Config,
    vcs: &V,
    boundary: Option<&str>,
    work_dir: &Path,
) -> Result<TriggerReport> {
    let mut report = if file_triggers_enabled {
        detect(config, vcs, boundary, work_dir)?
    } else {
        TriggerReport::default()
    };
    if let Some(fig) = bump {
        tracing::debug!("trigger: {} bump requested", fig);
        report.triggers.insert(fig);
    }
    Ok(report)
}
