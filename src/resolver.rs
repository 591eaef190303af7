//! Current-version resolution - files first, tags as fallback.
//!
//! Sources are consulted in the caller's order and the first hit wins.
//! The file source is strict: once target files are in play, a missing or
//! self-contradictory version is an error, never a silent fallthrough.

use crate::domain::{version, FieldAliases, FieldId, SigFig, TagTemplate, VersionSource};
use crate::error::{AutoverError, Result};
use crate::vcs::Vcs;
use semver::Version;
use std::collections::{BTreeMap, BTreeSet};

/// Try each source in order and return the first version found.
///
/// Tag sources yield `None` when no matching tag exists, allowing the next
/// source to take over. `Ok(None)` means every source came up empty.
pub fn resolve<V: Vcs>(
    sources: &[VersionSource],
    file_data: &BTreeMap<String, String>,
    aliases: &FieldAliases,
    template: &TagTemplate,
    vcs: &V,
) -> Result<Option<Version>> {
    for source in sources {
        let found = match source {
            VersionSource::CurrentFiles => Some(from_files(file_data, aliases)?),
            _ => tag_version(vcs, template, *source)?,
        };
        match found {
            Some(found) => {
                tracing::info!("version found in {}: {}", source, found);
                return Ok(Some(found));
            }
            None => tracing::debug!("no version found in {}", source),
        }
    }
    Ok(None)
}

/// Reconstruct the version recorded in target-file fields.
///
/// Preference order: the full version field (retains prerelease/build),
/// then the strict field, then assembly from individual part fields. All
/// parsed reconstructions must agree once finalized; disagreement means
/// the targets have drifted apart and is an error.
pub fn from_files(
    file_data: &BTreeMap<String, String>,
    aliases: &FieldAliases,
) -> Result<Version> {
    let mut known: BTreeMap<FieldId, String> = BTreeMap::new();
    for (native, field) in aliases.iter() {
        if let Some(value) = file_data.get(native) {
            known.insert(field, value.clone());
        }
    }
    tracing::debug!("valid, mapped keys: {:?}", known);

    let mut potentials: Vec<String> = Vec::new();
    if let Some(value) = known.get(&FieldId::Version) {
        potentials.push(value.clone());
    }
    if let Some(value) = known.get(&FieldId::VersionStrict) {
        potentials.push(value.clone());
    }
    if let Some(assembled) = assemble(&known) {
        potentials.push(assembled);
    }

    let parsed: Vec<Version> = potentials
        .iter()
        .filter_map(|text| version::try_parse(text))
        .collect();

    let releases: BTreeSet<Version> = parsed.iter().map(version::finalize).collect();
    if releases.len() > 1 {
        let listed = releases
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        return Err(AutoverError::conflict(format!(
            "{}\nkeys were: {:?}",
            listed, known
        )));
    }

    match parsed.into_iter().next() {
        Some(found) => Ok(found),
        None => {
            tracing::debug!("key pairs found: {:?}", known);
            Err(AutoverError::not_found(
                "could not find existing version in source files",
            ))
        }
    }
}

/// The highest version among tags matching the template, filtered per the
/// source's ancestry/release rules.
fn tag_version<V: Vcs>(
    vcs: &V,
    template: &TagTemplate,
    source: VersionSource,
) -> Result<Option<Version>> {
    let tags = vcs.list_tags(&template.glob())?;
    tracing::debug!("tags matching {:?}: {:?}", template.glob(), tags);
    let mut versions = template.versions(&tags);
    if source.releases_only() {
        versions.retain(version::is_release);
    }
    if source.ancestors_only() {
        versions.retain(|v| vcs.is_ancestor(&template.format(&v.to_string()), "HEAD"));
    }
    Ok(version::latest(versions))
}

/// The most recent full release reachable from the current commit, used by
/// the increment engine to judge how big an already-started prerelease is.
pub fn last_release<V: Vcs>(vcs: &V, template: &TagTemplate) -> Result<Option<Version>> {
    tag_version(vcs, template, VersionSource::PreviousReleaseTag)
}

/// The commit a version's tag points at, if such a tag exists. Best
/// effort: an unknown tag is normal for projects that never tagged.
pub fn release_boundary<V: Vcs>(
    vcs: &V,
    template: &TagTemplate,
    version: &Version,
) -> Option<String> {
    let tag = template.format(&version.to_string());
    match vcs.rev_parse(&tag) {
        Ok(commit) => {
            tracing::debug!("the commit of the last release is {}", commit);
            Some(commit)
        }
        Err(e) => {
            tracing::debug!("no commit found for tag {:?}: {}", tag, e);
            None
        }
    }
}

fn assemble(known: &BTreeMap<FieldId, String>) -> Option<String> {
    let major = known.get(&FieldId::Part(SigFig::Major))?;
    let minor = known.get(&FieldId::Part(SigFig::Minor))?;
    let patch = known.get(&FieldId::Part(SigFig::Patch))?;
    let mut text = format!("{}.{}.{}", major.trim(), minor.trim(), patch.trim());
    if let Some(pre) = known.get(&FieldId::Part(SigFig::Prerelease)) {
        text.push('-');
        text.push_str(pre.trim());
    }
    if let Some(build) = known.get(&FieldId::Part(SigFig::Build)) {
        text.push('+');
        text.push_str(build.trim());
    }
    Some(text)
}
