//! Version increment engine.
//!
//! Defines how the version moves given the current version, the previous
//! release (when known) and the set of triggered significant figures.
//! Every structural bump lands in prerelease form; promotion to a plain
//! release is a separate step handled by the workflow's release mode.

use crate::domain::{sigfig, version, SigFig};
use crate::error::Result;
use semver::Version;
use std::collections::{BTreeMap, BTreeSet};

/// Compute the next version.
///
/// The trigger set is treated as advisory and may be adjusted:
///
/// 1. A prerelease that already reflects a bump at least as significant as
///    the one requested only advances its prerelease counter. A request
///    MORE significant than the recorded difference re-bumps at the new
///    figure instead.
/// 2. Bumping away from a release always increments at least patch, so a
///    release never turns into a prerelease of itself.
///
/// Overrides pin individual figures after the bump, prerelease/build
/// values gaining their configured token prefix.
pub fn increment(
    current: &Version,
    last_release: Option<&Version>,
    triggers: &BTreeSet<SigFig>,
    overrides: &BTreeMap<SigFig, String>,
    prerelease_token: &str,
    build_token: &str,
) -> Result<Version> {
    let mut triggers = triggers.clone();

    if !version::is_release(current) {
        if let (Some(requested), Some(last_release)) =
            (sigfig::most_significant(&triggers), last_release)
        {
            if let Some(historical) = version::diff(current, last_release) {
                if !requested.outranks(historical) {
                    tracing::debug!(
                        "{} trigger does not exceed the {} step already taken since {}; \
                         advancing prerelease only",
                        requested,
                        historical,
                        last_release
                    );
                    triggers = BTreeSet::from([SigFig::Prerelease]);
                }
            }
        }
    }

    if version::is_release(current) {
        triggers.insert(SigFig::Patch);
    }

    let mut proposed = current.clone();
    if let Some(bump_fig) = sigfig::most_significant(&triggers) {
        proposed = version::bump(&proposed, bump_fig, prerelease_token, build_token)?;
        if bump_fig.outranks(SigFig::Prerelease) {
            proposed = version::bump_prerelease(&proposed, prerelease_token)?;
        }
    }

    for (fig, raw) in overrides {
        tracing::debug!("overriding {} with {}", fig, raw);
        proposed = version::with_part(&proposed, *fig, raw, prerelease_token, build_token)?;
    }

    Ok(proposed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(text: &str) -> Version {
        version::parse(text).unwrap()
    }

    fn next(
        current: &str,
        last_release: Option<&str>,
        triggers: &[SigFig],
        overrides: &[(SigFig, &str)],
    ) -> String {
        let current = v(current);
        let last_release = last_release.map(v);
        let triggers: BTreeSet<SigFig> = triggers.iter().copied().collect();
        let overrides: BTreeMap<SigFig, String> = overrides
            .iter()
            .map(|(fig, raw)| (*fig, raw.to_string()))
            .collect();
        increment(
            &current,
            last_release.as_ref(),
            &triggers,
            &overrides,
            "dev",
            "build",
        )
        .unwrap()
        .to_string()
    }

    #[test]
    fn test_release_bump_lands_in_prerelease_form() {
        assert_eq!(next("1.2.3", None, &[SigFig::Minor], &[]), "1.3.0-dev.1");
        assert_eq!(next("1.2.3", None, &[SigFig::Major], &[]), "2.0.0-dev.1");
    }

    #[test]
    fn test_release_forces_minimum_patch_step() {
        assert_eq!(
            next("1.2.3", None, &[SigFig::Prerelease], &[]),
            "1.2.4-dev.1"
        );
        // the forced patch outranks a build trigger too
        assert_eq!(next("1.2.3", None, &[SigFig::Build], &[]), "1.2.4-dev.1");
    }

    #[test]
    fn test_prerelease_advances_its_counter() {
        assert_eq!(
            next("1.2.3-dev.1", None, &[SigFig::Prerelease], &[]),
            "1.2.3-dev.2"
        );
    }

    #[test]
    fn test_release_with_history_still_bumps() {
        assert_eq!(
            next("1.2.3", Some("1.2.2"), &[SigFig::Minor], &[]),
            "1.3.0-dev.1"
        );
    }

    #[test]
    fn test_lesser_trigger_is_demoted_to_prerelease() {
        assert_eq!(
            next("1.1.0-dev.3", Some("1.0.0"), &[SigFig::Patch], &[]),
            "1.1.0-dev.4"
        );
        assert_eq!(
            next("1.2.3-dev.1", Some("1.2.2"), &[SigFig::Patch], &[]),
            "1.2.3-dev.2"
        );
    }

    #[test]
    fn test_greater_trigger_rebumps() {
        assert_eq!(
            next("1.2.3-dev.1", Some("1.2.2"), &[SigFig::Minor], &[]),
            "1.3.0-dev.1"
        );
    }

    #[test]
    fn test_build_bump_stays_sub_prerelease() {
        assert_eq!(
            next("19.99.0+build.1", None, &[SigFig::Build], &[]),
            "19.99.0+build.2"
        );
    }

    #[test]
    fn test_existing_prerelease_token_is_kept() {
        assert_eq!(
            next("1.2.3-RC.1", None, &[SigFig::Prerelease], &[]),
            "1.2.3-RC.2"
        );
    }

    #[test]
    fn test_override_pins_figure_after_bump() {
        assert_eq!(
            next("1.2.3", None, &[SigFig::Minor], &[(SigFig::Build, "42")]),
            "1.3.0-dev.1+build.42"
        );
        assert_eq!(
            next("1.2.3", None, &[SigFig::Minor], &[(SigFig::Patch, "99")]),
            "1.3.99-dev.1"
        );
    }

    #[test]
    fn test_empty_triggers_apply_overrides_only() {
        assert_eq!(
            next("1.2.3-dev.1", None, &[], &[(SigFig::Build, "7")]),
            "1.2.3-dev.1+build.7"
        );
    }
}
