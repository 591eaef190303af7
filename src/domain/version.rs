//! SemVer adapter - pure value transforms over `semver::Version`.
//!
//! Bump semantics: incrementing a numeric figure zeroes everything less
//! significant and clears prerelease/build; incrementing prerelease or build
//! advances a `<token>.N` counter inside that component.

use crate::domain::sigfig::SigFig;
use crate::error::{AutoverError, Result};
use semver::{BuildMetadata, Prerelease, Version};

/// Parse a version string, failing with the offending text in the message.
pub fn parse(text: &str) -> Result<Version> {
    Version::parse(text.trim())
        .map_err(|e| AutoverError::parse(format!("{:?}: {}", text.trim(), e)))
}

/// A version or `None`, for scanning text that may not be a version at all.
pub fn try_parse(text: &str) -> Option<Version> {
    match Version::parse(text.trim()) {
        Ok(version) => Some(version),
        Err(_) => {
            tracing::debug!("version string is not semver-compatible: {:?}", text);
            None
        }
    }
}

/// True iff the version carries neither prerelease nor build metadata.
pub fn is_release(version: &Version) -> bool {
    version.pre.is_empty() && version.build.is_empty()
}

/// The release this version belongs to: prerelease and build stripped.
pub fn finalize(version: &Version) -> Version {
    Version::new(version.major, version.minor, version.patch)
}

/// The most significant figure at which two versions differ, or `None` when
/// identical across all five. Prerelease and build compare textually.
pub fn diff(a: &Version, b: &Version) -> Option<SigFig> {
    if a.major != b.major {
        Some(SigFig::Major)
    } else if a.minor != b.minor {
        Some(SigFig::Minor)
    } else if a.patch != b.patch {
        Some(SigFig::Patch)
    } else if a.pre != b.pre {
        Some(SigFig::Prerelease)
    } else if a.build != b.build {
        Some(SigFig::Build)
    } else {
        None
    }
}

/// Increment one figure. Numeric bumps zero the lesser figures and clear
/// prerelease/build; prerelease and build bumps use their configured token.
pub fn bump(
    version: &Version,
    fig: SigFig,
    prerelease_token: &str,
    build_token: &str,
) -> Result<Version> {
    match fig {
        SigFig::Major => Ok(Version::new(version.major + 1, 0, 0)),
        SigFig::Minor => Ok(Version::new(version.major, version.minor + 1, 0)),
        SigFig::Patch => Ok(Version::new(version.major, version.minor, version.patch + 1)),
        SigFig::Prerelease => bump_prerelease(version, prerelease_token),
        SigFig::Build => bump_build(version, build_token),
    }
}

/// Advance the prerelease counter, seeding `<token>.0` when absent.
/// Build metadata is dropped. An existing identifier keeps its own token:
/// `1.2.3-RC.1` becomes `1.2.3-RC.2` whatever the configured token is.
pub fn bump_prerelease(version: &Version, token: &str) -> Result<Version> {
    let seed = if version.pre.is_empty() {
        format!("{}.0", token)
    } else {
        version.pre.as_str().to_string()
    };
    let next = increment_identifier(&seed);
    let mut out = finalize(version);
    out.pre =
        Prerelease::new(&next).map_err(|e| AutoverError::parse(format!("{:?}: {}", next, e)))?;
    Ok(out)
}

/// Advance the build counter, seeding `<token>.0` when absent.
/// Prerelease is untouched.
pub fn bump_build(version: &Version, token: &str) -> Result<Version> {
    let seed = if version.build.is_empty() {
        format!("{}.0", token)
    } else {
        version.build.as_str().to_string()
    };
    let next = increment_identifier(&seed);
    let mut out = version.clone();
    out.build =
        BuildMetadata::new(&next).map_err(|e| AutoverError::parse(format!("{:?}: {}", next, e)))?;
    Ok(out)
}

/// A copy of `version` with exactly one figure replaced by an explicit value.
/// Prerelease/build values gain their token prefix; numeric figures must
/// parse as integers.
pub fn with_part(
    version: &Version,
    fig: SigFig,
    raw: &str,
    prerelease_token: &str,
    build_token: &str,
) -> Result<Version> {
    let mut out = version.clone();
    match fig {
        SigFig::Major => out.major = parse_component(raw)?,
        SigFig::Minor => out.minor = parse_component(raw)?,
        SigFig::Patch => out.patch = parse_component(raw)?,
        SigFig::Prerelease => {
            let ident = format!("{}.{}", prerelease_token, raw.trim());
            out.pre = Prerelease::new(&ident)
                .map_err(|e| AutoverError::parse(format!("{:?}: {}", ident, e)))?;
        }
        SigFig::Build => {
            let ident = format!("{}.{}", build_token, raw.trim());
            out.build = BuildMetadata::new(&ident)
                .map_err(|e| AutoverError::parse(format!("{:?}: {}", ident, e)))?;
        }
    }
    Ok(out)
}

/// The highest-precedence version, build metadata ignored for ordering.
/// Ties on precedence keep the later entry.
pub fn latest(mut versions: Vec<Version>) -> Option<Version> {
    versions.sort_by(|a, b| a.cmp_precedence(b));
    versions.pop()
}

fn parse_component(raw: &str) -> Result<u64> {
    raw.trim()
        .parse()
        .map_err(|_| AutoverError::parse(format!("{:?} is not a numeric version component", raw)))
}

/// Increment the last run of digits in a dotted identifier, e.g. `dev.1`
/// to `dev.2`. An identifier without digits gets a `.1` counter appended.
/// Leading zeros are dropped on the way (the SemVer grammar rejects them
/// in numeric identifiers).
fn increment_identifier(ident: &str) -> String {
    let bytes = ident.as_bytes();
    let mut end = bytes.len();
    while end > 0 && !bytes[end - 1].is_ascii_digit() {
        end -= 1;
    }
    if end == 0 {
        return format!("{}.1", ident);
    }
    let mut start = end;
    while start > 0 && bytes[start - 1].is_ascii_digit() {
        start -= 1;
    }
    match ident[start..end].parse::<u64>() {
        Ok(n) => format!("{}{}{}", &ident[..start], n + 1, &ident[end..]),
        Err(_) => format!("{}.1", ident),
    }
}
