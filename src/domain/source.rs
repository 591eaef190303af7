use crate::error::{AutoverError, Result};
use std::fmt;
use std::str::FromStr;

/// Where the current version may be read from, in the order ordering
/// matters to callers: sources are consulted first to last and the first
/// one that yields a version wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VersionSource {
    /// Version fields in the configured target files.
    CurrentFiles,
    /// Highest version tag that is an ancestor of HEAD.
    PreviousVersionTag,
    /// Highest release-version tag that is an ancestor of HEAD.
    PreviousReleaseTag,
    /// Highest version tag anywhere in the repository.
    LatestVersionTag,
    /// Highest release-version tag anywhere in the repository.
    LatestReleaseTag,
}

impl VersionSource {
    /// Whether resolving this source needs a repository.
    pub fn is_vcs(&self) -> bool {
        !matches!(self, VersionSource::CurrentFiles)
    }

    /// Whether this source only considers finalized `X.Y.Z` tags.
    pub fn releases_only(&self) -> bool {
        matches!(
            self,
            VersionSource::PreviousReleaseTag | VersionSource::LatestReleaseTag
        )
    }

    /// Whether this source is restricted to ancestors of HEAD.
    pub fn ancestors_only(&self) -> bool {
        matches!(
            self,
            VersionSource::PreviousVersionTag | VersionSource::PreviousReleaseTag
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            VersionSource::CurrentFiles => "source",
            VersionSource::PreviousVersionTag => "vcs-prev-version",
            VersionSource::PreviousReleaseTag => "vcs-prev-release",
            VersionSource::LatestVersionTag => "vcs-global-version",
            VersionSource::LatestReleaseTag => "vcs-global-release",
        }
    }
}

impl fmt::Display for VersionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for VersionSource {
    type Err = AutoverError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "source" => Ok(VersionSource::CurrentFiles),
            "vcs-prev-version" => Ok(VersionSource::PreviousVersionTag),
            "vcs-prev-release" => Ok(VersionSource::PreviousReleaseTag),
            "vcs-global-version" => Ok(VersionSource::LatestVersionTag),
            "vcs-global-release" => Ok(VersionSource::LatestReleaseTag),
            other => Err(AutoverError::config(format!(
                "unknown version source: {:?}",
                other
            ))),
        }
    }
}

/// Where the computed version is written back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PersistTarget {
    /// Substitute the new field values into the target files.
    SourceFiles,
    /// Create a version tag on the current commit.
    Vcs,
}

impl PersistTarget {
    pub fn name(&self) -> &'static str {
        match self {
            PersistTarget::SourceFiles => "source",
            PersistTarget::Vcs => "vcs",
        }
    }
}

impl fmt::Display for PersistTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for PersistTarget {
    type Err = AutoverError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "source" => Ok(PersistTarget::SourceFiles),
            "vcs" => Ok(PersistTarget::Vcs),
            other => Err(AutoverError::config(format!(
                "unknown persistence target: {:?}",
                other
            ))),
        }
    }
}
