use crate::error::{AutoverError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// One significant figure of a SemVer string, most significant first.
///
/// The declaration order is the significance order, so the derived `Ord`
/// sorts a `BTreeSet<SigFig>` from most to least significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SigFig {
    Major,
    Minor,
    Patch,
    Prerelease,
    Build,
}

impl SigFig {
    /// All figures in significance order.
    pub const ALL: [SigFig; 5] = [
        SigFig::Major,
        SigFig::Minor,
        SigFig::Patch,
        SigFig::Prerelease,
        SigFig::Build,
    ];

    /// True when `self` is strictly more significant than `other`.
    pub fn outranks(self, other: SigFig) -> bool {
        (self as u8) < (other as u8)
    }

    pub fn name(self) -> &'static str {
        match self {
            SigFig::Major => "major",
            SigFig::Minor => "minor",
            SigFig::Patch => "patch",
            SigFig::Prerelease => "prerelease",
            SigFig::Build => "build",
        }
    }
}

/// The most significant figure present in the set, if any.
pub fn most_significant(figs: &BTreeSet<SigFig>) -> Option<SigFig> {
    figs.iter().next().copied()
}

/// The least significant figure present in the set, if any.
pub fn least_significant(figs: &BTreeSet<SigFig>) -> Option<SigFig> {
    figs.iter().next_back().copied()
}

impl fmt::Display for SigFig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SigFig {
    type Err = AutoverError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "major" => Ok(SigFig::Major),
            "minor" => Ok(SigFig::Minor),
            "patch" => Ok(SigFig::Patch),
            "prerelease" => Ok(SigFig::Prerelease),
            "build" => Ok(SigFig::Build),
            other => Err(AutoverError::invalid_sigfig(format!(
                "{:?} (expected one of major, minor, patch, prerelease, build)",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(figs: &[SigFig]) -> BTreeSet<SigFig> {
        figs.iter().copied().collect()
    }

    #[test]
    fn test_most_significant() {
        assert_eq!(
            most_significant(&set(&[SigFig::Minor, SigFig::Patch])),
            Some(SigFig::Minor)
        );
        assert_eq!(most_significant(&set(&[])), None);
    }

    #[test]
    fn test_least_significant() {
        assert_eq!(
            least_significant(&set(&[SigFig::Minor, SigFig::Major])),
            Some(SigFig::Minor)
        );
    }

    #[test]
    fn test_outranks() {
        assert!(!SigFig::Minor.outranks(SigFig::Major));
        assert!(!SigFig::Minor.outranks(SigFig::Minor));
        assert!(SigFig::Major.outranks(SigFig::Patch));
        assert!(SigFig::Patch.outranks(SigFig::Prerelease));
        assert!(SigFig::Prerelease.outranks(SigFig::Build));
    }

    #[test]
    fn test_parse_round_trip() {
        for fig in SigFig::ALL {
            assert_eq!(fig.name().parse::<SigFig>().unwrap(), fig);
        }
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "banana".parse::<SigFig>().unwrap_err();
        assert!(err.to_string().contains("banana"));
        assert!(err.to_string().contains("Not a significant figure"));
    }

    #[test]
    fn test_btreeset_iterates_in_significance_order() {
        let figs = set(&[SigFig::Build, SigFig::Major, SigFig::Patch]);
        let ordered: Vec<SigFig> = figs.iter().copied().collect();
        assert_eq!(ordered, vec![SigFig::Major, SigFig::Patch, SigFig::Build]);
    }
}
