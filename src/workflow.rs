//! Main workflow orchestration logic
//!
//! Ties the components together for one run: resolve the current version,
//! aggregate triggers, apply the lock, compute the new version, then fan
//! the resulting fields out to files and/or a tag.

use crate::config::Config;
use crate::domain::{version, FieldId, PersistTarget, SigFig, VersionSource};
use crate::error::{AutoverError, Result};
use crate::file_ops::{self, RegexRegistry};
use crate::vcs::Vcs;
use crate::{engine, lock, resolver, triggers};
use semver::Version;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Arguments for one versioning run
///
/// Mirrors the CLI flags but in a format suitable for calling the workflow
/// programmatically without depending on clap.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    /// Set the version to exactly this string instead of bumping
    pub set_to: Option<String>,

    /// Explicitly requested significant-figure bump
    pub bump: Option<SigFig>,

    /// Pin this figure to the repository's commit count
    pub commit_count_as: Option<SigFig>,

    /// Strip prerelease/build and mark the release field
    pub release: bool,

    /// Lock the version against the next bump
    pub lock: bool,

    /// Enable file-presence triggers
    pub file_triggers: bool,

    /// Compute everything but write nothing
    pub dry_run: bool,

    /// Sources consulted for the current version, in order
    pub persist_from: Vec<VersionSource>,

    /// Destinations the new version is written to
    pub persist_to: Vec<PersistTarget>,

    /// Extra native key/value pairs to substitute alongside the version
    pub extra_updates: BTreeMap<String, String>,

    /// Directory targets and trigger patterns are relative to
    pub work_dir: PathBuf,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            set_to: None,
            bump: None,
            commit_count_as: None,
            release: false,
            lock: false,
            file_triggers: false,
            dry_run: false,
            persist_from: vec![VersionSource::CurrentFiles],
            persist_to: vec![PersistTarget::SourceFiles],
            extra_updates: BTreeMap::new(),
            work_dir: PathBuf::from("."),
        }
    }
}

/// Result of a completed run
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    /// The version before this run, when one could be resolved
    pub previous: Option<String>,

    /// The version as persisted (release runs persist the finalized form)
    pub current: String,

    /// Native key/value pairs written (or, on a dry run, that would be)
    pub updates: BTreeMap<String, String>,

    /// Files that fired file-presence triggers
    pub trigger_files: BTreeSet<String>,
}

/// Execute one versioning run.
///
/// 1. Read target files (when they are a configured source)
/// 2. Resolve the current version and, for repository-backed runs, the
///    last release and its commit
/// 3. Aggregate triggers and let the lock filter them
/// 4. Compute the new version (explicit set wins over triggers)
/// 5. Fan fields out through the alias table and persist
pub fn run<V: Vcs>(options: &RunOptions, config: &Config, vcs: &V) -> Result<RunOutcome> {
    let aliases = config.field_aliases();
    let registry = RegexRegistry::from_config(config)?;
    let template = config.template();
    let targets: Vec<PathBuf> = config
        .targets
        .iter()
        .map(|target| options.work_dir.join(target))
        .collect();

    let reads_files = options
        .persist_from
        .contains(&VersionSource::CurrentFiles);
    let file_data = if reads_files {
        file_ops::read_fields(&registry, &targets)?
    } else {
        BTreeMap::new()
    };

    let current = resolver::resolve(&options.persist_from, &file_data, &aliases, &template, vcs)?;

    let uses_vcs_source = options.persist_from.iter().any(|source| source.is_vcs());
    let boundary = if uses_vcs_source {
        current
            .as_ref()
            .and_then(|found| resolver::release_boundary(vcs, &template, found))
    } else {
        None
    };
    let last_release = if uses_vcs_source {
        resolver::last_release(vcs, &template)?
    } else {
        None
    };

    let mut report = triggers::aggregate(
        options.bump,
        options.file_triggers,
        config,
        vcs,
        boundary.as_deref(),
        &options.work_dir,
    )?;

    let mut updates: BTreeMap<FieldId, String> = BTreeMap::new();
    if let Some((field, value)) = lock::apply(
        options.lock,
        &file_data,
        &aliases,
        &mut report.triggers,
        config,
    ) {
        updates.insert(field, value);
    }

    // repository info is only gathered when something will use it; when
    // merely aliased, an unavailable repository downgrades to a warning
    let mut dvcs: Option<(String, String)> = None;
    let wants_dvcs = options.commit_count_as.is_some()
        || aliases.references(FieldId::Commit)
        || aliases.references(FieldId::CommitCount);
    if wants_dvcs {
        let info = vcs
            .rev_parse("HEAD")
            .and_then(|commit| Ok((commit, vcs.commit_count("HEAD")?)));
        match info {
            Ok((commit, count)) => dvcs = Some((commit, count.to_string())),
            Err(e) if options.commit_count_as.is_none() => {
                tracing::warn!("skipping commit fields, repository unavailable: {}", e);
            }
            Err(e) => return Err(e),
        }
    }
    if let Some((commit, count)) = &dvcs {
        updates.insert(FieldId::Commit, commit.clone());
        updates.insert(FieldId::CommitCount, count.clone());
    }

    let new_version = compute_new_version(
        options,
        config,
        &current,
        last_release.as_ref(),
        &report.triggers,
        &dvcs,
    )?;

    let finalized = version::finalize(&new_version);
    if options.release {
        updates.insert(FieldId::Release, config.released_value.clone());
    }
    let written = if options.release {
        finalized.clone()
    } else {
        new_version.clone()
    };
    updates.insert(FieldId::Version, written.to_string());
    updates.insert(FieldId::VersionStrict, finalized.to_string());
    insert_parts(&mut updates, &written);

    // only rewrite fields the user has aliased in the configuration
    let mut native_updates: BTreeMap<String, String> = BTreeMap::new();
    for (native, field) in aliases.iter() {
        if let Some(value) = updates.get(&field) {
            native_updates.insert(native.to_string(), value.clone());
        }
    }
    native_updates.extend(options.extra_updates.clone());

    if options.dry_run {
        tracing::warn!("dry run: no changes were made");
    } else {
        if options.persist_to.contains(&PersistTarget::SourceFiles) {
            file_ops::write_fields(&registry, &targets, &native_updates)?;
        }
        if options.persist_to.contains(&PersistTarget::Vcs) {
            let tag = template.format(&written.to_string());
            vcs.create_tag(&tag, &format!("version {}", written))?;
            if options.release {
                if let Some(latest) = &config.latest_tag {
                    vcs.force_move_tag(latest)?;
                }
            }
        }
    }

    Ok(RunOutcome {
        previous: current.map(|found| found.to_string()),
        current: written.to_string(),
        updates: native_updates,
        trigger_files: report.files,
    })
}

/// File-trigger report for external consumption, independent of whether
/// the run itself had file triggers enabled.
pub fn file_trigger_report<V: Vcs>(
    previous: Option<&str>,
    options: &RunOptions,
    config: &Config,
    vcs: &V,
) -> Result<BTreeSet<String>> {
    let template = config.template();
    let uses_vcs_source = options.persist_from.iter().any(|source| source.is_vcs());
    let boundary = match previous.and_then(version::try_parse) {
        Some(found) if uses_vcs_source => resolver::release_boundary(vcs, &template, &found),
        _ => None,
    };
    let report = triggers::detect(config, vcs, boundary.as_deref(), &options.work_dir)?;
    Ok(report.files)
}

fn compute_new_version(
    options: &RunOptions,
    config: &Config,
    current: &Option<Version>,
    last_release: Option<&Version>,
    triggers: &BTreeSet<SigFig>,
    dvcs: &Option<(String, String)>,
) -> Result<Version> {
    if let Some(set_to) = &options.set_to {
        tracing::debug!("setting version directly: {}", set_to);
        let parsed = version::parse(set_to)?;
        if !options.lock {
            tracing::warn!(
                "after setting the version manually, consider locking it \
                 for CI flows to avoid an extraneous increment"
            );
        }
        return Ok(parsed);
    }

    let current = current.clone().ok_or_else(|| {
        AutoverError::not_found("could not determine the current version from any configured source")
    })?;

    if triggers.is_empty() {
        return Ok(current);
    }

    tracing::debug!("auto-incrementing version (triggers: {:?})", triggers);
    let mut overrides: BTreeMap<SigFig, String> = BTreeMap::new();
    if let Some(fig) = options.commit_count_as {
        if let Some((_, count)) = dvcs {
            tracing::debug!("using commit count for {}: {}", fig, count);
            overrides.insert(fig, count.clone());
        }
    }
    engine::increment(
        &current,
        last_release,
        triggers,
        &overrides,
        &config.prerelease_token,
        &config.build_token,
    )
}

fn insert_parts(updates: &mut BTreeMap<FieldId, String>, version: &Version) {
    updates.insert(FieldId::Part(SigFig::Major), version.major.to_string());
    updates.insert(FieldId::Part(SigFig::Minor), version.minor.to_string());
    updates.insert(FieldId::Part(SigFig::Patch), version.patch.to_string());
    if !version.pre.is_empty() {
        updates.insert(
            FieldId::Part(SigFig::Prerelease),
            version.pre.as_str().to_string(),
        );
    }
    if !version.build.is_empty() {
        updates.insert(
            FieldId::Part(SigFig::Build),
            version.build.as_str().to_string(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vcs::MockVcs;
    use std::fs;
    use std::path::Path;

    const VERSION_FILE: &str = "_version.py";

    fn fixture(dir: &Path, version: &str, lock: &str) {
        let strict = version.split(&['-', '+'][..]).next().unwrap();
        let mut parts = strict.split('.');
        let major = parts.next().unwrap();
        let minor = parts.next().unwrap();
        let patch = parts.next().unwrap();
        let body = format!(
            "__version__ = \"{version}\"\n\
             __strict_version__ = \"{strict}\"\n\
             PRODUCTION = \"False\"\n\
             MAJOR = {major}\n\
             MINOR = {minor}\n\
             PATCH = {patch}\n\
             VERSION_LOCK = \"{lock}\"\n\
             COMMIT = \"unknown\"\n\
             COMMIT_COUNT = 0\n",
        );
        fs::write(dir.join(VERSION_FILE), body).unwrap();
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.targets = vec![VERSION_FILE.to_string()];
        config
    }

    fn options(dir: &Path) -> RunOptions {
        RunOptions {
            work_dir: dir.to_path_buf(),
            ..RunOptions::default()
        }
    }

    fn read_version_file(dir: &Path) -> String {
        fs::read_to_string(dir.join(VERSION_FILE)).unwrap()
    }

    #[test]
    fn test_minor_bump_lands_in_dev_form() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path(), "19.99.0", "False");
        let mut opts = options(dir.path());
        opts.bump = Some(SigFig::Minor);

        let outcome = run(&opts, &test_config(), &MockVcs::new()).unwrap();
        assert_eq!(outcome.previous.as_deref(), Some("19.99.0"));
        assert_eq!(outcome.current, "19.100.0-dev.1");

        let text = read_version_file(dir.path());
        assert!(text.contains("__version__ = \"19.100.0-dev.1\""));
        assert!(text.contains("__strict_version__ = \"19.100.0\""));
        assert!(text.contains("MINOR = 100"));
        assert!(text.contains("PRODUCTION = \"False\""));
        // repository info was unavailable, so those fields pass through
        assert!(text.contains("COMMIT = \"unknown\""));
    }

    #[test]
    fn test_release_bump_writes_finalized_version() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path(), "19.99.0", "False");
        let mut opts = options(dir.path());
        opts.bump = Some(SigFig::Patch);
        opts.release = true;

        let outcome = run(&opts, &test_config(), &MockVcs::new()).unwrap();
        assert_eq!(outcome.current, "19.99.1");

        let text = read_version_file(dir.path());
        assert!(text.contains("__version__ = \"19.99.1\""));
        assert!(text.contains("PRODUCTION = \"True\""));
        assert!(text.contains("PATCH = 1"));
    }

    #[test]
    fn test_persisted_lock_suppresses_one_bump() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path(), "19.99.0", "True");
        let mut opts = options(dir.path());
        opts.bump = Some(SigFig::Minor);

        let outcome = run(&opts, &test_config(), &MockVcs::new()).unwrap();
        assert_eq!(outcome.current, "19.99.0");

        let text = read_version_file(dir.path());
        assert!(text.contains("__version__ = \"19.99.0\""));
        assert!(text.contains("VERSION_LOCK = \"False\""));
    }

    #[test]
    fn test_explicit_lock_is_written() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path(), "19.99.0", "False");
        let mut opts = options(dir.path());
        opts.set_to = Some("20.0.0".to_string());
        opts.lock = true;

        run(&opts, &test_config(), &MockVcs::new()).unwrap();
        let text = read_version_file(dir.path());
        assert!(text.contains("__version__ = \"20.0.0\""));
        assert!(text.contains("VERSION_LOCK = \"True\""));
    }

    #[test]
    fn test_set_to_writes_exact_version() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path(), "19.99.0", "False");
        let mut opts = options(dir.path());
        opts.set_to = Some("1.2.3-RC.1".to_string());

        let outcome = run(&opts, &test_config(), &MockVcs::new()).unwrap();
        assert_eq!(outcome.current, "1.2.3-RC.1");

        let text = read_version_file(dir.path());
        assert!(text.contains("__version__ = \"1.2.3-RC.1\""));
        assert!(text.contains("__strict_version__ = \"1.2.3\""));
        assert!(text.contains("MAJOR = 1"));
    }

    #[test]
    fn test_set_to_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path(), "19.99.0", "False");
        let mut opts = options(dir.path());
        opts.set_to = Some("banana".to_string());
        let err = run(&opts, &test_config(), &MockVcs::new()).unwrap_err();
        assert!(matches!(err, AutoverError::Parse(_)));
    }

    #[test]
    fn test_dry_run_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path(), "19.99.0", "False");
        let before = read_version_file(dir.path());
        let mut opts = options(dir.path());
        opts.bump = Some(SigFig::Major);
        opts.dry_run = true;

        let vcs = MockVcs::new();
        let outcome = run(&opts, &test_config(), &vcs).unwrap();
        assert_eq!(outcome.current, "20.0.0-dev.1");
        assert_eq!(read_version_file(dir.path()), before);
        assert!(vcs.created_tags().is_empty());
    }

    #[test]
    fn test_vcs_persistence_creates_annotated_tag() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path(), "19.99.0", "False");
        let mut opts = options(dir.path());
        opts.bump = Some(SigFig::Minor);
        opts.persist_to = vec![PersistTarget::Vcs];

        let vcs = MockVcs::new();
        run(&opts, &test_config(), &vcs).unwrap();
        assert_eq!(
            vcs.created_tags(),
            vec![(
                "release/19.100.0-dev.1".to_string(),
                "version 19.100.0-dev.1".to_string()
            )]
        );
        // files were not a persistence target
        assert!(read_version_file(dir.path()).contains("__version__ = \"19.99.0\""));
    }

    #[test]
    fn test_release_moves_latest_tag_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path(), "19.99.0", "False");
        let mut opts = options(dir.path());
        opts.bump = Some(SigFig::Patch);
        opts.release = true;
        opts.persist_to = vec![PersistTarget::SourceFiles, PersistTarget::Vcs];
        let mut config = test_config();
        config.latest_tag = Some("latest".to_string());

        let vcs = MockVcs::new();
        run(&opts, &config, &vcs).unwrap();
        assert_eq!(
            vcs.created_tags(),
            vec![("release/19.99.1".to_string(), "version 19.99.1".to_string())]
        );
        assert_eq!(vcs.moved_tags(), vec!["latest"]);
    }

    #[test]
    fn test_commit_fields_written_when_repository_known() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path(), "19.99.0", "False");
        let mut opts = options(dir.path());
        opts.bump = Some(SigFig::Patch);

        let mut vcs = MockVcs::new();
        vcs.set_rev("HEAD", "abc123def");
        vcs.set_commit_count(321);
        run(&opts, &test_config(), &vcs).unwrap();

        let text = read_version_file(dir.path());
        assert!(text.contains("COMMIT = \"abc123def\""));
        assert!(text.contains("COMMIT_COUNT = 321"));
    }

    #[test]
    fn test_commit_count_override_pins_figure() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path(), "19.99.0", "False");
        let mut opts = options(dir.path());
        opts.bump = Some(SigFig::Minor);
        opts.commit_count_as = Some(SigFig::Patch);

        let mut vcs = MockVcs::new();
        vcs.set_rev("HEAD", "abc123def");
        vcs.set_commit_count(321);
        let outcome = run(&opts, &test_config(), &vcs).unwrap();
        assert_eq!(outcome.current, "19.100.321-dev.1");
    }

    #[test]
    fn test_file_triggers_feed_the_bump() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path(), "19.99.0", "False");
        fs::create_dir_all(dir.path().join("docs/news")).unwrap();
        fs::write(dir.path().join("docs/news/55.feature"), "news\n").unwrap();
        let mut opts = options(dir.path());
        opts.file_triggers = true;

        let outcome = run(&opts, &test_config(), &MockVcs::new()).unwrap();
        assert_eq!(outcome.current, "19.100.0-dev.1");
        assert!(outcome.trigger_files.contains("docs/news/55.feature"));
    }

    #[test]
    fn test_extra_updates_reach_the_file() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path(), "19.99.0", "False");
        let path = dir.path().join(VERSION_FILE);
        let mut body = fs::read_to_string(&path).unwrap();
        body.push_str("TESTRUNNER_VERSION = \"0.0.0\"\n");
        fs::write(&path, body).unwrap();

        let mut opts = options(dir.path());
        opts.bump = Some(SigFig::Patch);
        opts.extra_updates
            .insert("TESTRUNNER_VERSION".to_string(), "9.8.7".to_string());

        run(&opts, &test_config(), &MockVcs::new()).unwrap();
        assert!(read_version_file(dir.path()).contains("TESTRUNNER_VERSION = \"9.8.7\""));
    }

    #[test]
    fn test_no_version_anywhere_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(VERSION_FILE), "# nothing here\n").unwrap();
        let mut opts = options(dir.path());
        opts.bump = Some(SigFig::Patch);
        let err = run(&opts, &test_config(), &MockVcs::new()).unwrap_err();
        assert!(matches!(err, AutoverError::NotFound(_)));
    }

    #[test]
    fn test_triggerless_run_rewrites_current_version() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path(), "1.2.3-dev.4", "False");
        let opts = options(dir.path());
        let outcome = run(&opts, &test_config(), &MockVcs::new()).unwrap();
        assert_eq!(outcome.previous.as_deref(), Some("1.2.3-dev.4"));
        assert_eq!(outcome.current, "1.2.3-dev.4");
    }
}
