use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::Level;

use autover::domain::{PersistTarget, SigFig, VersionSource};
use autover::vcs::GitProcess;
use autover::workflow::{self, RunOptions};
use autover::{config, ui};

#[derive(clap::Parser)]
#[command(
    name = "autover",
    version,
    about = "Control version numbers across source files and tags"
)]
struct Args {
    #[arg(
        long,
        help = "Bump the specified part of the version. Use this locally to correctly modify the version file"
    )]
    bump: Option<SigFig>,

    #[arg(long, help = "Set the version to this exact value")]
    set: Option<String>,

    #[arg(
        long,
        visible_alias = "file-triggers",
        help = "Detect the need to bump from the presence of files (as specified in config)"
    )]
    news: bool,

    #[arg(
        long,
        help = "Lock the version against the next increment. The lock survives one call before being cleared"
    )]
    lock: bool,

    #[arg(long, help = "Mark this build as released")]
    release: bool,

    #[arg(
        long,
        value_name = "SIGFIG",
        help = "Pin the given part to the repository's commit count"
    )]
    commit_count_as: Option<SigFig>,

    #[arg(short, long, help = "Configuration file path")]
    config: Option<PathBuf>,

    #[arg(
        long,
        visible_alias = "show",
        help = "Compute everything but write nothing"
    )]
    dry_run: bool,

    #[arg(
        long = "from",
        value_name = "SOURCE",
        help = "Where to read the current version from, in priority order (repeatable)"
    )]
    persist_from: Vec<VersionSource>,

    #[arg(
        long = "to",
        value_name = "DEST",
        help = "Where to write the new version to (repeatable)"
    )]
    persist_to: Vec<PersistTarget>,

    #[arg(long, help = "Print the files that fired file triggers instead of the version")]
    print_file_triggers: bool,

    #[arg(
        short = 'v',
        long = "verbosity",
        action = clap::ArgAction::Count,
        help = "Increase output verbosity. Can be specified multiple times"
    )]
    verbosity: u8,

    #[arg(
        value_name = "KEY=VALUE",
        help = "Extra replacements applied to target files alongside the version fields"
    )]
    updates: Vec<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbosity);

    let config = match config::load_config(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            ui::display_error(&format!("failed to load configuration: {}", e));
            std::process::exit(1);
        }
    };

    let options = RunOptions {
        set_to: args.set,
        bump: args.bump,
        commit_count_as: args.commit_count_as,
        release: args.release,
        lock: args.lock,
        file_triggers: args.news,
        dry_run: args.dry_run,
        persist_from: if args.persist_from.is_empty() {
            vec![VersionSource::CurrentFiles]
        } else {
            args.persist_from
        },
        persist_to: if args.persist_to.is_empty() {
            vec![PersistTarget::SourceFiles]
        } else {
            args.persist_to
        },
        extra_updates: parse_update_pairs(&args.updates),
        work_dir: PathBuf::from("."),
    };

    let vcs = GitProcess::new(&options.work_dir);
    let outcome = match workflow::run(&options, &config, &vcs) {
        Ok(outcome) => outcome,
        Err(e) => {
            ui::display_error(&e.to_string());
            std::process::exit(1);
        }
    };

    tracing::info!("previously: {}", outcome.previous.as_deref().unwrap_or("none"));
    tracing::info!("currently:  {}", outcome.current);

    if args.print_file_triggers {
        let files =
            match workflow::file_trigger_report(outcome.previous.as_deref(), &options, &config, &vcs)
            {
                Ok(files) => files,
                Err(e) => {
                    ui::display_error(&e.to_string());
                    std::process::exit(1);
                }
            };
        println!("{}", files.into_iter().collect::<Vec<_>>().join("\n"));
    } else {
        println!("{}", outcome.current);
    }

    Ok(())
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

/// Pull extra replacement pairs from the command line, e.g. `TESTRUNNER_VERSION="1.2.3"`.
/// Malformed pairs are reported and skipped.
fn parse_update_pairs(pairs: &[String]) -> BTreeMap<String, String> {
    let mut updates = BTreeMap::new();
    for pair in pairs {
        let parsed = pair.split_once('=').and_then(|(key, value)| {
            let key = key.trim();
            (!key.is_empty()).then(|| (key.to_string(), unquote(value.trim()).to_string()))
        });
        match parsed {
            Some((key, value)) => {
                tracing::debug!("extra replacement from the command line: {} = {}", key, value);
                updates.insert(key, value);
            }
            None => ui::display_warning(&format!("ignoring malformed update pair: {:?}", pair)),
        }
    }
    updates
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .or_else(|| {
            value
                .strip_prefix('\'')
                .and_then(|inner| inner.strip_suffix('\''))
        })
        .unwrap_or(value)
}
