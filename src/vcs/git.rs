//! Subprocess git backend
//!
//! Drives the system `git` binary with `git -C <root> ...` invocations and
//! parses the plain-text output. Nothing here caches: every call is one
//! subprocess, which keeps the state of the repository authoritative.

use crate::error::{AutoverError, Result};
use crate::vcs::Vcs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// [Vcs] backend using the system git binary.
pub struct GitProcess {
    root: PathBuf,
}

impl GitProcess {
    /// A handle rooted at `path`. No validation happens here; the first
    /// command that needs the repository surfaces git's own error.
    pub fn new(path: &Path) -> Self {
        GitProcess {
            root: path.to_path_buf(),
        }
    }

    /// Run one git subcommand, returning trimmed stdout.
    fn run(&self, args: &[&str]) -> Result<String> {
        tracing::debug!("running git {}", args.join(" "));
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.root)
            .args(args)
            .output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AutoverError::subprocess(format!(
                "git {}: {}",
                args.join(" "),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Vcs for GitProcess {
    fn list_tags(&self, pattern: &str) -> Result<Vec<String>> {
        let stdout = self.run(&["tag", "--list", pattern])?;
        Ok(stdout
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect())
    }

    fn is_ancestor(&self, reference: &str, target: &str) -> bool {
        // the exit status is the answer; failures of any kind mean "no"
        Command::new("git")
            .arg("-C")
            .arg(&self.root)
            .args(["merge-base", "--is-ancestor", reference, target])
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    fn rev_parse(&self, refspec: &str) -> Result<String> {
        self.run(&["rev-parse", "--verify", refspec])
    }

    fn commit_count(&self, refspec: &str) -> Result<u64> {
        let stdout = self.run(&["rev-list", "--count", refspec])?;
        stdout.parse().map_err(|_| {
            AutoverError::subprocess(format!("unexpected rev-list output: {:?}", stdout))
        })
    }

    fn create_tag(&self, name: &str, message: &str) -> Result<()> {
        self.run(&["tag", "-a", name, "-m", message])?;
        Ok(())
    }

    fn force_move_tag(&self, name: &str) -> Result<()> {
        self.run(&["tag", "--force", name])?;
        Ok(())
    }

    fn added_since(
        &self,
        boundary: &str,
        pathspec: &str,
        include_renamed: bool,
    ) -> Result<Vec<String>> {
        let diff_filter = if include_renamed {
            "--diff-filter=AR"
        } else {
            "--diff-filter=A"
        };
        let stdout = self.run(&[
            "diff",
            "--relative",
            "--name-status",
            diff_filter,
            boundary,
            "HEAD",
            "--",
            pathspec,
        ])?;
        Ok(parse_name_status(&stdout))
    }
}

/// Pull file paths out of `--name-status` output. Rename entries carry an
/// old and a new path; the new one is the file that exists now.
fn parse_name_status(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let status = parts.next()?;
            let path = if status.starts_with('R') {
                parts.nth(1)?
            } else {
                parts.next()?
            };
            Some(path.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name_status_added() {
        let text = "A\tdocs/news/123.feature\nA\tdocs/news/456.bugfix";
        assert_eq!(
            parse_name_status(text),
            vec!["docs/news/123.feature", "docs/news/456.bugfix"]
        );
    }

    #[test]
    fn test_parse_name_status_rename_takes_new_path() {
        let text = "R100\tdocs/news/old.major\tdocs/news/new.major";
        assert_eq!(parse_name_status(text), vec!["docs/news/new.major"]);
    }

    #[test]
    fn test_parse_name_status_empty() {
        assert!(parse_name_status("").is_empty());
        assert!(parse_name_status("\n\n").is_empty());
    }
}
