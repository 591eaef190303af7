//! Version-control abstraction layer
//!
//! This module provides a trait-based abstraction over the git operations
//! autover needs, allowing for a real subprocess-backed implementation and
//! a mock implementation for testing.
//!
//! # Overview
//!
//! The primary abstraction is the [Vcs] trait. The concrete implementations
//! include:
//!
//! - [git::GitProcess]: drives the `git` binary through subprocesses
//! - [mock::MockVcs]: an in-memory implementation for testing
//!
//! Most code should depend on the [Vcs] trait rather than concrete
//! implementations.
//!
//! ```rust
//! # use autover::vcs::Vcs;
//! # fn example<V: Vcs>(repo: &V) -> Result<(), Box<dyn std::error::Error>> {
//! for tag in repo.list_tags("release/*")? {
//!     println!("tag: {}", tag);
//! }
//! # Ok(())
//! # }
//! ```

pub mod git;
pub mod mock;

pub use git::GitProcess;
pub use mock::MockVcs;

use crate::error::Result;

/// Common git operation trait for abstraction
///
/// All implementors must be `Send + Sync` to allow safe sharing across
/// threads. Methods return [crate::error::Result], with underlying process
/// failures mapped to [crate::error::AutoverError::Subprocess].
pub trait Vcs: Send + Sync {
    /// List tag names matching a glob pattern ("*" matches any text).
    ///
    /// # Arguments
    /// * `pattern` - Tag glob, e.g. `release/*`
    ///
    /// # Returns
    /// * `Ok(Vec<String>)` - Matching tag names, as git orders them
    /// * `Err` - If the repository cannot be queried
    fn list_tags(&self, pattern: &str) -> Result<Vec<String>>;

    /// Whether `reference` is an ancestor of `target`.
    ///
    /// Best effort: an unresolvable reference counts as "not an ancestor"
    /// rather than an error, so tag filters degrade to skipping the tag.
    fn is_ancestor(&self, reference: &str, target: &str) -> bool;

    /// Resolve a refspec to a full commit hash.
    fn rev_parse(&self, refspec: &str) -> Result<String>;

    /// Number of commits reachable from the given refspec.
    fn commit_count(&self, refspec: &str) -> Result<u64>;

    /// Create an annotated tag on the current commit.
    ///
    /// # Arguments
    /// * `name` - Name for the new tag
    /// * `message` - Annotation message
    fn create_tag(&self, name: &str, message: &str) -> Result<()>;

    /// Force a tag to point at the current commit, creating it if absent.
    fn force_move_tag(&self, name: &str) -> Result<()>;

    /// Paths added between `boundary` and the current commit, restricted to
    /// a pathspec. With `include_renamed`, renamed files count as added.
    fn added_since(
        &self,
        boundary: &str,
        pathspec: &str,
        include_renamed: bool,
    ) -> Result<Vec<String>>;
}
