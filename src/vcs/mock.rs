use crate::error::{AutoverError, Result};
use crate::vcs::Vcs;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Mock repository for testing without actual git operations
///
/// State is seeded through the builder methods; tag creation is recorded
/// rather than applied, so tests can assert on what would have been written.
pub struct MockVcs {
    tags: Vec<String>,
    ancestors: HashSet<String>,
    revs: HashMap<String, String>,
    commit_count: u64,
    added: Vec<String>,
    renamed: Vec<String>,
    created: Mutex<Vec<(String, String)>>,
    moved: Mutex<Vec<String>>,
}

impl MockVcs {
    /// Create a new empty mock repository
    pub fn new() -> Self {
        MockVcs {
            tags: Vec::new(),
            ancestors: HashSet::new(),
            revs: HashMap::new(),
            commit_count: 0,
            added: Vec::new(),
            renamed: Vec::new(),
            created: Mutex::new(Vec::new()),
            moved: Mutex::new(Vec::new()),
        }
    }

    /// Add an existing tag
    pub fn add_tag(&mut self, name: impl Into<String>) {
        self.tags.push(name.into());
    }

    /// Mark a reference as an ancestor of HEAD
    pub fn set_ancestor(&mut self, reference: impl Into<String>) {
        self.ancestors.insert(reference.into());
    }

    /// Make a refspec resolvable to a commit hash
    pub fn set_rev(&mut self, refspec: impl Into<String>, hash: impl Into<String>) {
        self.revs.insert(refspec.into(), hash.into());
    }

    /// Set the commit count reported for any refspec
    pub fn set_commit_count(&mut self, count: u64) {
        self.commit_count = count;
    }

    /// Record a file as added since any boundary
    pub fn add_new_file(&mut self, path: impl Into<String>) {
        self.added.push(path.into());
    }

    /// Record a file as renamed since any boundary
    pub fn add_renamed_file(&mut self, path: impl Into<String>) {
        self.renamed.push(path.into());
    }

    /// Tags created through the trait, as (name, message) pairs
    pub fn created_tags(&self) -> Vec<(String, String)> {
        self.created
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Tags force-moved through the trait
    pub fn moved_tags(&self) -> Vec<String> {
        self.moved
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Default for MockVcs {
    fn default() -> Self {
        Self::new()
    }
}

impl Vcs for MockVcs {
    fn list_tags(&self, pattern: &str) -> Result<Vec<String>> {
        let matcher = glob::Pattern::new(pattern)
            .map_err(|e| AutoverError::config(format!("bad tag pattern {:?}: {}", pattern, e)))?;
        Ok(self
            .tags
            .iter()
            .filter(|tag| matcher.matches(tag))
            .cloned()
            .collect())
    }

    fn is_ancestor(&self, reference: &str, _target: &str) -> bool {
        self.ancestors.contains(reference)
    }

    fn rev_parse(&self, refspec: &str) -> Result<String> {
        self.revs
            .get(refspec)
            .cloned()
            .ok_or_else(|| AutoverError::subprocess(format!("unknown revision {:?}", refspec)))
    }

    fn commit_count(&self, _refspec: &str) -> Result<u64> {
        Ok(self.commit_count)
    }

    fn create_tag(&self, name: &str, message: &str) -> Result<()> {
        self.created
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((name.to_string(), message.to_string()));
        Ok(())
    }

    fn force_move_tag(&self, name: &str) -> Result<()> {
        self.moved
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(name.to_string());
        Ok(())
    }

    fn added_since(
        &self,
        _boundary: &str,
        pathspec: &str,
        include_renamed: bool,
    ) -> Result<Vec<String>> {
        let matcher = glob::Pattern::new(pathspec)
            .map_err(|e| AutoverError::config(format!("bad pathspec {:?}: {}", pathspec, e)))?;
        let mut paths: Vec<String> = self
            .added
            .iter()
            .filter(|path| matcher.matches(path))
            .cloned()
            .collect();
        if include_renamed {
            paths.extend(
                self.renamed
                    .iter()
                    .filter(|path| matcher.matches(path))
                    .cloned(),
            );
        }
        Ok(paths)
    }
}
