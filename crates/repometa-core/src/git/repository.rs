//! Git repository operations
//!
//! git2::Repository is not Send/Sync due to internal raw pointers, so the
//! wrapper stores the path and reopens the repository per operation. Async
//! callers run these methods inside `spawn_blocking`.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Error, Result};

/// Git repository wrapper
pub struct GitRepository {
    path: PathBuf,
}

/// Outcome of the bounded history widening
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeBase {
    /// Merge base SHA
    pub sha: String,
    /// Total commits fetched by `git fetch --deepen` to find it
    pub deepened_by: u32,
}

impl GitRepository {
    /// Discover a repository starting from the given path
    pub fn discover<P: AsRef<Path>>(path: P) -> Result<Self> {
        // discover_path() returns the path to the .git directory
        let git_path = git2::Repository::discover_path(path.as_ref(), &[] as &[&std::ffi::OsStr])?;
        let _repo = git2::Repository::open(&git_path)?;
        Ok(Self { path: git_path })
    }

    /// Get the repository path (the .git directory or workdir path)
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Working directory root (parent of `.git`)
    pub fn workdir(&self) -> &Path {
        if self.path.ends_with(".git") {
            self.path.parent().unwrap_or(&self.path)
        } else {
            &self.path
        }
    }

    fn get_repo(&self) -> Result<git2::Repository> {
        Ok(git2::Repository::open(&self.path)?)
    }

    fn parse_oid(sha: &str) -> Result<git2::Oid> {
        git2::Oid::from_str(sha).map_err(|e| Error::Git(format!("Invalid SHA '{}': {}", sha, e)))
    }

    /// Whether the clone has truncated history
    pub fn is_shallow(&self) -> Result<bool> {
        Ok(self.get_repo()?.is_shallow())
    }

    /// Whether the commit object is present locally
    pub fn has_commit(&self, sha: &str) -> Result<bool> {
        let repo = self.get_repo()?;
        let oid = Self::parse_oid(sha)?;
        let found = repo.find_commit(oid).is_ok();
        Ok(found)
    }

    /// First parent of `sha`; `None` for a root commit
    pub fn first_parent(&self, sha: &str) -> Result<Option<String>> {
        let repo = self.get_repo()?;
        let commit = repo.find_commit(Self::parse_oid(sha)?)?;
        Ok(commit.parent_id(0).ok().map(|oid| oid.to_string()))
    }

    /// Merge base of two commits, `None` when either commit or the base is
    /// not reachable in the local history
    pub fn try_merge_base(&self, base: &str, head: &str) -> Result<Option<String>> {
        let repo = self.get_repo()?;
        let base_oid = Self::parse_oid(base)?;
        let head_oid = Self::parse_oid(head)?;

        if repo.find_commit(base_oid).is_err() || repo.find_commit(head_oid).is_err() {
            return Ok(None);
        }

        match repo.merge_base(base_oid, head_oid) {
            Ok(oid) => Ok(Some(oid.to_string())),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Fetch `depth` more commits of history
    pub fn deepen(&self, depth: u32) -> Result<()> {
        let output = Command::new("git")
            .args(["fetch", "--quiet", &format!("--deepen={}", depth)])
            .current_dir(self.workdir())
            .output()
            .map_err(|e| Error::Git(format!("Failed to deepen repository: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Git(format!(
                "git fetch --deepen={} failed: {}",
                depth,
                stderr.trim()
            )));
        }
        Ok(())
    }

    /// Find the merge base, widening a shallow clone in fixed steps.
    ///
    /// Each round deepens by `step` (clamped so the total never exceeds
    /// `max_depth`). Fails with `InsufficientHistory` once the bound is spent,
    /// or immediately when the clone is complete and still has no merge base.
    pub fn ensure_merge_base(
        &self,
        base: &str,
        head: &str,
        max_depth: u32,
        step: u32,
    ) -> Result<MergeBase> {
        let step = step.max(1);
        let mut deepened_by = 0u32;

        loop {
            if let Some(sha) = self.try_merge_base(base, head)? {
                return Ok(MergeBase { sha, deepened_by });
            }

            if !self.is_shallow()? {
                return Err(Error::InsufficientHistory(format!(
                    "no merge base between {} and {} in the complete history",
                    base, head
                )));
            }

            if deepened_by >= max_depth {
                return Err(Error::InsufficientHistory(format!(
                    "merge base between {} and {} not found within {} commits; \
                     increase fetch_depth or check out with full history",
                    base, head, max_depth
                )));
            }

            let round = step.min(max_depth - deepened_by);
            tracing::debug!(base, head, round, deepened_by, "merge base missing, deepening");
            self.deepen(round)?;
            deepened_by += round;
        }
    }

    /// Paths changed between `base` (or the empty tree) and `head`, in diff
    /// order. Renames are detected and reported once, under the new path.
    pub fn changed_paths(&self, base: Option<&str>, head: &str) -> Result<Vec<String>> {
        let repo = self.get_repo()?;

        let head_tree = repo.find_commit(Self::parse_oid(head)?)?.tree()?;
        let base_tree = match base {
            Some(sha) => Some(repo.find_commit(Self::parse_oid(sha)?)?.tree()?),
            None => None,
        };

        let mut opts = git2::DiffOptions::new();
        opts.ignore_submodules(true);

        let mut diff =
            repo.diff_tree_to_tree(base_tree.as_ref(), Some(&head_tree), Some(&mut opts))?;

        let mut find_opts = git2::DiffFindOptions::new();
        find_opts.renames(true);
        diff.find_similar(Some(&mut find_opts))?;

        let paths = diff
            .deltas()
            .filter_map(|delta| {
                delta
                    .new_file()
                    .path()
                    .or_else(|| delta.old_file().path())
                    .map(|p| p.to_string_lossy().into_owned())
            })
            .collect();

        Ok(paths)
    }

    /// Commit message and author name
    pub fn commit_summary(&self, sha: &str) -> Result<(String, String)> {
        let repo = self.get_repo()?;
        let commit = repo.find_commit(Self::parse_oid(sha)?)?;
        let message = commit.message().unwrap_or("").to_string();
        let author = commit.author().name().unwrap_or("").to_string();
        Ok((message, author))
    }

    /// Resolve a reference to a SHA
    pub fn resolve_sha(&self, reference: &str) -> Result<String> {
        let repo = self.get_repo()?;
        let resolved = repo.revparse_single(reference).map_err(|e| {
            Error::Git(format!(
                "Failed to resolve reference '{}': {}",
                reference, e
            ))
        })?;
        Ok(resolved.id().to_string())
    }
}
