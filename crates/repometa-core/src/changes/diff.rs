//! Diff strategy: compare commits in the local history

use super::ChangeScope;
use crate::error::{Error, Result};
use crate::git::GitRepository;
use crate::traits::ChangeDetector;
use std::future::Future;
use std::path::PathBuf;

/// Local-history change detector
#[derive(Debug, Clone)]
pub struct DiffDetector {
    repo_path: PathBuf,
    fetch_depth: u32,
    deepen_step: u32,
}

impl DiffDetector {
    /// `fetch_depth` bounds the total history widening, `deepen_step` is the
    /// size of each widening round
    pub fn new(repo_path: PathBuf, fetch_depth: u32, deepen_step: u32) -> Self {
        Self {
            repo_path,
            fetch_depth,
            deepen_step,
        }
    }

    /// Blocking implementation; run inside `spawn_blocking`
    pub fn detect_sync(&self, scope: &ChangeScope) -> Result<Vec<String>> {
        if *scope == ChangeScope::None {
            return Ok(Vec::new());
        }
        let repo = GitRepository::discover(&self.repo_path)?;

        let (base, head) = match scope {
            ChangeScope::None => return Ok(Vec::new()),
            ChangeScope::Push { before, head } => (before.clone(), head.as_str()),
            ChangeScope::PullRequest {
                number,
                base,
                base_ref,
                head,
            } => {
                let base = match (base, base_ref) {
                    (Some(sha), _) => sha.clone(),
                    (None, Some(branch)) => repo.resolve_sha(&format!("refs/remotes/origin/{}", branch))?,
                    (None, None) => {
                        return Err(Error::Config(format!(
                            "base of pull request #{} is unknown",
                            number
                        )))
                    }
                };
                (Some(base), head.as_str())
            }
        };

        let base = match base {
            Some(sha) => Some(sha),
            // Branch creation: compare against the first parent, if any
            None => self.first_parent(&repo, head)?,
        };

        match base {
            Some(base) => {
                let merge_base =
                    repo.ensure_merge_base(&base, head, self.fetch_depth, self.deepen_step)?;
                tracing::debug!(
                    base = %base,
                    merge_base = %merge_base.sha,
                    deepened_by = merge_base.deepened_by,
                    "resolved merge base"
                );
                repo.changed_paths(Some(&merge_base.sha), head)
            }
            None => repo.changed_paths(None, head),
        }
    }

    /// First parent of `head`, deepening once if the head commit itself is
    /// missing from a shallow clone
    fn first_parent(&self, repo: &GitRepository, head: &str) -> Result<Option<String>> {
        if !repo.has_commit(head)? {
            if repo.is_shallow()? && self.fetch_depth > 0 {
                repo.deepen(self.deepen_step.max(1).min(self.fetch_depth))?;
            }
            if !repo.has_commit(head)? {
                return Err(Error::InsufficientHistory(format!(
                    "commit {} is not available in the local history",
                    head
                )));
            }
        }
        repo.first_parent(head)
    }
}

impl ChangeDetector for DiffDetector {
    fn name(&self) -> &'static str {
        "git"
    }

    fn detect<'a>(
        &'a self,
        scope: &'a ChangeScope,
    ) -> impl Future<Output = Result<Vec<String>>> + Send + 'a {
        async move {
            if *scope == ChangeScope::None {
                return Ok(Vec::new());
            }

            let detector = self.clone();
            let scope = scope.clone();

            tokio::task::spawn_blocking(move || detector.detect_sync(&scope))
                .await
                .map_err(|e| Error::Runtime(format!("Task join error: {}", e)))?
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::path::Path;
    use tempfile::TempDir;

    fn git(repo_path: &Path, args: &[&str]) -> String {
        let output = std::process::Command::new("git")
            .args(args)
            .current_dir(repo_path)
            .output()
            .unwrap();
        String::from_utf8(output.stdout).unwrap().trim().to_string()
    }

    fn commit_file(repo_path: &Path, name: &str, content: &str) -> String {
        std::fs::write(repo_path.join(name), content).unwrap();
        git(repo_path, &["add", "."]);
        git(repo_path, &["commit", "-m", &format!("update {}", name)]);
        git(repo_path, &["rev-parse", "HEAD"])
    }

    fn create_test_repo() -> TempDir {
        let dir = TempDir::new().unwrap();
        git(dir.path(), &["init", "-b", "main"]);
        git(dir.path(), &["config", "user.name", "Test User"]);
        git(dir.path(), &["config", "user.email", "test@example.com"]);
        dir
    }

    #[test]
    fn test_none_scope_is_empty() {
        let detector = DiffDetector::new(PathBuf::from("/nonexistent"), 15, 5);
        assert!(detector.detect_sync(&ChangeScope::None).unwrap().is_empty());
    }

    #[test]
    fn test_push_with_before() {
        let dir = create_test_repo();
        let before = commit_file(dir.path(), "a.txt", "a");
        commit_file(dir.path(), "b.txt", "b");
        let head = commit_file(dir.path(), "c.txt", "c");

        let detector = DiffDetector::new(dir.path().to_path_buf(), 15, 5);
        let files = detector
            .detect_sync(&ChangeScope::Push {
                before: Some(before),
                head,
            })
            .unwrap();
        assert_eq!(files, vec!["b.txt".to_string(), "c.txt".to_string()]);
    }

    #[test]
    fn test_push_branch_creation_uses_first_parent() {
        let dir = create_test_repo();
        commit_file(dir.path(), "a.txt", "a");
        let head = commit_file(dir.path(), "b.txt", "b");

        let detector = DiffDetector::new(dir.path().to_path_buf(), 15, 5);
        let files = detector
            .detect_sync(&ChangeScope::Push { before: None, head })
            .unwrap();
        assert_eq!(files, vec!["b.txt".to_string()]);
    }

    #[test]
    fn test_push_root_commit_lists_every_file() {
        let dir = create_test_repo();
        let head = commit_file(dir.path(), "only.txt", "x");

        let detector = DiffDetector::new(dir.path().to_path_buf(), 15, 5);
        let files = detector
            .detect_sync(&ChangeScope::Push { before: None, head })
            .unwrap();
        assert_eq!(files, vec!["only.txt".to_string()]);
    }

    #[test]
    fn test_pull_request_without_base_information() {
        let dir = create_test_repo();
        let head = commit_file(dir.path(), "a.txt", "a");

        let detector = DiffDetector::new(dir.path().to_path_buf(), 15, 5);
        let result = detector.detect_sync(&ChangeScope::PullRequest {
            number: 1,
            base: None,
            base_ref: None,
            head,
        });
        assert_matches!(result, Err(Error::Config(_)));
    }

    #[tokio::test]
    async fn test_async_detect() {
        let dir = create_test_repo();
        let base = commit_file(dir.path(), "a.txt", "a");
        git(dir.path(), &["checkout", "-b", "feature"]);
        let head = commit_file(dir.path(), "feature.txt", "f");

        let detector = DiffDetector::new(dir.path().to_path_buf(), 15, 5);
        let scope = ChangeScope::PullRequest {
            number: 3,
            base: Some(base),
            base_ref: Some("main".into()),
            head,
        };
        let files = detector.detect(&scope).await.unwrap();
        assert_eq!(files, vec!["feature.txt".to_string()]);
        assert_eq!(detector.name(), "git");
    }
}
