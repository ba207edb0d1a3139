//! Event payload (`$GITHUB_EVENT_PATH`) deserialization
//!
//! Every field is optional: the payload shape differs per event and only the
//! parts the metadata record needs are decoded.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Decoded event payload
#[derive(Debug, Default, Deserialize)]
pub struct EventPayload {
    /// Action verb (`opened`, `synchronize`, `published`, ...)
    pub action: Option<String>,
    /// Push: commit before the push
    pub before: Option<String>,
    /// Push/create: full ref
    #[serde(rename = "ref")]
    pub git_ref: Option<String>,
    /// Create/delete: `branch` or `tag`
    pub ref_type: Option<String>,
    /// Repository the event belongs to
    pub repository: Option<PayloadRepository>,
    /// Push: head commit
    pub head_commit: Option<PayloadCommit>,
    /// Pull request events
    pub pull_request: Option<PayloadPullRequest>,
    /// Release events
    pub release: Option<PayloadRelease>,
    /// Actor that triggered the event
    pub sender: Option<PayloadUser>,
}

/// Repository object
#[derive(Debug, Default, Deserialize)]
pub struct PayloadRepository {
    /// `owner/name`
    pub full_name: Option<String>,
    /// Default branch name
    pub default_branch: Option<String>,
    /// Private flag
    pub private: Option<bool>,
    /// `public`, `private` or `internal`
    pub visibility: Option<String>,
    /// Whether the repository is a fork
    pub fork: Option<bool>,
}

/// Commit object
#[derive(Debug, Default, Deserialize)]
pub struct PayloadCommit {
    /// Commit SHA
    pub id: Option<String>,
    /// Full commit message
    pub message: Option<String>,
    /// Author
    pub author: Option<PayloadCommitAuthor>,
}

/// Commit author
#[derive(Debug, Default, Deserialize)]
pub struct PayloadCommitAuthor {
    /// Display name
    pub name: Option<String>,
    /// Login, when the author maps to an account
    pub username: Option<String>,
}

/// Pull request object
#[derive(Debug, Default, Deserialize)]
pub struct PayloadPullRequest {
    /// PR number
    pub number: Option<u64>,
    /// Commit count
    pub commits: Option<u64>,
    /// Source side
    pub head: Option<PayloadPullRequestRef>,
    /// Target side
    pub base: Option<PayloadPullRequestRef>,
}

/// One side of a pull request
#[derive(Debug, Default, Deserialize)]
pub struct PayloadPullRequestRef {
    /// Branch name
    #[serde(rename = "ref")]
    pub git_ref: Option<String>,
    /// Tip commit
    pub sha: Option<String>,
    /// Repository of this side
    pub repo: Option<PayloadRepository>,
}

/// Release object
#[derive(Debug, Default, Deserialize)]
pub struct PayloadRelease {
    /// Release tag
    pub tag_name: Option<String>,
}

/// User object
#[derive(Debug, Default, Deserialize)]
pub struct PayloadUser {
    /// Login
    pub login: Option<String>,
    /// Numeric id
    pub id: Option<u64>,
}

impl EventPayload {
    /// Parse a payload document
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("malformed event payload: {}", e)))
    }

    /// Load the payload file; unreadable files are I/O errors
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Self::from_json(&content)
    }

    /// Whether the pull request comes from a different repository
    pub fn pull_request_is_fork(&self) -> bool {
        let Some(pr) = &self.pull_request else {
            return false;
        };
        let head_repo = pr.head.as_ref().and_then(|h| h.repo.as_ref());
        let base_repo = pr.base.as_ref().and_then(|b| b.repo.as_ref());

        if let Some(fork) = head_repo.and_then(|r| r.fork) {
            if fork {
                return true;
            }
        }

        match (
            head_repo.and_then(|r| r.full_name.as_deref()),
            base_repo.and_then(|r| r.full_name.as_deref()),
        ) {
            (Some(head), Some(base)) => !head.eq_ignore_ascii_case(base),
            _ => false,
        }
    }
}
