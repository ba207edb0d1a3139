//! Metadata Aggregator
//!
//! Combines the classifier, ref resolver, cache-key generator and the
//! changed-file list with the directly read fields into one [`Metadata`].
//! Every step returns `Result`; nothing partial is handed on.

use crate::changes::ChangeScope;
use crate::env::payload::PayloadCommit;
use crate::env::{EventPayload, RawEnvironment};
use crate::error::{Error, Result};
use crate::git::GitRepository;
use crate::http::{GitHubApiClient, RepositoryDetails};
use crate::resolve::{cache, first_line, short_sha, EventClassifier, ParsedRef, RefResolver};
use crate::types::{
    ActorInfo, ChangedFiles, CommitInfo, EventInfo, Metadata, PullRequestInfo, RefInfo,
    RepositoryInfo, RunInfo, Visibility,
};
use std::path::PathBuf;

/// Default branch and visibility as far as the event payload knows them
pub fn payload_repository_details(payload: &EventPayload) -> RepositoryDetails {
    let repo = payload.repository.as_ref();

    let visibility = repo
        .and_then(|r| r.visibility.as_deref())
        .map(Visibility::parse)
        .filter(|v| *v != Visibility::Unknown)
        .or_else(|| repo.and_then(|r| r.private).map(Visibility::from_private_flag))
        .unwrap_or_default();

    RepositoryDetails {
        default_branch: repo
            .and_then(|r| r.default_branch.clone())
            .filter(|b| !b.is_empty()),
        visibility,
    }
}

/// Payload details, completed from the repository API when something is
/// missing and a client is available
pub async fn repository_details(
    raw: &RawEnvironment,
    client: Option<&GitHubApiClient>,
) -> Result<RepositoryDetails> {
    let mut details = payload_repository_details(&raw.payload);

    let incomplete = details.default_branch.is_none() || details.visibility == Visibility::Unknown;
    let Some(client) = client.filter(|c| c.has_token() && incomplete) else {
        return Ok(details);
    };

    let remote = client.repository(&raw.owner, &raw.name).await?;
    if details.default_branch.is_none() {
        details.default_branch = remote.default_branch;
    }
    if details.visibility == Visibility::Unknown {
        details.visibility = remote.visibility;
    }
    Ok(details)
}

/// Output of the classification stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Event category and flags
    pub event: EventInfo,
    /// Branch/tag resolution
    pub git_ref: RefInfo,
    /// What the changed-files stage compares
    pub scope: ChangeScope,
}

/// Assembles a [`Metadata`] record from one [`RawEnvironment`]
pub struct MetadataAggregator<'a> {
    raw: &'a RawEnvironment,
}

impl<'a> MetadataAggregator<'a> {
    /// Aggregator over `raw`
    pub fn new(raw: &'a RawEnvironment) -> Self {
        Self { raw }
    }

    /// PR source branch from the environment or the payload
    fn head_ref(&self) -> Option<&'a str> {
        self.raw
            .head_ref
            .as_deref()
            .or_else(|| {
                self.raw
                    .payload
                    .pull_request
                    .as_ref()
                    .and_then(|pr| pr.head.as_ref())
                    .and_then(|h| h.git_ref.as_deref())
            })
            .filter(|h| !h.is_empty())
    }

    /// PR target branch from the environment or the payload
    fn base_ref(&self) -> Option<&'a str> {
        self.raw
            .base_ref
            .as_deref()
            .or_else(|| {
                self.raw
                    .payload
                    .pull_request
                    .as_ref()
                    .and_then(|pr| pr.base.as_ref())
                    .and_then(|b| b.git_ref.as_deref())
            })
            .filter(|b| !b.is_empty())
    }

    /// Parse the ref, classify the event and derive the change scope
    pub fn classify(&self, details: &RepositoryDetails) -> Result<Classification> {
        let raw = self.raw;
        let parsed = ParsedRef::parse(&raw.git_ref, raw.ref_type.as_deref())?;
        let event = EventClassifier::classify(&raw.event_name, &parsed, raw.payload.action.as_deref());

        // pull_request_target runs on the base branch ref; the reported
        // branch is still the PR source branch
        let head_ref = self.head_ref();
        let effective = match (event.is_pull_request, head_ref) {
            (true, Some(head)) => ParsedRef::Branch(head),
            _ => parsed,
        };

        let resolver = RefResolver::new(details.default_branch.as_deref());
        let git_ref = resolver.resolve(&effective, head_ref)?;

        let mut scope = ChangeScope::from_event(&event, raw, &parsed)?;
        if let ChangeScope::PullRequest { base_ref, .. } = &mut scope {
            if base_ref.is_none() {
                *base_ref = self.base_ref().map(str::to_string);
            }
        }

        Ok(Classification {
            event,
            git_ref,
            scope,
        })
    }

    /// `pull_request` group; empty unless the event is a pull request
    pub fn pull_request(&self, classification: &Classification) -> PullRequestInfo {
        if !classification.event.is_pull_request {
            return PullRequestInfo::default();
        }

        let pr = self.raw.payload.pull_request.as_ref();
        let number = match &classification.scope {
            ChangeScope::PullRequest { number, .. } => Some(*number),
            _ => pr.and_then(|p| p.number),
        };

        PullRequestInfo {
            number,
            source_branch: self.head_ref().unwrap_or_default().to_string(),
            target_branch: self.base_ref().unwrap_or_default().to_string(),
            is_fork: self.raw.payload.pull_request_is_fork(),
            commits_count: pr.and_then(|p| p.commits).unwrap_or(0),
        }
    }

    /// `commit` group from the payload's head commit; `local` supplies
    /// message and author when the payload has none
    pub fn commit(&self, local: Option<(String, String)>) -> CommitInfo {
        let raw = self.raw;
        let (message, author) = match self.matching_head_commit() {
            Some(c) => (
                c.message.clone().unwrap_or_default(),
                c.author
                    .as_ref()
                    .and_then(|a| a.name.clone().or_else(|| a.username.clone()))
                    .unwrap_or_default(),
            ),
            None => local.unwrap_or_default(),
        };

        CommitInfo {
            sha: raw.sha.clone(),
            sha_short: short_sha(&raw.sha).to_string(),
            message: first_line(&message).to_string(),
            author,
        }
    }

    /// Payload head commit, unless its id names a different commit
    fn matching_head_commit(&self) -> Option<&'a PayloadCommit> {
        let sha = self.raw.sha.as_str();
        self.raw
            .payload
            .head_commit
            .as_ref()
            .filter(|c| c.id.as_deref().map_or(true, |id| id.eq_ignore_ascii_case(sha)))
    }

    /// Whether [`commit`](Self::commit) needs the local repository
    pub fn needs_local_commit(&self) -> bool {
        self.matching_head_commit().is_none()
    }

    /// `run` group
    pub fn run(&self) -> RunInfo {
        let raw = self.raw;
        let url = if raw.run_id.is_empty() {
            String::new()
        } else {
            format!(
                "{}/{}/{}/actions/runs/{}",
                raw.server_url, raw.owner, raw.name, raw.run_id
            )
        };

        RunInfo {
            workflow: raw.workflow.clone(),
            job: raw.job.clone(),
            id: raw.run_id.clone(),
            number: raw.run_number.clone(),
            attempt: raw.run_attempt.clone(),
            url,
        }
    }

    /// Combine everything into the final record
    pub fn assemble(
        &self,
        details: &RepositoryDetails,
        classification: Classification,
        commit: CommitInfo,
        changed_paths: &[String],
    ) -> Result<Metadata> {
        let raw = self.raw;
        let pull_request = self.pull_request(&classification);

        let Classification { event, git_ref, .. } = classification;

        if git_ref.branch_name.is_empty() == git_ref.tag_name.is_empty() {
            return Err(Error::Config(format!(
                "ref {} resolved to neither or both of a branch and a tag",
                raw.git_ref
            )));
        }

        let cache = cache::generate(&raw.owner, &raw.name, git_ref.name(), &commit.sha_short);

        Ok(Metadata {
            repository: RepositoryInfo::new(
                raw.owner.as_str(),
                raw.name.as_str(),
                details.visibility,
                details.default_branch.clone().unwrap_or_default(),
            ),
            event,
            git_ref,
            commit,
            pull_request,
            actor: ActorInfo {
                name: raw.actor_name.clone(),
                id: raw.actor_id,
            },
            cache,
            changed_files: ChangedFiles::from_paths(changed_paths),
            run: self.run(),
        })
    }
}

/// Message and author of `sha` in the checkout at `repo_path`, if it can be
/// read. Runs libgit2 on the blocking pool.
pub async fn local_commit_summary(repo_path: PathBuf, sha: String) -> Option<(String, String)> {
    let lookup = tokio::task::spawn_blocking(move || {
        GitRepository::discover(&repo_path).and_then(|repo| repo.commit_summary(&sha))
    })
    .await;

    match lookup {
        Ok(Ok(summary)) => Some(summary),
        Ok(Err(e)) => {
            tracing::debug!(error = %e, "commit details not available locally");
            None
        }
        Err(e) => {
            tracing::debug!(error = %e, "commit lookup task failed");
            None
        }
    }
}
