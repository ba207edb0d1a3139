//! Metadata record and the small enums it is built from
//!
//! Field declaration order is serialization order: the JSON and YAML
//! renderings list keys exactly as they appear here.

use serde::Serialize;

/// Canonical event category reported as `event.name`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventName {
    /// Branch or tag push (also the fallback for unrecognised triggers)
    Push,
    /// Pull request (including `pull_request_target`)
    PullRequest,
    /// Release
    Release,
    /// Scheduled trigger
    Schedule,
    /// Manual dispatch
    WorkflowDispatch,
}

impl EventName {
    /// Get string representation
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::PullRequest => "pull_request",
            Self::Release => "release",
            Self::Schedule => "schedule",
            Self::WorkflowDispatch => "workflow_dispatch",
        }
    }
}

/// Repository visibility.
///
/// `Unknown` exists so that an unresolvable visibility is reported as such
/// instead of as "neither public nor private".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Public repository
    Public,
    /// Private repository
    Private,
    /// Enterprise-internal repository (not public)
    Internal,
    /// Could not be determined
    #[default]
    Unknown,
}

impl Visibility {
    /// Parse the hosting platform's `visibility` string
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Self::Public,
            "private" => Self::Private,
            "internal" => Self::Internal,
            _ => Self::Unknown,
        }
    }

    /// From the boolean `private` flag
    #[inline]
    pub const fn from_private_flag(private: bool) -> Self {
        if private {
            Self::Private
        } else {
            Self::Public
        }
    }

    /// `Some(true)` for public, `Some(false)` for private/internal, `None` when unknown
    #[inline]
    pub const fn is_public(&self) -> Option<bool> {
        match self {
            Self::Public => Some(true),
            Self::Private | Self::Internal => Some(false),
            Self::Unknown => None,
        }
    }

    /// Negation of [`Self::is_public`] when known
    #[inline]
    pub const fn is_private(&self) -> Option<bool> {
        match self.is_public() {
            Some(public) => Some(!public),
            None => None,
        }
    }

    /// Get string representation
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::Internal => "internal",
            Self::Unknown => "unknown",
        }
    }
}

/// The single aggregate output of one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
    /// Repository identity and visibility
    pub repository: RepositoryInfo,
    /// Event category and flags
    pub event: EventInfo,
    /// Branch/tag resolution
    #[serde(rename = "ref")]
    pub git_ref: RefInfo,
    /// Head commit
    pub commit: CommitInfo,
    /// Pull request details (empty when not a PR)
    pub pull_request: PullRequestInfo,
    /// Triggering actor
    pub actor: ActorInfo,
    /// Cache keys
    pub cache: CacheKeys,
    /// Changed files
    pub changed_files: ChangedFiles,
    /// Workflow run identity
    pub run: RunInfo,
}

/// `repository` group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryInfo {
    /// Repository owner (user or organisation)
    pub owner: String,
    /// Repository name without the owner
    pub name: String,
    /// Always `owner/name`
    pub full_name: String,
    /// `null` when visibility is unknown
    pub is_public: Option<bool>,
    /// `null` when visibility is unknown; internal counts as private
    pub is_private: Option<bool>,
    /// Resolved visibility
    pub visibility: Visibility,
    /// Default branch, empty when unknown
    pub default_branch: String,
}

impl RepositoryInfo {
    /// Build the group, deriving `full_name` and both visibility flags
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        visibility: Visibility,
        default_branch: impl Into<String>,
    ) -> Self {
        let owner = owner.into();
        let name = name.into();
        let full_name = format!("{}/{}", owner, name);
        Self {
            owner,
            name,
            full_name,
            is_public: visibility.is_public(),
            is_private: visibility.is_private(),
            visibility,
            default_branch: default_branch.into(),
        }
    }
}

/// `event` group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventInfo {
    /// Normalised event category
    pub name: EventName,
    /// Push of a tag
    pub is_tag_push: bool,
    /// Push of a branch
    pub is_branch_push: bool,
    /// Pull request event
    pub is_pull_request: bool,
    /// Release event
    pub is_release: bool,
    /// Scheduled run
    pub is_schedule: bool,
    /// Manual dispatch
    pub is_workflow_dispatch: bool,
    /// Refinement of `is_tag_push`: the tag looks like `v1.2.3`
    pub tag_push_event: bool,
    /// Raw event name as delivered by the runner
    pub trigger: String,
    /// Payload action verb (`opened`, `published`, ...), empty when absent
    pub action: String,
}

impl EventInfo {
    /// Number of primary category flags set; always 1 for a classified event
    pub fn primary_flag_count(&self) -> usize {
        [
            self.is_tag_push,
            self.is_branch_push,
            self.is_pull_request,
            self.is_release,
            self.is_schedule,
            self.is_workflow_dispatch,
        ]
        .iter()
        .filter(|&&f| f)
        .count()
    }
}

/// `ref` group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefInfo {
    /// Branch name, empty for tags
    pub branch_name: String,
    /// Tag name, empty for branches
    pub tag_name: String,
    /// Branch equals the repository default branch
    pub is_default_branch: bool,
    /// Branch is `main` or `master`
    pub is_main_branch: bool,
}

impl RefInfo {
    /// The non-empty one of `branch_name` / `tag_name`
    pub fn name(&self) -> &str {
        if self.branch_name.is_empty() {
            &self.tag_name
        } else {
            &self.branch_name
        }
    }
}

/// `commit` group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitInfo {
    /// Full 40-character SHA
    pub sha: String,
    /// First seven characters of `sha`
    pub sha_short: String,
    /// First line of the commit message
    pub message: String,
    /// Author name, empty when unknown
    pub author: String,
}

/// `pull_request` group
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PullRequestInfo {
    /// `null` when not a pull request
    pub number: Option<u64>,
    /// Head branch
    pub source_branch: String,
    /// Base branch
    pub target_branch: String,
    /// Head repository differs from the base repository
    pub is_fork: bool,
    /// Commits in the pull request
    pub commits_count: u64,
}

/// `actor` group
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActorInfo {
    /// Login of the triggering user
    pub name: String,
    /// Numeric account id, 0 when unknown
    pub id: u64,
}

/// `cache` group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheKeys {
    /// `owner-name-ref-sha_short`
    pub key: String,
    /// Prefix of `key`
    pub restore_key: String,
}

/// `changed_files` group.
///
/// `files` is space-joined in discovery order. Paths that themselves
/// contain spaces cannot be told apart after joining.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangedFiles {
    /// Number of changed paths
    pub count: usize,
    /// Space-joined paths
    pub files: String,
}

impl ChangedFiles {
    /// Build from an ordered path list
    pub fn from_paths<S: AsRef<str>>(paths: &[S]) -> Self {
        let files = paths
            .iter()
            .map(|p| p.as_ref())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            count: paths.len(),
            files,
        }
    }
}

/// `run` group
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunInfo {
    /// Workflow name
    pub workflow: String,
    /// Job id
    pub job: String,
    /// Run id
    pub id: String,
    /// Run number
    pub number: String,
    /// Run attempt
    pub attempt: String,
    /// Link to the run page, empty when the run id is unknown
    pub url: String,
}
