//! Changed-Files Resolver: scope derivation and strategy selection

pub mod api;
pub mod diff;

pub use api::ApiDetector;
pub use diff::DiffDetector;

use crate::config::{ActionConfig, ChangeDetection};
use crate::env::RawEnvironment;
use crate::error::{Error, Result};
use crate::http::GitHubApiClient;
use crate::resolve::ParsedRef;
use crate::traits::ChangeDetector;
use crate::types::EventInfo;
use std::future::Future;

/// What to compare for the current invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeScope {
    /// No change set applies (tags, releases, schedules, dispatches)
    None,
    /// Branch push; `before` is `None` when the branch was just created
    Push {
        /// Commit before the push
        before: Option<String>,
        /// Pushed head commit
        head: String,
    },
    /// Pull request
    PullRequest {
        /// PR number
        number: u64,
        /// Target-side commit, when the payload carries it
        base: Option<String>,
        /// Target branch name, used when `base` is missing
        base_ref: Option<String>,
        /// Source-side commit (falls back to the checked-out commit)
        head: String,
    },
}

impl ChangeScope {
    /// Derive the scope from the classified event
    pub fn from_event(event: &EventInfo, raw: &RawEnvironment, parsed: &ParsedRef<'_>) -> Result<Self> {
        if event.is_branch_push {
            let before = raw
                .payload
                .before
                .as_deref()
                .filter(|sha| is_real_sha(sha))
                .map(str::to_ascii_lowercase);
            return Ok(Self::Push {
                before,
                head: raw.sha.clone(),
            });
        }

        if event.is_pull_request {
            let pr = raw.payload.pull_request.as_ref();
            let number = pr
                .and_then(|p| p.number)
                .or_else(|| parsed.pull_number())
                .ok_or_else(|| Error::Config("pull request number is unknown".to_string()))?;
            let base = pr
                .and_then(|p| p.base.as_ref())
                .and_then(|b| b.sha.clone())
                .filter(|sha| is_real_sha(sha));
            let base_ref = raw.base_ref.clone().or_else(|| {
                pr.and_then(|p| p.base.as_ref())
                    .and_then(|b| b.git_ref.clone())
            });
            let head = pr
                .and_then(|p| p.head.as_ref())
                .and_then(|h| h.sha.clone())
                .filter(|sha| is_real_sha(sha))
                .unwrap_or_else(|| raw.sha.clone());
            return Ok(Self::PullRequest {
                number,
                base,
                base_ref,
                head,
            });
        }

        Ok(Self::None)
    }
}

/// 40-hex SHA that is not the all-zero placeholder
fn is_real_sha(sha: &str) -> bool {
    sha.len() == 40 && sha.bytes().all(|b| b.is_ascii_hexdigit()) && sha.bytes().any(|b| b != b'0')
}

/// Which detector to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Local history diff
    Diff,
    /// Hosting API listing
    Api,
}

/// Explicit method wins; `auto` picks the API when a credential is present
pub fn select_strategy(method: ChangeDetection, has_token: bool) -> Strategy {
    match method {
        ChangeDetection::Git => Strategy::Diff,
        ChangeDetection::GithubApi => Strategy::Api,
        ChangeDetection::Auto if has_token => Strategy::Api,
        ChangeDetection::Auto => Strategy::Diff,
    }
}

/// API root: explicit override, then `GITHUB_API_URL`, then the public API
pub fn api_base_url(config: &ActionConfig, raw: &RawEnvironment) -> String {
    config
        .api_url
        .clone()
        .or_else(|| raw.api_url.clone())
        .unwrap_or_else(|| crate::config::DEFAULT_API_URL.to_string())
}

/// The two built-in detectors
#[derive(Debug)]
pub enum Detector {
    /// Local history
    Diff(DiffDetector),
    /// Hosting API
    Api(ApiDetector),
}

impl Detector {
    /// Build the detector chosen by [`select_strategy`]
    pub fn from_config(config: &ActionConfig, raw: &RawEnvironment) -> Self {
        match select_strategy(config.change_detection, config.token().is_some()) {
            Strategy::Diff => Self::Diff(DiffDetector::new(
                config.repo_path.clone(),
                config.fetch_depth,
                config.deepen_step,
            )),
            Strategy::Api => {
                let client = GitHubApiClient::new(api_base_url(config, raw), config.token.clone());
                Self::Api(ApiDetector::new(client, raw.owner.clone(), raw.name.clone()))
            }
        }
    }
}

impl ChangeDetector for Detector {
    fn name(&self) -> &'static str {
        match self {
            Self::Diff(d) => d.name(),
            Self::Api(d) => d.name(),
        }
    }

    fn detect<'a>(
        &'a self,
        scope: &'a ChangeScope,
    ) -> impl Future<Output = Result<Vec<String>>> + Send + 'a {
        async move {
            match self {
                Self::Diff(d) => d.detect(scope).await,
                Self::Api(d) => d.detect(scope).await,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::EventPayload;
    use crate::resolve::EventClassifier;
    use assert_matches::assert_matches;

    const SHA: &str = "a1b2c3d4e5f6789012345678901234567890abcd";
    const BEFORE: &str = "1111111111111111111111111111111111111111";

    fn raw(event: &str, git_ref: &str, payload: &str) -> RawEnvironment {
        RawEnvironment {
            owner: "octo".into(),
            name: "widgets".into(),
            event_name: event.into(),
            git_ref: git_ref.into(),
            sha: SHA.into(),
            payload: EventPayload::from_json(payload).unwrap(),
            ..Default::default()
        }
    }

    fn scope_for(raw: &RawEnvironment) -> Result<ChangeScope> {
        let parsed = ParsedRef::parse(&raw.git_ref, None).unwrap();
        let event = EventClassifier::classify(&raw.event_name, &parsed, None);
        ChangeScope::from_event(&event, raw, &parsed)
    }

    #[test]
    fn test_select_strategy() {
        assert_eq!(select_strategy(ChangeDetection::Auto, true), Strategy::Api);
        assert_eq!(select_strategy(ChangeDetection::Auto, false), Strategy::Diff);
        assert_eq!(select_strategy(ChangeDetection::Git, true), Strategy::Diff);
        assert_eq!(select_strategy(ChangeDetection::GithubApi, false), Strategy::Api);
    }

    #[test]
    fn test_detector_from_config() {
        let raw = raw("push", "refs/heads/main", "{}");
        let config = ActionConfig::default();
        assert_matches!(Detector::from_config(&config, &raw), Detector::Diff(_));

        let config = ActionConfig {
            token: Some("t".into()),
            ..Default::default()
        };
        let detector = Detector::from_config(&config, &raw);
        assert_eq!(detector.name(), "github_api");
        assert_eq!(api_base_url(&config, &raw), crate::config::DEFAULT_API_URL);
    }

    #[test]
    fn test_branch_push_scope() {
        let raw = raw("push", "refs/heads/main", &format!(r#"{{"before": "{}"}}"#, BEFORE));
        assert_eq!(
            scope_for(&raw).unwrap(),
            ChangeScope::Push {
                before: Some(BEFORE.into()),
                head: SHA.into()
            }
        );
    }

    #[test]
    fn test_branch_creation_has_no_before() {
        let raw = raw(
            "push",
            "refs/heads/new-branch",
            r#"{"before": "0000000000000000000000000000000000000000"}"#,
        );
        assert_eq!(
            scope_for(&raw).unwrap(),
            ChangeScope::Push {
                before: None,
                head: SHA.into()
            }
        );
    }

    #[test]
    fn test_pull_request_scope() {
        let raw = raw(
            "pull_request",
            "refs/pull/12/merge",
            &format!(
                r#"{{"pull_request": {{"number": 12,
                    "base": {{"ref": "main", "sha": "{}"}},
                    "head": {{"ref": "feature", "sha": "{}"}}}}}}"#,
                BEFORE, "2222222222222222222222222222222222222222"
            ),
        );
        assert_eq!(
            scope_for(&raw).unwrap(),
            ChangeScope::PullRequest {
                number: 12,
                base: Some(BEFORE.into()),
                base_ref: Some("main".into()),
                head: "2222222222222222222222222222222222222222".into(),
            }
        );
    }

    #[test]
    fn test_pull_request_number_from_ref() {
        let raw = raw("pull_request", "refs/pull/34/merge", "{}");
        assert_matches!(
            scope_for(&raw).unwrap(),
            ChangeScope::PullRequest { number: 34, base: None, .. }
        );
    }

    #[test]
    fn test_other_events_have_no_scope() {
        assert_eq!(
            scope_for(&raw("push", "refs/tags/v1.0.0", "{}")).unwrap(),
            ChangeScope::None
        );
        assert_eq!(
            scope_for(&raw("schedule", "refs/heads/main", "{}")).unwrap(),
            ChangeScope::None
        );
        assert_eq!(
            scope_for(&raw("release", "refs/tags/v1.0.0", "{}")).unwrap(),
            ChangeScope::None
        );
    }
}
