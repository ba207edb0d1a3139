//! API strategy: ask the hosting API for the change set

use super::ChangeScope;
use crate::error::Result;
use crate::http::GitHubApiClient;
use crate::traits::ChangeDetector;
use std::future::Future;

/// Hosting-API change detector
#[derive(Debug)]
pub struct ApiDetector {
    client: GitHubApiClient,
    owner: String,
    repo: String,
}

impl ApiDetector {
    /// Detector for `owner/repo`
    pub fn new(client: GitHubApiClient, owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            client,
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

impl ChangeDetector for ApiDetector {
    fn name(&self) -> &'static str {
        "github_api"
    }

    fn detect<'a>(
        &'a self,
        scope: &'a ChangeScope,
    ) -> impl Future<Output = Result<Vec<String>>> + Send + 'a {
        async move {
            match scope {
                ChangeScope::None => Ok(Vec::new()),
                ChangeScope::Push {
                    before: Some(before),
                    head,
                } => {
                    self.client
                        .compare_files(&self.owner, &self.repo, before, head)
                        .await
                }
                ChangeScope::Push { before: None, head } => {
                    self.client.commit_files(&self.owner, &self.repo, head).await
                }
                ChangeScope::PullRequest { number, .. } => {
                    self.client
                        .pull_request_files(&self.owner, &self.repo, *number)
                        .await
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_none_scope_makes_no_request() {
        // Unroutable base URL: any request would fail
        let client = GitHubApiClient::new("http://127.0.0.1:1", Some("token".into()));
        let detector = ApiDetector::new(client, "octo", "widgets");
        let files = detector.detect(&ChangeScope::None).await.unwrap();
        assert!(files.is_empty());
        assert_eq!(detector.name(), "github_api");
    }

    #[test]
    fn test_debug_hides_token() {
        let client = GitHubApiClient::new("https://api.github.com", Some("ghp_secret".into()));
        let detector = ApiDetector::new(client, "octo", "widgets");
        assert!(!format!("{:?}", detector).contains("ghp_secret"));
    }
}
