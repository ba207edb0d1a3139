//! GitHub REST API client: changed-file listings and repository details

use crate::error::{Error, Result};
use crate::types::Visibility;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::Deserialize;

/// Files per page (API maximum)
pub const PER_PAGE: usize = 100;

/// Page limit; the API stops listing files after 3000 entries
pub const MAX_PAGES: u32 = 30;

/// A changed file in a listing
#[derive(Debug, Deserialize)]
struct ApiFile {
    filename: String,
}

/// Compare and commit endpoints wrap the list in an object
#[derive(Debug, Deserialize)]
struct FilesEnvelope {
    #[serde(default)]
    files: Vec<ApiFile>,
}

#[derive(Debug, Deserialize)]
struct ApiRepository {
    default_branch: Option<String>,
    private: Option<bool>,
    visibility: Option<String>,
}

/// Repository details the event payload may lack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryDetails {
    /// Default branch
    pub default_branch: Option<String>,
    /// Visibility
    pub visibility: Visibility,
}

/// Shape of a file-listing response
#[derive(Debug, Clone, Copy)]
enum Listing {
    /// Bare JSON array (`pulls/{n}/files`)
    Array,
    /// `{"files": [...]}` (`compare`, `commits/{sha}`)
    Envelope,
}

/// GitHub API client
pub struct GitHubApiClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl std::fmt::Debug for GitHubApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubApiClient")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl GitHubApiClient {
    /// Create a new GitHub API client
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("repometa/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        }
    }

    /// API root
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether a credential is configured
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Files changed by a pull request
    pub async fn pull_request_files(&self, owner: &str, repo: &str, number: u64) -> Result<Vec<String>> {
        let url = format!("{}/repos/{}/{}/pulls/{}/files", self.base_url, owner, repo, number);
        self.paginate_files(&url, Listing::Array).await
    }

    /// Files changed between two commits (`base...head`)
    pub async fn compare_files(&self, owner: &str, repo: &str, base: &str, head: &str) -> Result<Vec<String>> {
        let url = format!(
            "{}/repos/{}/{}/compare/{}...{}",
            self.base_url, owner, repo, base, head
        );
        self.paginate_files(&url, Listing::Envelope).await
    }

    /// Files changed by a single commit
    pub async fn commit_files(&self, owner: &str, repo: &str, sha: &str) -> Result<Vec<String>> {
        let url = format!("{}/repos/{}/{}/commits/{}", self.base_url, owner, repo, sha);
        self.paginate_files(&url, Listing::Envelope).await
    }

    /// Default branch and visibility
    pub async fn repository(&self, owner: &str, repo: &str) -> Result<RepositoryDetails> {
        let url = format!("{}/repos/{}/{}", self.base_url, owner, repo);
        let response = self.get(&url).send().await?;
        check_status(response.status(), response.headers())?;

        let body: ApiRepository = response
            .json()
            .await
            .map_err(|e| Error::Http(format!("Failed to parse repository response: {}", e)))?;

        let visibility = match (body.visibility.as_deref(), body.private) {
            (Some(v), _) if Visibility::parse(v) != Visibility::Unknown => Visibility::parse(v),
            (_, Some(private)) => Visibility::from_private_flag(private),
            _ => Visibility::Unknown,
        };

        Ok(RepositoryDetails {
            default_branch: body.default_branch.filter(|b| !b.is_empty()),
            visibility,
        })
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");

        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }
        request
    }

    /// Walk `page=1..` until a short or empty page
    async fn paginate_files(&self, url: &str, listing: Listing) -> Result<Vec<String>> {
        let mut all_files = Vec::new();
        let mut page = 1u32;

        loop {
            let response = self
                .get(url)
                .query(&[("per_page", PER_PAGE.to_string()), ("page", page.to_string())])
                .send()
                .await?;

            check_status(response.status(), response.headers())?;

            let files: Vec<ApiFile> = match listing {
                Listing::Array => response.json::<Vec<ApiFile>>().await,
                Listing::Envelope => response.json::<FilesEnvelope>().await.map(|e| e.files),
            }
            .map_err(|e| Error::Http(format!("Failed to parse GitHub API response: {}", e)))?;

            let received = files.len();
            tracing::debug!(url, page, received, "fetched file listing page");
            all_files.extend(files.into_iter().map(|f| f.filename));

            if received < PER_PAGE {
                break;
            }
            if page >= MAX_PAGES {
                tracing::warn!(
                    url,
                    files = all_files.len(),
                    "file listing truncated at the API page limit"
                );
                break;
            }
            page += 1;
        }

        Ok(all_files)
    }
}

/// Map a non-success response to the error taxonomy
pub fn check_status(status: StatusCode, headers: &HeaderMap) -> Result<()> {
    if status.is_success() {
        return Ok(());
    }

    match status {
        StatusCode::UNAUTHORIZED => Err(Error::Authentication(
            "GitHub API rejected the credential (401)".to_string(),
        )),
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
            let remaining = headers
                .get("x-ratelimit-remaining")
                .and_then(|v| v.to_str().ok());
            if remaining == Some("0") || status == StatusCode::TOO_MANY_REQUESTS {
                Err(Error::Http(
                    "GitHub API rate limit exceeded; supply a token".to_string(),
                ))
            } else {
                Err(Error::Authentication(
                    "GitHub API denied access (403); check the token's permissions".to_string(),
                ))
            }
        }
        other => Err(Error::Http(format!("GitHub API returned error: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_client_creation() {
        let client = GitHubApiClient::new("https://api.github.com/", None);
        assert_eq!(client.base_url(), "https://api.github.com");
        assert!(!client.has_token());
    }

    #[test]
    fn test_empty_token_is_none() {
        let client = GitHubApiClient::new("https://api.github.com", Some(String::new()));
        assert!(!client.has_token());
    }

    #[test]
    fn test_debug_redacts_token() {
        let client = GitHubApiClient::new("https://api.github.com", Some("ghp_topsecret".into()));
        let debug = format!("{:?}", client);
        assert!(!debug.contains("ghp_topsecret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_check_status_success() {
        assert!(check_status(StatusCode::OK, &HeaderMap::new()).is_ok());
    }

    #[test]
    fn test_check_status_unauthorized() {
        assert_matches!(
            check_status(StatusCode::UNAUTHORIZED, &HeaderMap::new()),
            Err(Error::Authentication(_))
        );
    }

    #[test]
    fn test_check_status_forbidden_vs_rate_limited() {
        assert_matches!(
            check_status(StatusCode::FORBIDDEN, &HeaderMap::new()),
            Err(Error::Authentication(_))
        );

        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
        assert_matches!(
            check_status(StatusCode::FORBIDDEN, &headers),
            Err(Error::Http(_))
        );
    }

    #[test]
    fn test_check_status_other() {
        assert_matches!(
            check_status(StatusCode::NOT_FOUND, &HeaderMap::new()),
            Err(Error::Http(ref msg)) if msg.contains("404")
        );
    }

    #[test]
    fn test_envelope_without_files() {
        let env: FilesEnvelope = serde_json::from_str(r#"{"sha": "abc"}"#).unwrap();
        assert!(env.files.is_empty());
    }
}
