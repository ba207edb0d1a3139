//! Ref Resolver: branch vs tag, default and main branch flags

use crate::error::{Error, Result};
use crate::types::RefInfo;

const HEADS_PREFIX: &str = "refs/heads/";
const TAGS_PREFIX: &str = "refs/tags/";
const PULL_PREFIX: &str = "refs/pull/";

/// Branch names that count as "main"
pub const MAIN_BRANCHES: [&str; 2] = ["main", "master"];

/// A parsed ref string, borrowing from the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedRef<'a> {
    /// `refs/heads/<name>`
    Branch(&'a str),
    /// `refs/tags/<name>`
    Tag(&'a str),
    /// `refs/pull/<number>/<suffix>`
    PullRequest(u64),
}

impl<'a> ParsedRef<'a> {
    /// Parse a full ref; bare names are disambiguated by `ref_type`
    pub fn parse(git_ref: &'a str, ref_type: Option<&str>) -> Result<Self> {
        let git_ref = git_ref.trim();
        if git_ref.is_empty() {
            return Err(Error::Config("empty ref".to_string()));
        }

        if let Some(name) = git_ref.strip_prefix(HEADS_PREFIX) {
            return non_empty(name, git_ref).map(Self::Branch);
        }
        if let Some(name) = git_ref.strip_prefix(TAGS_PREFIX) {
            return non_empty(name, git_ref).map(Self::Tag);
        }
        if let Some(rest) = git_ref.strip_prefix(PULL_PREFIX) {
            let number = rest
                .split('/')
                .next()
                .and_then(|n| n.parse::<u64>().ok())
                .ok_or_else(|| {
                    Error::Config(format!("Invalid PR number in ref: {}", git_ref))
                })?;
            return Ok(Self::PullRequest(number));
        }
        if git_ref.starts_with("refs/") {
            return Err(Error::Config(format!("Unsupported ref: {}", git_ref)));
        }

        match ref_type.map(str::trim) {
            Some(t) if t.eq_ignore_ascii_case("tag") => Ok(Self::Tag(git_ref)),
            _ => Ok(Self::Branch(git_ref)),
        }
    }

    /// Whether this is a tag ref
    #[inline]
    pub const fn is_tag(&self) -> bool {
        matches!(self, Self::Tag(_))
    }

    /// PR number for `refs/pull/..`
    #[inline]
    pub const fn pull_number(&self) -> Option<u64> {
        match self {
            Self::PullRequest(n) => Some(*n),
            _ => None,
        }
    }
}

fn non_empty<'a>(name: &'a str, full: &str) -> Result<&'a str> {
    if name.is_empty() {
        Err(Error::Config(format!("Ref has no name: {}", full)))
    } else {
        Ok(name)
    }
}

/// Resolves [`RefInfo`] against the repository's default branch
#[derive(Debug, Clone, Copy)]
pub struct RefResolver<'a> {
    default_branch: Option<&'a str>,
}

impl<'a> RefResolver<'a> {
    /// `default_branch` is `None` when it could not be determined
    pub fn new(default_branch: Option<&'a str>) -> Self {
        Self {
            default_branch: default_branch.filter(|b| !b.is_empty()),
        }
    }

    /// Split a parsed ref into branch/tag names.
    ///
    /// Pull request refs take the branch name from `head_ref` (the PR source
    /// branch); a pull request without one is a configuration error.
    pub fn resolve(&self, parsed: &ParsedRef<'_>, head_ref: Option<&str>) -> Result<RefInfo> {
        let (branch_name, tag_name) = match *parsed {
            ParsedRef::Branch(name) => (name.to_string(), String::new()),
            ParsedRef::Tag(name) => (String::new(), name.to_string()),
            ParsedRef::PullRequest(number) => {
                let head = head_ref.filter(|h| !h.is_empty()).ok_or_else(|| {
                    Error::Config(format!(
                        "source branch of pull request #{} is unknown",
                        number
                    ))
                })?;
                (head.to_string(), String::new())
            }
        };

        let is_default_branch =
            !branch_name.is_empty() && self.default_branch == Some(branch_name.as_str());
        let is_main_branch = MAIN_BRANCHES.contains(&branch_name.as_str());

        Ok(RefInfo {
            branch_name,
            tag_name,
            is_default_branch,
            is_main_branch,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_parse_full_refs() {
        assert_eq!(
            ParsedRef::parse("refs/heads/main", None).unwrap(),
            ParsedRef::Branch("main")
        );
        assert_eq!(
            ParsedRef::parse("refs/heads/feature/login", None).unwrap(),
            ParsedRef::Branch("feature/login")
        );
        assert_eq!(
            ParsedRef::parse("refs/tags/v1.2.3", None).unwrap(),
            ParsedRef::Tag("v1.2.3")
        );
        assert_eq!(
            ParsedRef::parse("refs/pull/123/merge", None).unwrap(),
            ParsedRef::PullRequest(123)
        );
    }

    #[test]
    fn test_parse_bare_names_use_ref_type() {
        assert_eq!(
            ParsedRef::parse("v2", Some("tag")).unwrap(),
            ParsedRef::Tag("v2")
        );
        assert_eq!(
            ParsedRef::parse("develop", Some("branch")).unwrap(),
            ParsedRef::Branch("develop")
        );
        assert_eq!(
            ParsedRef::parse("develop", None).unwrap(),
            ParsedRef::Branch("develop")
        );
    }

    #[test]
    fn test_parse_invalid_refs() {
        assert_matches!(ParsedRef::parse("", None), Err(Error::Config(_)));
        assert_matches!(ParsedRef::parse("refs/heads/", None), Err(Error::Config(_)));
        assert_matches!(ParsedRef::parse("refs/pull/abc/merge", None), Err(Error::Config(_)));
        assert_matches!(ParsedRef::parse("refs/remotes/origin/main", None), Err(Error::Config(_)));
    }

    #[test]
    fn test_resolve_default_main_branch() {
        let resolver = RefResolver::new(Some("main"));
        let info = resolver.resolve(&ParsedRef::Branch("main"), None).unwrap();
        assert_eq!(info.branch_name, "main");
        assert_eq!(info.tag_name, "");
        assert!(info.is_default_branch);
        assert!(info.is_main_branch);
    }

    #[test]
    fn test_resolve_master_not_default() {
        let resolver = RefResolver::new(Some("develop"));
        let info = resolver.resolve(&ParsedRef::Branch("master"), None).unwrap();
        assert!(!info.is_default_branch);
        assert!(info.is_main_branch);
    }

    #[test]
    fn test_resolve_tag() {
        let resolver = RefResolver::new(Some("main"));
        let info = resolver.resolve(&ParsedRef::Tag("v1.2.3"), None).unwrap();
        assert_eq!(info.branch_name, "");
        assert_eq!(info.tag_name, "v1.2.3");
        assert!(!info.is_default_branch);
        assert!(!info.is_main_branch);
    }

    #[test]
    fn test_resolve_pull_request_uses_head_ref() {
        let resolver = RefResolver::new(Some("main"));
        let info = resolver
            .resolve(&ParsedRef::PullRequest(5), Some("feature-x"))
            .unwrap();
        assert_eq!(info.branch_name, "feature-x");
        assert!(!info.is_default_branch);

        assert_matches!(
            resolver.resolve(&ParsedRef::PullRequest(5), None),
            Err(Error::Config(_))
        );
    }

    #[test]
    fn test_unknown_default_branch() {
        let resolver = RefResolver::new(Some(""));
        let info = resolver.resolve(&ParsedRef::Branch("main"), None).unwrap();
        assert!(!info.is_default_branch);
        assert!(info.is_main_branch);
    }
}
