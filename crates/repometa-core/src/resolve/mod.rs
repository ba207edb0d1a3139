//! Pure normalisation rules: event classification, ref resolution, cache keys

pub mod cache;
pub mod event;
pub mod refs;

pub use event::{is_version_tag, EventClassifier};
pub use refs::{ParsedRef, RefResolver};

/// Length of `commit.sha_short`
pub const SHORT_SHA_LEN: usize = 7;

/// First seven characters of a commit SHA
#[inline]
pub fn short_sha(sha: &str) -> &str {
    // SHAs are ASCII hex, so byte slicing is on a char boundary
    sha.get(..SHORT_SHA_LEN).unwrap_or(sha)
}

/// First line of a commit message, trailing whitespace trimmed
#[inline]
pub fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or("").trim_end()
}
