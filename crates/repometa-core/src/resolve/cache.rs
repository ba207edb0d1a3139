//! Cache-Key Generator

use crate::types::CacheKeys;

/// Deterministic cache keys from repository identity, ref and commit.
///
/// `key = owner-name-ref-sha_short`, `restore_key = owner-name-ref-`.
/// No time or random component: equal inputs give equal keys.
pub fn generate(owner: &str, name: &str, ref_name: &str, sha_short: &str) -> CacheKeys {
    let restore_key = format!("{}-", [owner, name, ref_name].join("-"));
    let key = format!("{}{}", restore_key, sha_short);
    CacheKeys { key, restore_key }
}
