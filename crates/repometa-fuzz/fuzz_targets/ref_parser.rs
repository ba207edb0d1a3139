#![no_main]
use libfuzzer_sys::fuzz_target;
use repometa_core::resolve::{ParsedRef, RefResolver};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        for ref_type in [None, Some("branch"), Some("tag")] {
            if let Ok(parsed) = ParsedRef::parse(s, ref_type) {
                let resolver = RefResolver::new(Some("main"));
                if let Ok(info) = resolver.resolve(&parsed, Some("feature")) {
                    // Exactly one of branch/tag is set
                    assert!(info.branch_name.is_empty() != info.tag_name.is_empty());
                }
            }
        }
    }
});
