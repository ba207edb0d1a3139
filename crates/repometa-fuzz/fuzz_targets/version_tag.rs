#![no_main]
use libfuzzer_sys::fuzz_target;
use repometa_core::resolve::is_version_tag;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if is_version_tag(s) {
            assert!(s.starts_with('v'));
            assert!(s[1..].bytes().all(|b| b.is_ascii_digit() || b == b'.'));
        }
    }
});
