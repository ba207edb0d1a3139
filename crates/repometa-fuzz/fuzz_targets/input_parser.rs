#![no_main]
use libfuzzer_sys::fuzz_target;
use repometa_core::env::reader::{parse_repository, parse_sha};
use repometa_core::{ArtifactFormat, ChangeDetection};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(formats) = ArtifactFormat::parse_list(s) {
            assert!(!formats.is_empty());
            assert!(formats.len() <= 2);
        }
        let _ = ChangeDetection::parse(s);
        if let Ok((owner, name)) = parse_repository(s) {
            assert_eq!(format!("{}/{}", owner, name), s);
        }
        if let Ok(sha) = parse_sha(s) {
            assert_eq!(sha.len(), 40);
        }
    }
});
