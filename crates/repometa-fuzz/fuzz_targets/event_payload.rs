#![no_main]
use libfuzzer_sys::fuzz_target;
use repometa_core::aggregate::payload_repository_details;
use repometa_core::env::EventPayload;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(payload) = EventPayload::from_json(s) {
            let _ = payload.pull_request_is_fork();
            let _ = payload_repository_details(&payload);
        }
    }
});
