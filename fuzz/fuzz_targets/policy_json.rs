#![no_main]
//! Fuzz testing for policy loading
//!
//! Policy JSON either fails validation or yields a policy that never admits
//! an event handler and whose queries never panic.

use libfuzzer_sys::fuzz_target;
use quill_security::SanitizerPolicy;

fuzz_target!(|data: &[u8]| {
    let json = match std::str::from_utf8(data) {
        Ok(json) => json,
        Err(_) => return,
    };

    let policy = match SanitizerPolicy::from_json(json) {
        Ok(policy) => policy,
        Err(_) => return,
    };

    for name in ["onclick", "onload", "ONERROR", "on-x"] {
        if policy.is_event_handler_attribute(name) {
            assert!(!policy.is_allowed_attribute(name), "{} admitted", name);
        }
    }
    let _ = policy.is_dangerous_uri_value(json);
    let _ = policy.to_json();
});
