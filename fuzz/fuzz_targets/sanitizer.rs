#![no_main]
//! Fuzz testing for the sanitizer
//!
//! Any input either fails cleanly or comes out with no denied element, no
//! disallowed attribute, no dangerous URI and no event handler, and
//! sanitizing the output again changes nothing.

use libfuzzer_sys::fuzz_target;
use quill_parser::{HtmlSanitizer, OutputMode, Sanitized};
use quill_security::SanitizerPolicy;

fuzz_target!(|data: &[u8]| {
    // Skip excessively large inputs to prevent timeout
    if data.len() > 50_000 {
        return;
    }

    let sanitizer = HtmlSanitizer::default();
    let once = match sanitizer.sanitize_bytes(data, OutputMode::Html) {
        Ok(Sanitized::Html(html)) => html,
        Ok(Sanitized::Fragment(_)) => panic!("asked for markup, got a tree"),
        Err(_) => return,
    };

    let twice = sanitizer
        .sanitize_html(&once)
        .expect("sanitized output must parse again");
    assert_eq!(once, twice, "sanitizing is not idempotent");

    let policy = SanitizerPolicy::standard();
    let dom = sanitizer
        .sanitize_to_fragment(&once)
        .expect("sanitized output must parse again")
        .into_dom();
    for handle in dom.descendants() {
        let node = handle.read().expect("node lock poisoned");
        let element = match node.as_element() {
            Some(element) => element,
            None => continue,
        };
        assert!(!policy.is_denied_tag(element.local_name()));
        for attr in &element.attributes {
            let name = attr.qualified_name();
            assert!(policy.is_allowed_attribute(&name), "{} survived", name);
            assert!(!policy.is_event_handler_attribute(&name));
            if policy.is_uri_bearing(&name) {
                assert!(!policy.is_dangerous_uri_value(&attr.value));
            }
        }
    }
});
