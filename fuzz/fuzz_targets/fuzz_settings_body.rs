//! Fuzz target: `api::parse_settings` + `Policy::apply_update`
//!
//! Feeds arbitrary bytes as a POST /api/settings body and asserts that
//! parsing never panics and that whatever it yields can never leave the
//! policy with a non-finite or non-positive threshold.
//!
//! cargo fuzz run fuzz_settings_body

#![no_main]

use libfuzzer_sys::fuzz_target;
use swrguard::api::{parse_settings, MAX_BODY_LEN};
use swrguard::policy::Policy;

fuzz_target!(|data: &[u8]| {
    let Ok(partial) = parse_settings(data) else {
        return;
    };
    assert!(data.len() <= MAX_BODY_LEN, "oversized body was accepted");

    let mut policy = Policy::default();
    let _ = policy.apply_update(&partial);
    assert!(policy.is_valid(), "update produced {:?}", policy);
});
