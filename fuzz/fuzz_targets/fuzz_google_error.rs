//! Fuzz target: Google error body parsing.
//!
//! Whatever Google (or a proxy in front of it) returns must map to a
//! `VendorError` without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use relay_sheets::google::parse_vendor_error;
use reqwest::StatusCode;

fuzz_target!(|data: &[u8]| {
    let err = parse_vendor_error(StatusCode::BAD_REQUEST, data);
    assert!(err.code.is_some(), "the HTTP status is always recorded");
});
