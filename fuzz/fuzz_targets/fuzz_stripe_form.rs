//! Fuzz target: bracket-notation form decoding and re-encoding.
//!
//! Arbitrary `key=value&...` input is unflattened into JSON and flattened
//! back. Neither direction may panic or overflow the stack. A decoded body is
//! always an object unless a key nests too deeply.

#![no_main]

use libfuzzer_sys::fuzz_target;
use relay_billing::stripe::form::{flatten, unflatten};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let pairs: Vec<(String, String)> = text
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (k.to_owned(), v.to_owned()),
            None => (pair.to_owned(), String::new()),
        })
        .collect();

    let Ok(value) = unflatten(&pairs) else {
        return;
    };
    assert!(value.is_object(), "decoded form must be an object");
    assert!(flatten(&value).is_ok(), "an object always flattens");
});
