//! Fuzz target: lenient decimal parsing of form fields
//!
//! - No panics on arbitrary UTF-8
//! - Result is always finite
//! - `,` and `.` parse identically
//!
//! cargo fuzz run fuzz_parse_decimal

#![no_main]

use boilernode::app::commands::parse_decimal;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = core::str::from_utf8(data) else {
        return;
    };

    let value = parse_decimal(raw);
    assert!(value.is_finite(), "parse_decimal({raw:?}) = {value}");

    let swapped = raw.replace('.', ",");
    assert_eq!(parse_decimal(&swapped).to_bits(), value.to_bits());
});
