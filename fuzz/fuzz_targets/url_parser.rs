//! Fuzz target for the connection URL parser.
//!
//! Feeds arbitrary strings through parsing and topology classification.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_url_parser
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use myriad_driver::classify;
use myriad_url::{MapEnvSource, UrlParser, UrlScheme, parse_query_params};
use std::sync::Arc;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    let _ = parse_query_params(input);

    let parser = UrlParser::new().with_env(Arc::new(MapEnvSource::new()));
    for scheme in UrlScheme::ALL {
        let url = format!("{}{}", scheme.prefix(), input);
        // errors are fine, panics are not
        if let Ok(Some(props)) = parser.parse(&url, None) {
            let _ = classify(scheme, &url, props);
        }
    }
});
