//! Structured fuzzing for multi-host URLs.
//!
//! Generates host lists mixing plain tokens and `address=(...)` descriptors
//! and checks that every accepted URL keeps its host count.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_url_structured
//! ```

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use myriad_url::{MapEnvSource, UrlParser, UrlScheme, keys};
use std::sync::Arc;

/// A generated host token.
#[derive(Debug, Arbitrary)]
enum FuzzHost {
    Plain { name: String, port: Option<u16> },
    Descriptor { name: String, port: u16, master: bool },
}

impl FuzzHost {
    fn render(&self) -> String {
        match self {
            Self::Plain { name, port: Some(port) } => format!("{}:{}", host_name(name), port),
            Self::Plain { name, port: None } => host_name(name),
            Self::Descriptor { name, port, master } => format!(
                "address=(host={})(port={})(type={})",
                clean(name),
                port,
                if *master { "master" } else { "slave" }
            ),
        }
    }
}

/// A generated connection URL.
#[derive(Debug, Arbitrary)]
struct FuzzUrl {
    scheme: u8,
    hosts: Vec<FuzzHost>,
    database: Option<String>,
    params: Vec<(String, String)>,
}

impl FuzzUrl {
    fn scheme(&self) -> UrlScheme {
        UrlScheme::ALL[self.scheme as usize % UrlScheme::ALL.len()]
    }

    fn render(&self) -> String {
        let hosts: Vec<_> = self.hosts.iter().map(FuzzHost::render).collect();
        let mut url = format!("{}{}", self.scheme().prefix(), hosts.join(","));
        if let Some(database) = &self.database {
            url.push('/');
            url.push_str(&clean(database));
        }
        let params: Vec<_> = self
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", clean(k), clean(v)))
            .collect();
        if !params.is_empty() {
            url.push('?');
            url.push_str(&params.join("&"));
        }
        url
    }
}

/// A trailing empty token would be dropped by the splitter.
fn host_name(raw: &str) -> String {
    let name = clean(raw);
    if name.is_empty() { "h".to_string() } else { name }
}

/// Keep generated names free of URL separators.
fn clean(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect()
}

fuzz_target!(|input: FuzzUrl| {
    let url = input.render();
    let parser = UrlParser::new().with_env(Arc::new(MapEnvSource::new()));

    if let Ok(Some(props)) = parser.parse(&url, None) {
        let expected = input.hosts.len().max(1);
        assert_eq!(props.host_count().ok(), Some(expected), "url: {}", url);
    }
});
