//! Runtime version extractor

use regex::Regex;
use std::collections::BTreeSet;

/// Extracts runtime version markers from the existing-path list
pub struct VersionExtractor {
    marker: Regex,
}

impl VersionExtractor {
    pub fn new() -> Self {
        Self {
            marker: Regex::new(r"/python([^/]+)/").expect("static pattern"),
        }
    }

    /// Unique version tokens found between `/python` and the next path
    /// separator. A token qualifies when it starts with a digit and is
    /// either a bare major version or continues with a dot (`3`, `3.11`;
    /// not `lib`, not `3abc`).
    pub fn extract(&self, paths: &[String]) -> BTreeSet<String> {
        let mut versions = BTreeSet::new();
        for path in paths {
            for cap in self.marker.captures_iter(path) {
                let token = &cap[1];
                if is_version(token) {
                    versions.insert(token.to_string());
                }
            }
        }
        versions
    }
}

impl Default for VersionExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn is_version(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => matches!(chars.next(), None | Some('.')),
        _ => false,
    }
}
