//! Raw trace store
//!
//! Deduplicated trace lines plus the deduplicated list of existing paths
//! they reference. Both load once; every downstream derivation treats the
//! store as immutable. A missing or empty trace log yields an empty store,
//! never an error.

use crate::fs::FileSystem;
use crate::trace::TraceParser;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

/// Deduplicated trace lines and the existing paths they reference
#[derive(Debug, Clone, Default)]
pub struct TraceStore {
    lines: Vec<String>,
    paths: Vec<String>,
}

impl TraceStore {
    /// Load the store from the trace log, regenerating the paths cache when
    /// it is missing or `refresh` is set. The paths cache is overwritten,
    /// never appended, so re-runs are idempotent.
    ///
    /// `remote` marks a trace captured inside another container: path
    /// existence cannot be cheaply verified there, so any token beginning
    /// with a path separator is accepted instead.
    pub fn load<F: FileSystem>(
        fs: &F,
        parser: &dyn TraceParser,
        trace_log: &Path,
        paths_log: &Path,
        refresh: bool,
        remote: bool,
    ) -> Self {
        let lines = match fs.read_to_string(trace_log) {
            Ok(text) => dedup_preserving_order(text.lines()),
            Err(_) => {
                warn!(
                    "Trace log {} not readable, using empty trace",
                    trace_log.display()
                );
                Vec::new()
            }
        };

        let paths = if refresh || !fs.exists(paths_log) {
            let paths = existing_paths(fs, parser, &lines, remote);
            let mut text = paths.join("\n");
            if !text.is_empty() {
                text.push('\n');
            }
            if let Err(e) = fs.write(paths_log, &text) {
                warn!("Failed to write paths cache {}: {e:#}", paths_log.display());
            }
            paths
        } else {
            match fs.read_to_string(paths_log) {
                Ok(text) => dedup_preserving_order(text.lines().filter(|l| !l.is_empty())),
                Err(_) => Vec::new(),
            }
        };

        debug!(lines = lines.len(), paths = paths.len(), "Loaded trace store");
        Self { lines, paths }
    }

    /// Build a store from already-prepared lines and paths
    pub fn from_parts(lines: Vec<String>, paths: Vec<String>) -> Self {
        Self { lines, paths }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Path-like tokens across all lines, deduplicated, filtered to artifacts
/// that exist (locally) or that look absolute (remote traces)
fn existing_paths<F: FileSystem>(
    fs: &F,
    parser: &dyn TraceParser,
    lines: &[String],
    remote: bool,
) -> Vec<String> {
    let all_tokens: Vec<String> = lines
        .iter()
        .flat_map(|line| parser.path_tokens(line))
        .collect();
    let tokens = dedup_preserving_order(all_tokens.iter().map(String::as_str));

    tokens
        .into_iter()
        .filter(|token| {
            if remote {
                token.starts_with('/')
            } else {
                fs.exists(Path::new(token))
            }
        })
        .collect()
}

/// Deduplicate by value, keeping the first occurrence order. Stored line
/// order identifies the root invocation, so it must stay deterministic.
fn dedup_preserving_order<'a, I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        if seen.insert(item) {
            out.push(item.to_string());
        }
    }
    out
}
