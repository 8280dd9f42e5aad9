//! Process extractor
//!
//! Reconstructs the invocations the traced target launched itself. Direct
//! children are identified by the termination signals the root process
//! received; anything deeper in the process tree is attributed to the tool
//! that spawned it, not to the target.

use crate::trace::{TraceParser, TraceStore};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

/// One execve-style invocation: owning pid plus ordered argument vector
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationRecord {
    pub pid: u32,
    pub argv: Vec<String>,
}

impl InvocationRecord {
    /// Stand-in returned when no invocation matched, so callers can treat
    /// "no scripts" uniformly
    pub fn placeholder() -> Self {
        Self {
            pid: 0,
            argv: Vec::new(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.argv.is_empty()
    }

    pub fn program(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }
}

/// Extracts invocations attributable to the traced root process
pub struct ProcessExtractor<'a> {
    parser: &'a dyn TraceParser,
}

impl<'a> ProcessExtractor<'a> {
    pub fn new(parser: &'a dyn TraceParser) -> Self {
        Self { parser }
    }

    /// Invocations launched directly by the traced root, optionally
    /// restricted to one program name. The root is the pid of the very
    /// first invocation event; its direct children are the senders of the
    /// termination signals it received. Returns a single placeholder when
    /// nothing matches.
    pub fn extract(&self, store: &TraceStore, program: Option<&str>) -> Vec<InvocationRecord> {
        let invocations = self.invocations(store);
        let root = match invocations.first() {
            Some(first) => first.pid,
            None => return vec![InvocationRecord::placeholder()],
        };

        let children = self.direct_children(store, root);
        debug!(root, children = children.len(), "Attributing invocations");

        let matched: Vec<InvocationRecord> = invocations
            .into_iter()
            .filter(|inv| children.contains(&inv.pid))
            .filter(|inv| program.map_or(true, |p| inv.program() == Some(p)))
            .collect();

        if matched.is_empty() {
            vec![InvocationRecord::placeholder()]
        } else {
            matched
        }
    }

    /// All invocation events in stored line order
    fn invocations(&self, store: &TraceStore) -> Vec<InvocationRecord> {
        store
            .lines()
            .iter()
            .filter_map(|line| self.parser.exec_event(line))
            .map(|event| InvocationRecord {
                pid: event.pid,
                argv: event.argv,
            })
            .collect()
    }

    /// Pids that signalled their termination to `root`
    fn direct_children(&self, store: &TraceStore, root: u32) -> BTreeSet<u32> {
        store
            .lines()
            .iter()
            .filter_map(|line| self.parser.child_signal(line))
            .filter(|signal| signal.reporter == root)
            .map(|signal| signal.sender)
            .collect()
    }
}
