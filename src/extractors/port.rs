//! Port extractor

use crate::trace::{TraceParser, TraceStore};
use std::collections::BTreeSet;

/// Extracts the ports named by socket address structures in the trace
pub struct PortExtractor<'a> {
    parser: &'a dyn TraceParser,
}

impl<'a> PortExtractor<'a> {
    pub fn new(parser: &'a dyn TraceParser) -> Self {
        Self { parser }
    }

    /// Unique port numbers across all trace lines. Bind, connect, and
    /// listen are not distinguished; any appearance qualifies.
    pub fn extract(&self, store: &TraceStore) -> BTreeSet<String> {
        store
            .lines()
            .iter()
            .flat_map(|line| self.parser.socket_ports(line))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::StraceParser;

    fn store(lines: &[&str]) -> TraceStore {
        TraceStore::from_parts(lines.iter().map(|l| l.to_string()).collect(), Vec::new())
    }

    #[test]
    fn test_extracts_and_deduplicates_ports() {
        let parser = StraceParser::new();
        let store = store(&[
            r#"100   12:00:05 connect(3, {sa_family=AF_INET, sin_port=htons(5432), sin_addr=inet_addr("127.0.0.1")}, 16) = 0"#,
            "100   12:00:06 bind(4, {sa_family=AF_INET6, sin6_port=htons(8080), sin6_flowinfo=htonl(0)}, 28) = 0",
            r#"100   12:00:07 connect(5, {sa_family=AF_INET, sin_port=htons(5432), sin_addr=inet_addr("10.0.0.2")}, 16) = 0"#,
        ]);

        let ports = PortExtractor::new(&parser).extract(&store);
        assert_eq!(
            ports,
            BTreeSet::from(["5432".to_string(), "8080".to_string()])
        );
    }

    #[test]
    fn test_empty_trace_yields_no_ports() {
        let parser = StraceParser::new();
        let ports = PortExtractor::new(&parser).extract(&TraceStore::default());

        assert!(ports.is_empty());
    }
}
