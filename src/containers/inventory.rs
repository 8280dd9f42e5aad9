//! Container inventory
//!
//! Normalized view of the container runtime's listing, parsed either from a
//! pre-captured tilde-separated log (`id~name~image~ports`) or from a live
//! query.

use bollard::models::{ContainerSummary, Port};
use serde::{Serialize, Serializer};
use std::fmt;

/// A published or internal port mapping, rendered `hostPort:containerPort`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMapping {
    pub host: Option<String>,
    pub container: String,
}

impl PortMapping {
    /// Parse one entry of the runtime's ports column.
    /// `0.0.0.0:5432->5432/tcp` → `5432:5432`; `6379/tcp` → `None:6379`.
    pub fn parse(entry: &str) -> Option<Self> {
        let entry = entry.trim();
        if entry.is_empty() {
            return None;
        }
        let (published, internal) = match entry.split_once("->") {
            Some((lhs, rhs)) => (Some(lhs), rhs),
            None => (None, entry),
        };
        let container = proto_stripped(internal);
        if container.is_empty() {
            return None;
        }
        let host = published.map(|addr| addr.rsplit(':').next().unwrap_or(addr).to_string());
        Some(Self {
            host,
            container: container.to_string(),
        })
    }
}

fn proto_stripped(entry: &str) -> &str {
    entry.split('/').next().unwrap_or(entry)
}

impl fmt::Display for PortMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            self.host.as_deref().unwrap_or("None"),
            self.container
        )
    }
}

impl Serialize for PortMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<Port> for PortMapping {
    fn from(port: Port) -> Self {
        Self {
            host: port.public_port.map(|p| p.to_string()),
            container: port.private_port.to_string(),
        }
    }
}

/// One container from the runtime inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Container {
    pub id: String,
    pub name: String,
    pub image: String,
    pub ports: Vec<PortMapping>,
}

impl Container {
    /// Sentinel for "not containerized" or "no matching container"
    pub fn none() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            image: String::new(),
            ports: Vec::new(),
        }
    }

    pub fn is_none(&self) -> bool {
        self.id.is_empty()
    }
}

impl From<ContainerSummary> for Container {
    fn from(summary: ContainerSummary) -> Self {
        let name = summary
            .names
            .unwrap_or_default()
            .first()
            .map(|n| n.trim_start_matches('/').to_string())
            .unwrap_or_default();
        let ports = summary
            .ports
            .unwrap_or_default()
            .into_iter()
            .map(PortMapping::from)
            .collect();
        Self {
            id: summary.id.unwrap_or_default(),
            name,
            image: summary.image.unwrap_or_default(),
            ports,
        }
    }
}

/// The visible set of running containers
#[derive(Debug, Clone, Default)]
pub struct ContainerInventory {
    containers: Vec<Container>,
}

impl ContainerInventory {
    pub fn new(containers: Vec<Container>) -> Self {
        Self { containers }
    }

    /// Parse a captured inventory log: one `id~name~image~ports` line per
    /// container, ports comma-separated. Malformed lines are skipped.
    pub fn parse_log(text: &str) -> Self {
        Self {
            containers: text.lines().filter_map(parse_line).collect(),
        }
    }

    pub fn containers(&self) -> &[Container] {
        &self.containers
    }

    /// Container matching `id` by prefix in either direction: cgroups carry
    /// the full 64-hex id while inventories often carry the short form
    pub fn by_id_prefix(&self, id: &str) -> Option<&Container> {
        if id.is_empty() {
            return None;
        }
        self.containers
            .iter()
            .find(|c| c.id.starts_with(id) || id.starts_with(c.id.as_str()))
    }
}

fn parse_line(line: &str) -> Option<Container> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let mut fields = line.splitn(4, '~');
    let id = fields.next()?.to_string();
    let name = fields.next()?.to_string();
    let image = fields.next()?.to_string();
    let ports = fields
        .next()
        .map(|field| field.split(',').filter_map(PortMapping::parse).collect())
        .unwrap_or_default();
    if id.is_empty() {
        return None;
    }
    Some(Container {
        id,
        name,
        image,
        ports,
    })
}
