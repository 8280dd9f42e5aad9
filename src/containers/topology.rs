//! Container topology resolver
//!
//! Places the traced job inside the container inventory and identifies the
//! service containers it depends on. Exec references are precise; shared
//! published ports are best-effort and can false-positive across unrelated
//! runs on the same port.

use super::{Container, ContainerInventory};
use crate::extractors::InvocationRecord;
use crate::fs::FileSystem;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

const CGROUP_PATH: &str = "/proc/self/cgroup";

/// Resolves the job container and its service containers
pub struct TopologyResolver<'a> {
    inventory: &'a ContainerInventory,
}

impl<'a> TopologyResolver<'a> {
    pub fn new(inventory: &'a ContainerInventory) -> Self {
        Self { inventory }
    }

    /// The container this process runs in. Returns the empty sentinel when
    /// the cgroup carries no container id or nothing in the inventory
    /// matches; at most one container can match.
    pub fn job_container<F: FileSystem>(&self, fs: &F) -> Container {
        let contents = match fs.read_to_string(Path::new(CGROUP_PATH)) {
            Ok(contents) => contents,
            Err(_) => return Container::none(),
        };
        self.job_container_from_cgroup(&contents)
    }

    /// Inventory match for the given cgroup membership contents
    pub fn job_container_from_cgroup(&self, contents: &str) -> Container {
        match cgroup_container_id(contents) {
            Some(id) => match self.inventory.by_id_prefix(&id) {
                Some(container) => container.clone(),
                None => {
                    debug!("Cgroup id {id} matches no inventory container");
                    Container::none()
                }
            },
            None => Container::none(),
        }
    }

    /// Containers the job depends on: exec-referenced by id or name, or
    /// sharing a published host port with the observed port set
    pub fn service_containers(
        &self,
        job: &Container,
        invocations: &[InvocationRecord],
        ports: &BTreeSet<String>,
    ) -> Vec<Container> {
        self.inventory
            .containers()
            .iter()
            .filter(|c| c.id != job.id)
            .filter(|c| exec_referenced(c, invocations) || port_shared(c, ports))
            .cloned()
            .collect()
    }
}

fn exec_referenced(container: &Container, invocations: &[InvocationRecord]) -> bool {
    invocations
        .iter()
        .filter(|inv| inv.argv.iter().any(|arg| arg == "exec"))
        .any(|inv| {
            inv.argv.iter().any(|arg| {
                arg == &container.id || (!container.name.is_empty() && arg == &container.name)
            })
        })
}

fn port_shared(container: &Container, ports: &BTreeSet<String>) -> bool {
    container
        .ports
        .iter()
        .filter_map(|mapping| mapping.host.as_ref())
        .any(|host| ports.contains(host))
}

/// Container id embedded in the cgroup membership, if any. Covers plain
/// 64-hex path segments and systemd `docker-<id>.scope` forms.
pub fn cgroup_container_id(contents: &str) -> Option<String> {
    let hex = Regex::new(r"[0-9a-f]{64}").expect("static pattern");
    contents
        .lines()
        .find_map(|line| hex.find(line).map(|m| m.as_str().to_string()))
}
