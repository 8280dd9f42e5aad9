//! Requirement resolver
//!
//! Surfaces installed third-party packages that the trace proves were
//! imported but that the declared requirements document does not list.
//! Resolution is a set difference against the declared names, never a
//! union; the point is to report only what is missing.
//!
//! The installed registry is fetched once from the package manager and
//! injected, so resolution itself needs no interpreter state. Candidates
//! with no installed counterpart (stdlib modules, data files) are silently
//! dropped.

use crate::containers::ContainerRuntime;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use tokio::process::Command;
use tracing::{debug, warn};

/// Ordered module search roots: the runtime's own search path plus the
/// user-site directories
#[derive(Debug, Clone, Default)]
pub struct ModuleRoots {
    roots: Vec<String>,
}

impl ModuleRoots {
    pub fn new(roots: Vec<String>) -> Self {
        Self {
            roots: roots.into_iter().filter(|r| !r.is_empty()).collect(),
        }
    }

    /// Parse the JSON array emitted by the interpreter probe; empty on
    /// malformed input
    pub fn from_json(text: &str) -> Self {
        match serde_json::from_str::<Vec<String>>(text.trim()) {
            Ok(roots) => Self::new(roots),
            Err(_) => Self::default(),
        }
    }

    /// Interpreter one-liner that dumps the search roots as a JSON array
    pub fn probe_snippet() -> &'static str {
        "import sys, site, json; print(json.dumps(sys.path + [site.USER_BASE, site.USER_SITE]))"
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Module candidate for `path`: the segment immediately after the first
    /// matching root (in search order), extension stripped. First match wins
    /// per path; an empty remainder yields no candidate.
    pub fn candidate(&self, path: &str) -> Option<String> {
        for root in &self.roots {
            if let Some(rest) = path.strip_prefix(root.as_str()) {
                let segment = rest.trim_start_matches('/').split('/').next().unwrap_or("");
                let name = segment.split('.').next().unwrap_or("");
                if name.is_empty() {
                    return None;
                }
                return Some(name.to_string());
            }
        }
        None
    }
}

/// Installed name→version pairs from the package manager, fetched once
#[derive(Debug, Clone, Default)]
pub struct PackageRegistry {
    packages: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct PipListEntry {
    name: String,
    version: String,
}

impl PackageRegistry {
    pub fn new(packages: BTreeMap<String, String>) -> Self {
        Self { packages }
    }

    /// Parse `pip list --format=json` output; empty on malformed input
    pub fn from_pip_json(text: &str) -> Self {
        let entries: Vec<PipListEntry> = serde_json::from_str(text.trim()).unwrap_or_default();
        Self {
            packages: entries.into_iter().map(|e| (e.name, e.version)).collect(),
        }
    }

    pub fn version_of(&self, name: &str) -> Option<&str> {
        self.packages.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

/// Parse a declared-requirements document: `name==version` per line,
/// comments and malformed lines skipped
pub fn parse_declared(text: &str) -> BTreeMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            line.split_once("==")
                .map(|(name, version)| (name.trim().to_string(), version.trim().to_string()))
        })
        .collect()
}

/// Resolves undeclared third-party requirements from path evidence
pub struct RequirementResolver {
    roots: ModuleRoots,
    registry: PackageRegistry,
    declared: BTreeMap<String, String>,
}

impl RequirementResolver {
    pub fn new(
        roots: ModuleRoots,
        registry: PackageRegistry,
        declared: BTreeMap<String, String>,
    ) -> Self {
        Self {
            roots,
            registry,
            declared,
        }
    }

    /// Installed packages evidenced by `paths` and absent from the declared
    /// set
    pub fn resolve(&self, paths: &[String]) -> BTreeMap<String, String> {
        let mut candidates = BTreeSet::new();
        for path in paths {
            if let Some(name) = self.roots.candidate(path) {
                candidates.insert(name);
            }
        }

        let mut resolved = BTreeMap::new();
        for name in candidates {
            if self.declared.contains_key(&name) {
                continue;
            }
            match self.registry.version_of(&name) {
                Some(version) => {
                    resolved.insert(name, version.to_string());
                }
                None => debug!("Dropping candidate {name}: not in the installed registry"),
            }
        }
        resolved
    }
}

/// Fetch the local interpreter's module search roots; empty on any failure
pub async fn local_module_roots(python: &str) -> ModuleRoots {
    match Command::new(python)
        .args(["-c", ModuleRoots::probe_snippet()])
        .output()
        .await
    {
        Ok(out) if out.status.success() => {
            ModuleRoots::from_json(&String::from_utf8_lossy(&out.stdout))
        }
        Ok(out) => {
            warn!("{python} search-root probe exited with {}", out.status);
            ModuleRoots::default()
        }
        Err(e) => {
            warn!("Failed to run {python}: {e}");
            ModuleRoots::default()
        }
    }
}

/// Fetch the local installed-package registry; empty on any failure
pub async fn local_installed_packages(python: &str) -> PackageRegistry {
    match Command::new(python)
        .args(["-m", "pip", "list", "--format=json"])
        .output()
        .await
    {
        Ok(out) if out.status.success() => {
            PackageRegistry::from_pip_json(&String::from_utf8_lossy(&out.stdout))
        }
        Ok(out) => {
            warn!("pip list exited with {}", out.status);
            PackageRegistry::default()
        }
        Err(e) => {
            warn!("Failed to run {python} -m pip: {e}");
            PackageRegistry::default()
        }
    }
}

/// Fetch the search roots of the interpreter inside `container`
pub async fn remote_module_roots(
    runtime: &dyn ContainerRuntime,
    container: &str,
    python: &str,
) -> ModuleRoots {
    let cmd = vec![
        python.to_string(),
        "-c".to_string(),
        ModuleRoots::probe_snippet().to_string(),
    ];
    match runtime.exec_capture(container, &cmd).await {
        Ok(text) => ModuleRoots::from_json(&text),
        Err(e) => {
            warn!("Remote search-root probe failed: {e}");
            ModuleRoots::default()
        }
    }
}

/// Fetch the installed-package registry of `container`
pub async fn remote_installed_packages(
    runtime: &dyn ContainerRuntime,
    container: &str,
    python: &str,
) -> PackageRegistry {
    let cmd = vec![
        python.to_string(),
        "-m".to_string(),
        "pip".to_string(),
        "list".to_string(),
        "--format=json".to_string(),
    ];
    match runtime.exec_capture(container, &cmd).await {
        Ok(text) => PackageRegistry::from_pip_json(&text),
        Err(e) => {
            warn!("Remote pip list failed: {e}");
            PackageRegistry::default()
        }
    }
}
