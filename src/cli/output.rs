//! Profile output formatting

use crate::containers::Container;
use crate::profile::DependencyProfile;
use anyhow::Result;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
    Human,
}

/// Render the profile in the requested format
pub fn render(profile: &DependencyProfile, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(profile)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(profile)?),
        OutputFormat::Human => Ok(render_human(profile)),
    }
}

fn render_human(profile: &DependencyProfile) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Runtime versions:");
    if profile.versions.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for version in &profile.versions {
        let _ = writeln!(out, "  {version}");
    }

    let _ = writeln!(out, "Undeclared requirements:");
    if profile.requirements.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for (name, version) in &profile.requirements {
        let _ = writeln!(out, "  {name}=={version}");
    }

    let _ = writeln!(out, "Scripts:");
    let scripts: Vec<&crate::extractors::InvocationRecord> = profile
        .scripts
        .iter()
        .filter(|record| !record.is_placeholder())
        .collect();
    if scripts.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for record in scripts {
        let _ = writeln!(out, "  [{}] {}", record.pid, record.argv.join(" "));
    }

    let _ = writeln!(out, "Ports:");
    if profile.ports.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for port in &profile.ports {
        let _ = writeln!(out, "  {port}");
    }

    let _ = writeln!(out, "Job container:");
    if profile.job_container.is_none() {
        let _ = writeln!(out, "  (none)");
    } else {
        let _ = writeln!(out, "{}", render_container(&profile.job_container));
    }

    let _ = writeln!(out, "Service containers:");
    if profile.service_containers.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for container in &profile.service_containers {
        let _ = writeln!(out, "{}", render_container(container));
    }

    out
}

fn render_container(container: &Container) -> String {
    let ports: Vec<String> = container.ports.iter().map(|p| p.to_string()).collect();
    format!(
        "  {} ({}) ports: [{}]",
        container.name,
        container.image,
        ports.join(", ")
    )
}
