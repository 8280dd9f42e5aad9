//! Command handlers
//!
//! Thin orchestration over the inference core: run or reuse the trace,
//! derive each facet in order, assemble the profile, emit the requested
//! outputs. Inference never fails on partial data; a nonzero exit code only
//! reflects output or configuration errors.

use crate::cli::commands::{ProfileArgs, TraceArgs};
use crate::cli::output;
use crate::config::DeptraceConfig;
use crate::containers::{ContainerInventory, ContainerRuntime, DockerRuntime, TopologyResolver};
use crate::extractors::{
    requirements, PortExtractor, ProcessExtractor, RequirementResolver, VersionExtractor,
};
use crate::fs::{FileSystem, StdFileSystem};
use crate::profile::DependencyProfile;
use crate::trace::{tracer, StraceParser, TraceStore};
use anyhow::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

const DEFAULT_TARGET: &str = "target.sh";

pub async fn handle_profile(args: &ProfileArgs) -> i32 {
    match run_profile(args).await {
        Ok(()) => 0,
        Err(e) => {
            error!("Profile failed: {e:#}");
            1
        }
    }
}

pub async fn handle_trace(args: &TraceArgs) -> i32 {
    match run_trace(args).await {
        Ok(()) => 0,
        Err(e) => {
            error!("Trace failed: {e:#}");
            1
        }
    }
}

async fn run_profile(args: &ProfileArgs) -> Result<()> {
    let config = DeptraceConfig::default();
    config.validate()?;

    let fs = StdFileSystem;
    let parser = StraceParser::new();

    let target = args
        .target
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TARGET));
    let trace_log = args.trace_log.clone().unwrap_or_else(|| config.trace_log.clone());
    let paths_log = args.paths_log.clone().unwrap_or_else(|| config.paths_log.clone());

    let remote = args.container.as_deref();
    let runtime = connect_runtime(remote.is_some() || args.inventory_log.is_none());

    ensure_trace(
        &fs,
        &config,
        runtime.as_ref(),
        remote,
        &target,
        &trace_log,
        args.new_trace,
    )
    .await?;

    let store = TraceStore::load(
        &fs,
        &parser,
        &trace_log,
        &paths_log,
        args.new_trace,
        remote.is_some(),
    );

    // Search roots and installed registry come from wherever the trace ran.
    let (roots, registry) = match (remote, runtime.as_ref()) {
        (Some(container), Some(rt)) => (
            requirements::remote_module_roots(rt, container, &config.python).await,
            requirements::remote_installed_packages(rt, container, &config.python).await,
        ),
        _ => (
            requirements::local_module_roots(&config.python).await,
            requirements::local_installed_packages(&config.python).await,
        ),
    };

    let declared = match &args.requirements {
        Some(path) => match fs.read_to_string(path) {
            Ok(text) => requirements::parse_declared(&text),
            Err(_) => {
                warn!(
                    "Declared requirements {} not readable; treating as empty",
                    path.display()
                );
                BTreeMap::new()
            }
        },
        None => BTreeMap::new(),
    };

    let versions = VersionExtractor::new().extract(store.paths());
    let resolved = RequirementResolver::new(roots, registry, declared).resolve(store.paths());
    let scripts = ProcessExtractor::new(&parser).extract(&store, args.script.as_deref());
    let ports = PortExtractor::new(&parser).extract(&store);

    let inventory = load_inventory(&fs, args.inventory_log.as_deref(), runtime.as_ref()).await;
    let topology = TopologyResolver::new(&inventory);
    let job_container = topology.job_container(&fs);
    let service_containers = topology.service_containers(&job_container, &scripts, &ports);

    let profile = DependencyProfile::assemble(
        versions,
        resolved,
        scripts,
        ports,
        job_container,
        service_containers,
    );
    if profile.is_empty() {
        warn!("Trace produced an empty profile");
    }

    if let Some(path) = &args.write_requirements {
        profile.write_requirements(&fs, path)?;
        info!("Wrote requirements to {}", path.display());
    }
    if let Some(path) = &args.summary_log {
        fs.write(path, &profile.summary_log(store.lines()))?;
        info!("Wrote summary log to {}", path.display());
    }

    let rendered = output::render(&profile, args.format.into())?;
    match &args.output {
        Some(path) => fs.write(path, &rendered)?,
        None => println!("{rendered}"),
    }
    Ok(())
}

async fn run_trace(args: &TraceArgs) -> Result<()> {
    let config = DeptraceConfig::default();
    config.validate()?;

    let fs = StdFileSystem;
    let parser = StraceParser::new();

    let target = args
        .target
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TARGET));
    let trace_log = args.trace_log.clone().unwrap_or_else(|| config.trace_log.clone());
    let paths_log = args.paths_log.clone().unwrap_or_else(|| config.paths_log.clone());

    let remote = args.container.as_deref();
    let runtime = connect_runtime(remote.is_some());

    ensure_trace(&fs, &config, runtime.as_ref(), remote, &target, &trace_log, true).await?;

    // Regenerate the paths cache alongside the fresh trace.
    let store = TraceStore::load(&fs, &parser, &trace_log, &paths_log, true, remote.is_some());
    info!(
        lines = store.lines().len(),
        paths = store.paths().len(),
        "Trace logs regenerated"
    );
    Ok(())
}

fn connect_runtime(needed: bool) -> Option<DockerRuntime> {
    if !needed {
        return None;
    }
    match DockerRuntime::connect() {
        Ok(runtime) => Some(runtime),
        Err(e) => {
            warn!("Container runtime unavailable: {e}");
            None
        }
    }
}

async fn ensure_trace(
    fs: &StdFileSystem,
    config: &DeptraceConfig,
    runtime: Option<&DockerRuntime>,
    remote: Option<&str>,
    target: &Path,
    trace_log: &Path,
    refresh: bool,
) -> Result<()> {
    if !refresh && fs.exists(trace_log) {
        return Ok(());
    }
    match (remote, runtime) {
        (Some(container), Some(rt)) => {
            tracer::capture_remote(fs, rt, container, target, trace_log, config.string_limit)
                .await?
        }
        (Some(_), None) => {
            warn!("Remote trace requested but runtime unavailable; continuing with empty trace")
        }
        (None, _) => tracer::capture_local(target, trace_log, config.string_limit).await?,
    }
    Ok(())
}

async fn load_inventory(
    fs: &StdFileSystem,
    inventory_log: Option<&Path>,
    runtime: Option<&DockerRuntime>,
) -> ContainerInventory {
    match inventory_log {
        Some(path) => match fs.read_to_string(path) {
            Ok(text) => ContainerInventory::parse_log(&text),
            Err(_) => {
                warn!(
                    "Inventory log {} not readable; treating as empty",
                    path.display()
                );
                ContainerInventory::default()
            }
        },
        None => match runtime {
            Some(rt) => match rt.list_containers().await {
                Ok(inventory) => inventory,
                Err(e) => {
                    warn!("Container listing failed: {e}");
                    ContainerInventory::default()
                }
            },
            None => ContainerInventory::default(),
        },
    }
}
