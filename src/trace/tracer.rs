//! External tracer invocation
//!
//! One blocking strace run against the target, locally or inside a remote
//! container. Tracer failure degrades to an empty or partial trace; the
//! extractors reflect whatever data exists.

use crate::containers::ContainerRuntime;
use crate::fs::FileSystem;
use anyhow::Result;
use std::path::Path;
use tokio::process::Command;
use tracing::{info, warn};

/// strace argument vector for tracing `target`, one event per line written
/// to `output`: follow forks, decode descriptors to paths, file and network
/// calls, successful calls only, unbounded string arguments.
pub fn strace_args(target: &Path, output: &Path, string_limit: u32) -> Vec<String> {
    vec![
        "--follow-forks".to_string(),
        "--decode-fds=path".to_string(),
        "--trace=%file,%net".to_string(),
        "--successful-only".to_string(),
        format!("--string-limit={string_limit}"),
        format!("--output={}", output.display()),
        "bash".to_string(),
        target.display().to_string(),
    ]
}

/// Run the tracer locally, blocking until the target exits
pub async fn capture_local(target: &Path, trace_log: &Path, string_limit: u32) -> Result<()> {
    info!("Tracing {} with strace", target.display());
    let status = Command::new("strace")
        .args(strace_args(target, trace_log, string_limit))
        .status()
        .await;

    match status {
        Ok(status) if status.success() => {}
        Ok(status) => warn!("strace exited with {status}; continuing with partial trace"),
        Err(e) => warn!("Failed to run strace: {e}; continuing with empty trace"),
    }
    Ok(())
}

/// Run the tracer inside `container` and mirror the trace log locally, so
/// the store loads it like any cached log
pub async fn capture_remote<F: FileSystem>(
    fs: &F,
    runtime: &dyn ContainerRuntime,
    container: &str,
    target: &Path,
    trace_log: &Path,
    string_limit: u32,
) -> Result<()> {
    info!("Tracing {} inside container {container}", target.display());
    let mut cmd = vec!["strace".to_string()];
    cmd.extend(strace_args(target, trace_log, string_limit));
    if let Err(e) = runtime.exec_capture(container, &cmd).await {
        warn!("Remote trace failed: {e}; continuing with empty trace");
        return Ok(());
    }

    let fetch = vec!["cat".to_string(), trace_log.display().to_string()];
    match runtime.exec_capture(container, &fetch).await {
        Ok(text) => fs.write(trace_log, &text)?,
        Err(e) => warn!("Failed to fetch remote trace log: {e}"),
    }
    Ok(())
}
