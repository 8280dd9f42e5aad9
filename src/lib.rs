//! deptrace - dependency profiling from system-call traces
//!
//! This library ingests a raw syscall trace captured while running a target
//! script (optionally inside a remote container) and derives a structured
//! dependency profile: runtime versions exercised, third-party package
//! requirements not yet declared, programs directly invoked by the target,
//! network ports it touched, and the container topology it depends on.
//!
//! # Core Concepts
//!
//! - **Trace Store**: deduplicated trace lines plus the existing filesystem
//!   paths they reference, loaded once from cache logs or regenerated by
//!   invoking the tracer
//! - **Extractors**: eager, side-effect-free derivations over the immutable
//!   store, one per profile facet
//! - **Container Topology**: placement of the traced job inside the runtime's
//!   container inventory, plus the service containers it depends on
//!
//! # Example Usage
//!
//! ```ignore
//! use deptrace::{ProcessExtractor, StraceParser, TraceStore, VersionExtractor};
//!
//! let parser = StraceParser::new();
//! let store = TraceStore::from_parts(trace_lines, existing_paths);
//!
//! let versions = VersionExtractor::new().extract(store.paths());
//! let scripts = ProcessExtractor::new(&parser).extract(&store, Some("pytest"));
//! ```
//!
//! # Project Structure
//!
//! - [`trace`]: raw trace ingestion, the tracer subprocess, and the
//!   format-isolating line parser
//! - [`extractors`]: version, requirement, process, and port derivation
//! - [`containers`]: inventory model, runtime client, topology resolution
//! - [`profile`]: the terminal immutable aggregate and its file outputs

// Public modules
pub mod cli;
pub mod config;
pub mod containers;
pub mod extractors;
pub mod fs;
pub mod profile;
pub mod trace;
pub mod util;

// Re-export key types for convenient access
pub use config::{ConfigError, DeptraceConfig};
pub use containers::{
    Container, ContainerInventory, ContainerRuntime, DockerRuntime, PortMapping, RuntimeError,
    TopologyResolver,
};
pub use extractors::{
    InvocationRecord, ModuleRoots, PackageRegistry, PortExtractor, ProcessExtractor,
    RequirementResolver, VersionExtractor,
};
pub use profile::DependencyProfile;
pub use trace::{StraceParser, TraceParser, TraceStore};
pub use util::{init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
