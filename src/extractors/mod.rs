// Trace-derived extraction of dependency evidence
//
// Extractors consume the immutable trace store and compute one facet of the
// dependency profile each, eagerly and exactly once. All of them degrade to
// empty results on missing or malformed input.

pub mod port;
pub mod process;
pub mod requirements;
pub mod versions;

pub use port::PortExtractor;
pub use process::{InvocationRecord, ProcessExtractor};
pub use requirements::{ModuleRoots, PackageRegistry, RequirementResolver};
pub use versions::VersionExtractor;
