//! File system abstraction
//!
//! Everything that touches the trace, path, and inventory logs goes through
//! [`FileSystem`] so the loading and cache-regeneration logic can be tested
//! without a real disk.

mod mock;
mod real;

pub use mock::MockFileSystem;
pub use real::StdFileSystem;

use anyhow::Result;
use std::path::Path;

/// Abstraction over the file system operations the log layer needs
pub trait FileSystem: Send + Sync {
    /// Check if a path exists
    fn exists(&self, path: &Path) -> bool;

    /// Read file contents as string
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Write a string, replacing any previous contents
    fn write(&self, path: &Path, contents: &str) -> Result<()>;
}
