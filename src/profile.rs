//! Dependency profile
//!
//! The terminal, immutable snapshot of everything the trace proved the
//! target depends on, plus the file outputs derived from it.

use crate::containers::Container;
use crate::extractors::InvocationRecord;
use crate::fs::FileSystem;
use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Aggregated dependency evidence for one traced run. Built once; never
/// recomputed.
#[derive(Debug, Clone, Serialize)]
pub struct DependencyProfile {
    /// Runtime versions exercised by the target
    pub versions: BTreeSet<String>,
    /// Installed packages evidenced by the trace but not yet declared
    pub requirements: BTreeMap<String, String>,
    /// Programs directly invoked by the target
    pub scripts: Vec<InvocationRecord>,
    /// Ports touched by any socket call
    pub ports: BTreeSet<String>,
    /// The container hosting the traced process, or the empty sentinel
    pub job_container: Container,
    /// Containers the target depends on but does not run inside
    pub service_containers: Vec<Container>,
}

impl DependencyProfile {
    pub fn assemble(
        versions: BTreeSet<String>,
        requirements: BTreeMap<String, String>,
        scripts: Vec<InvocationRecord>,
        ports: BTreeSet<String>,
        job_container: Container,
        service_containers: Vec<Container>,
    ) -> Self {
        Self {
            versions,
            requirements,
            scripts,
            ports,
            job_container,
            service_containers,
        }
    }

    /// True when the trace produced no evidence at all. Silent degradation
    /// means an absent tracer and an empty trace look identical; callers
    /// that care must check here.
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
            && self.requirements.is_empty()
            && self.scripts.iter().all(InvocationRecord::is_placeholder)
            && self.ports.is_empty()
            && self.job_container.is_none()
            && self.service_containers.is_empty()
    }

    /// Regenerate a requirements file mirroring the resolved set, one
    /// `name==version` per line
    pub fn write_requirements<F: FileSystem>(&self, fs: &F, path: &Path) -> Result<()> {
        let mut text = String::new();
        for (name, version) in &self.requirements {
            text.push_str(name);
            text.push_str("==");
            text.push_str(version);
            text.push('\n');
        }
        fs.write(path, &text)
    }

    /// Human-readable log of the trace lines behind the directly-invoked
    /// programs, with the current user name redacted
    pub fn summary_log(&self, lines: &[String]) -> String {
        let programs: BTreeSet<&str> = self
            .scripts
            .iter()
            .filter_map(InvocationRecord::program)
            .collect();
        let user = std::env::var("USER").ok().filter(|u| !u.is_empty());

        let mut out = format!("# deptrace summary generated {}\n", Utc::now().to_rfc3339());
        for line in lines {
            if programs.iter().any(|program| line.contains(program)) {
                match &user {
                    Some(user) => out.push_str(&line.replace(user.as_str(), "<user>")),
                    None => out.push_str(line),
                }
                out.push('\n');
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;
    use serial_test::serial;

    fn profile_with_requirements(items: &[(&str, &str)]) -> DependencyProfile {
        DependencyProfile::assemble(
            BTreeSet::new(),
            items
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
            vec![InvocationRecord::placeholder()],
            BTreeSet::new(),
            Container::none(),
            Vec::new(),
        )
    }

    #[test]
    fn test_empty_profile_detected() {
        assert!(profile_with_requirements(&[]).is_empty());
        assert!(!profile_with_requirements(&[("requests", "2.31.0")]).is_empty());
    }

    #[test]
    fn test_write_requirements_sorted_pins() {
        let profile = profile_with_requirements(&[("requests", "2.31.0"), ("numpy", "1.26.4")]);
        let fs = MockFileSystem::new();

        profile.write_requirements(&fs, Path::new("/out/requirements.txt")).unwrap();
        assert_eq!(
            fs.written("/out/requirements.txt").unwrap(),
            "numpy==1.26.4\nrequests==2.31.0\n"
        );
    }

    #[test]
    fn test_write_requirements_empty_profile() {
        let profile = profile_with_requirements(&[]);
        let fs = MockFileSystem::new();

        profile.write_requirements(&fs, Path::new("/out/requirements.txt")).unwrap();
        assert_eq!(fs.written("/out/requirements.txt").unwrap(), "");
    }

    #[test]
    #[serial]
    fn test_summary_log_filters_and_redacts() {
        std::env::set_var("USER", "jenkins");

        let profile = DependencyProfile::assemble(
            BTreeSet::new(),
            BTreeMap::new(),
            vec![InvocationRecord {
                pid: 200,
                argv: vec!["pytest".to_string(), "-v".to_string()],
            }],
            BTreeSet::new(),
            Container::none(),
            Vec::new(),
        );
        let lines = vec![
            "200   execve(\"/home/jenkins/.local/bin/pytest\", [\"pytest\", \"-v\"]) = 0".to_string(),
            "100   openat(AT_FDCWD, \"/etc/hosts\", O_RDONLY) = 3".to_string(),
        ];

        let summary = profile.summary_log(&lines);
        assert!(summary.contains("/home/<user>/.local/bin/pytest"));
        assert!(!summary.contains("jenkins"));
        assert!(!summary.contains("/etc/hosts"));
    }

    #[test]
    #[serial]
    fn test_summary_log_placeholder_matches_nothing() {
        std::env::remove_var("USER");

        let profile = profile_with_requirements(&[]);
        let lines = vec!["100   openat(AT_FDCWD, \"/etc/hosts\") = 3".to_string()];

        let summary = profile.summary_log(&lines);
        assert_eq!(summary.lines().count(), 1); // header only
    }
}
