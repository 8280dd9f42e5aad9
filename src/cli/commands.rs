use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Syscall-trace based dependency profiling
#[derive(Parser, Debug)]
#[command(
    name = "deptrace",
    about = "Derive a dependency profile from a system-call trace",
    version,
    long_about = "deptrace runs (or reuses) a syscall trace of a target script and derives \
                  the runtime versions, undeclared package requirements, directly invoked \
                  programs, network ports, and container topology the target depends on."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Increase verbosity")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Build a dependency profile from a trace",
        long_about = "Loads the cached trace (or captures a fresh one) and derives the full \
                      dependency profile.\n\n\
                      Examples:\n  \
                      deptrace profile\n  \
                      deptrace profile ci/run.sh --new-trace\n  \
                      deptrace profile --container job-runner --format json\n  \
                      deptrace profile --script pytest --write-requirements requirements.txt"
    )]
    Profile(ProfileArgs),

    #[command(
        about = "Capture or refresh the trace and path logs",
        long_about = "Runs the tracer against the target and regenerates the trace and path \
                      cache logs without deriving a profile.\n\n\
                      Examples:\n  \
                      deptrace trace\n  \
                      deptrace trace ci/run.sh --container job-runner"
    )]
    Trace(TraceArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct ProfileArgs {
    #[arg(
        value_name = "TARGET",
        help = "Target script to trace (defaults to target.sh)"
    )]
    pub target: Option<PathBuf>,

    #[arg(long, value_name = "FILE", help = "Trace log location (cache artifact)")]
    pub trace_log: Option<PathBuf>,

    #[arg(long, value_name = "FILE", help = "Paths log location (cache artifact)")]
    pub paths_log: Option<PathBuf>,

    #[arg(long, help = "Re-trace the target even if cached logs exist")]
    pub new_trace: bool,

    #[arg(
        short = 'c',
        long,
        value_name = "NAME",
        help = "Trace inside this container instead of locally"
    )]
    pub container: Option<String>,

    #[arg(
        short = 'r',
        long,
        value_name = "FILE",
        help = "Declared requirements document to diff against"
    )]
    pub requirements: Option<PathBuf>,

    #[arg(
        long,
        value_name = "FILE",
        help = "Regenerate this requirements file from the resolved set"
    )]
    pub write_requirements: Option<PathBuf>,

    #[arg(
        long,
        value_name = "NAME",
        help = "Only keep invocations of this program"
    )]
    pub script: Option<String>,

    #[arg(
        long,
        value_name = "FILE",
        help = "Container inventory log (tilde-separated); live query when omitted"
    )]
    pub inventory_log: Option<PathBuf>,

    #[arg(
        long,
        value_name = "FILE",
        help = "Write a redacted summary of directly-invoked trace lines"
    )]
    pub summary_log: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Write output to file instead of stdout"
    )]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct TraceArgs {
    #[arg(
        value_name = "TARGET",
        help = "Target script to trace (defaults to target.sh)"
    )]
    pub target: Option<PathBuf>,

    #[arg(long, value_name = "FILE", help = "Trace log location (cache artifact)")]
    pub trace_log: Option<PathBuf>,

    #[arg(long, value_name = "FILE", help = "Paths log location (cache artifact)")]
    pub paths_log: Option<PathBuf>,

    #[arg(
        short = 'c',
        long,
        value_name = "NAME",
        help = "Trace inside this container instead of locally"
    )]
    pub container: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_profile_defaults() {
        let args = CliArgs::try_parse_from(["deptrace", "profile"]).unwrap();
        match args.command {
            Commands::Profile(profile) => {
                assert!(profile.target.is_none());
                assert!(!profile.new_trace);
                assert_eq!(profile.format, OutputFormatArg::Human);
            }
            _ => panic!("expected profile subcommand"),
        }
    }

    #[test]
    fn test_parse_profile_flags() {
        let args = CliArgs::try_parse_from([
            "deptrace",
            "profile",
            "ci/run.sh",
            "--new-trace",
            "--container",
            "job-runner",
            "--script",
            "pytest",
            "--format",
            "json",
        ])
        .unwrap();

        match args.command {
            Commands::Profile(profile) => {
                assert_eq!(profile.target, Some(PathBuf::from("ci/run.sh")));
                assert!(profile.new_trace);
                assert_eq!(profile.container.as_deref(), Some("job-runner"));
                assert_eq!(profile.script.as_deref(), Some("pytest"));
                assert_eq!(profile.format, OutputFormatArg::Json);
            }
            _ => panic!("expected profile subcommand"),
        }
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(CliArgs::try_parse_from(["deptrace", "-v", "-q", "profile"]).is_err());
    }
}
