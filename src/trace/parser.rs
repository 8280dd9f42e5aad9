//! Trace-line parsing
//!
//! The tracer's output is a human-oriented text format that drifts between
//! versions. Every regex that touches the raw format lives here, behind
//! [`TraceParser`], one implementation per format version, so the extractors
//! stay format-agnostic.

use regex::Regex;

/// One execve-style invocation event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecEvent {
    pub pid: u32,
    pub argv: Vec<String>,
}

/// A child-termination signal observed by a reporting process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildSignal {
    pub reporter: u32,
    pub sender: u32,
}

/// Parser for one tracer output format version
pub trait TraceParser: Send + Sync {
    /// Invocation event on this line, if any. Continuation lines of an
    /// interrupted event return `None` so the event is not double-counted.
    fn exec_event(&self, line: &str) -> Option<ExecEvent>;

    /// Child-termination signal on this line, if any
    fn child_signal(&self, line: &str) -> Option<ChildSignal>;

    /// Port numbers of the socket address structures on this line
    fn socket_ports(&self, line: &str) -> Vec<String>;

    /// Path-like tokens on this line: quoted strings and decoded descriptors
    fn path_tokens(&self, line: &str) -> Vec<String>;
}

/// [`TraceParser`] for the strace text format
/// (`pid timestamp call(args) = result`)
pub struct StraceParser {
    leading_pid: Regex,
    argv_block: Regex,
    argv_item: Regex,
    signal_sender: Regex,
    sock_port: Regex,
    quoted: Regex,
    angled: Regex,
}

impl StraceParser {
    pub fn new() -> Self {
        Self {
            leading_pid: Regex::new(r"^\s*(\d+)\s").expect("static pattern"),
            argv_block: Regex::new(r"\[(.*?)\]").expect("static pattern"),
            argv_item: Regex::new(r#""((?:[^"\\]|\\.)*)""#).expect("static pattern"),
            signal_sender: Regex::new(r"si_pid=(\d+)").expect("static pattern"),
            sock_port: Regex::new(r"sin6?_port=htons\((\d+)\)").expect("static pattern"),
            quoted: Regex::new(r#""(.+?)""#).expect("static pattern"),
            angled: Regex::new(r"<(.+?)>").expect("static pattern"),
        }
    }

    fn pid_of(&self, line: &str) -> Option<u32> {
        self.leading_pid.captures(line)?.get(1)?.as_str().parse().ok()
    }
}

impl Default for StraceParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceParser for StraceParser {
    fn exec_event(&self, line: &str) -> Option<ExecEvent> {
        if !line.contains("execve(") || line.contains("execve resumed") {
            return None;
        }
        let pid = self.pid_of(line)?;
        let block = self.argv_block.captures(line)?.get(1)?.as_str();
        let argv: Vec<String> = self
            .argv_item
            .captures_iter(block)
            .map(|cap| cap[1].to_string())
            .collect();
        if argv.is_empty() {
            return None;
        }
        Some(ExecEvent { pid, argv })
    }

    fn child_signal(&self, line: &str) -> Option<ChildSignal> {
        if !line.contains("SIGCHLD") {
            return None;
        }
        let reporter = self.pid_of(line)?;
        let sender = self
            .signal_sender
            .captures(line)?
            .get(1)?
            .as_str()
            .parse()
            .ok()?;
        Some(ChildSignal { reporter, sender })
    }

    fn socket_ports(&self, line: &str) -> Vec<String> {
        self.sock_port
            .captures_iter(line)
            .map(|cap| cap[1].to_string())
            .filter(|port| !port.is_empty())
            .collect()
    }

    fn path_tokens(&self, line: &str) -> Vec<String> {
        let mut tokens: Vec<String> = self
            .quoted
            .captures_iter(line)
            .map(|cap| cap[1].to_string())
            .collect();
        tokens.extend(self.angled.captures_iter(line).map(|cap| cap[1].to_string()));
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exec_event_parses_pid_and_argv() {
        let parser = StraceParser::new();
        let line = r#"200   12:00:02 execve("/usr/local/bin/pytest", ["pytest", "-v"], 0x7ffd1 /* 12 vars */) = 0"#;

        let event = parser.exec_event(line).unwrap();
        assert_eq!(event.pid, 200);
        assert_eq!(event.argv, vec!["pytest", "-v"]);
    }

    #[test]
    fn test_exec_event_keeps_unfinished_line() {
        let parser = StraceParser::new();
        let line = r#"200   12:00:02 execve("/usr/local/bin/pytest", ["pytest", "-v"], 0x7ffd1 /* 12 vars */ <unfinished ...>"#;

        let event = parser.exec_event(line).unwrap();
        assert_eq!(event.argv, vec!["pytest", "-v"]);
    }

    #[test]
    fn test_exec_event_drops_resumed_line() {
        let parser = StraceParser::new();
        let line = "200   12:00:02 <... execve resumed>) = 0";

        assert!(parser.exec_event(line).is_none());
    }

    #[test]
    fn test_exec_event_drops_malformed_line() {
        let parser = StraceParser::new();
        assert!(parser.exec_event("garbage execve( no argv").is_none());
        assert!(parser.exec_event("").is_none());
    }

    #[test]
    fn test_child_signal() {
        let parser = StraceParser::new();
        let line = "100   12:00:04 --- SIGCHLD {si_signo=SIGCHLD, si_code=CLD_EXITED, si_pid=200, si_uid=1000, si_status=0, si_utime=0, si_stime=1} ---";

        let signal = parser.child_signal(line).unwrap();
        assert_eq!(signal.reporter, 100);
        assert_eq!(signal.sender, 200);
    }

    #[test]
    fn test_child_signal_ignores_other_signals() {
        let parser = StraceParser::new();
        let line = "100   12:00:04 --- SIGINT {si_signo=SIGINT, si_code=SI_KERNEL} ---";

        assert!(parser.child_signal(line).is_none());
    }

    #[test]
    fn test_socket_ports() {
        let parser = StraceParser::new();
        let v4 = r#"100   12:00:05 connect(3, {sa_family=AF_INET, sin_port=htons(5432), sin_addr=inet_addr("127.0.0.1")}, 16) = 0"#;
        let v6 = "100   12:00:06 bind(4, {sa_family=AF_INET6, sin6_port=htons(8080), sin6_flowinfo=htonl(0)}, 28) = 0";

        assert_eq!(parser.socket_ports(v4), vec!["5432"]);
        assert_eq!(parser.socket_ports(v6), vec!["8080"]);
        assert!(parser.socket_ports("100   12:00:07 close(3) = 0").is_empty());
    }

    #[test]
    fn test_path_tokens_quoted_and_angled() {
        let parser = StraceParser::new();
        let line = r#"100   12:00:01 openat(AT_FDCWD, "/usr/lib/python3.11/site.py", O_RDONLY) = 3</usr/lib/python3.11/site.py>"#;

        let tokens = parser.path_tokens(line);
        assert_eq!(
            tokens,
            vec!["/usr/lib/python3.11/site.py", "/usr/lib/python3.11/site.py"]
        );
    }
}
