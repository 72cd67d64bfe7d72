use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the aggregator sends each kind of event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Discard everything
    #[default]
    Silent,
    /// Every event to stderr with an `[Info]`/`[Erro]` prefix and its command
    DiagnosticLog,
    /// Every event's raw text to stdout
    ForwardToStdout,
    /// Every event's raw text to stderr
    ForwardToStderr,
    /// Errors to stderr, everything else to stdout
    PassThrough,
    /// Only echoed input records, to stdout
    EchoOnly,
}

/// Output selection flags as given on the command line or in config
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputFlags {
    pub log: bool,
    pub to_stdout: bool,
    pub to_stderr: bool,
    pub pass_std: bool,
    pub echo: bool,
}

impl OutputMode {
    /// Pick the single active mode; higher-priority flags win when several are set
    pub fn select(flags: OutputFlags) -> Self {
        if flags.log {
            OutputMode::DiagnosticLog
        } else if flags.to_stdout {
            OutputMode::ForwardToStdout
        } else if flags.to_stderr {
            OutputMode::ForwardToStderr
        } else if flags.pass_std {
            OutputMode::PassThrough
        } else if flags.echo {
            OutputMode::EchoOnly
        } else {
            OutputMode::Silent
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputMode::Silent => "silent",
            OutputMode::DiagnosticLog => "log",
            OutputMode::ForwardToStdout => "to-stdout",
            OutputMode::ForwardToStderr => "to-stderr",
            OutputMode::PassThrough => "pass-std",
            OutputMode::EchoOnly => "echo",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_flags_is_silent() {
        assert_eq!(OutputMode::select(OutputFlags::default()), OutputMode::Silent);
    }

    #[test]
    fn test_single_flags() {
        let cases = [
            (OutputFlags { log: true, ..Default::default() }, OutputMode::DiagnosticLog),
            (OutputFlags { to_stdout: true, ..Default::default() }, OutputMode::ForwardToStdout),
            (OutputFlags { to_stderr: true, ..Default::default() }, OutputMode::ForwardToStderr),
            (OutputFlags { pass_std: true, ..Default::default() }, OutputMode::PassThrough),
            (OutputFlags { echo: true, ..Default::default() }, OutputMode::EchoOnly),
        ];
        for (flags, expected) in cases {
            assert_eq!(OutputMode::select(flags), expected, "flags: {flags:?}");
        }
    }

    #[test]
    fn test_priority_when_several_set() {
        let all = OutputFlags {
            log: true,
            to_stdout: true,
            to_stderr: true,
            pass_std: true,
            echo: true,
        };
        assert_eq!(OutputMode::select(all), OutputMode::DiagnosticLog);

        let flags = OutputFlags { to_stderr: true, pass_std: true, echo: true, ..Default::default() };
        assert_eq!(OutputMode::select(flags), OutputMode::ForwardToStderr);

        let flags = OutputFlags { pass_std: true, echo: true, ..Default::default() };
        assert_eq!(OutputMode::select(flags), OutputMode::PassThrough);
    }
}
