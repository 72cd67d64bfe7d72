//! External command execution
//!
//! The worker pool only needs one operation from this module: run an argv to
//! completion and hand back everything it wrote. [`Executor`] is the seam the
//! pool is generic over; [`ProcessExecutor`] is the real implementation.

use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;

/// Why a command did not succeed
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("empty command")]
    EmptyCommand,

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with status {code}")]
    Exit { program: String, code: i32 },

    #[error("{program} terminated by signal")]
    Signal { program: String },
}

impl ExecError {
    fn from_status(program: &str, status: ExitStatus) -> Option<Self> {
        if status.success() {
            return None;
        }
        Some(match status.code() {
            Some(code) => ExecError::Exit {
                program: program.to_string(),
                code,
            },
            None => ExecError::Signal {
                program: program.to_string(),
            },
        })
    }
}

/// Captured result of running one command
#[derive(Debug, Default)]
pub struct ExecOutcome {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub error: Option<ExecError>,
}

impl ExecOutcome {
    pub fn failed(error: ExecError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }
}

/// Runs one command and captures its output in full
pub trait Executor: Send + Sync {
    fn execute(&self, argv: &[String]) -> ExecOutcome;
}

/// Spawns the command as a child process
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessExecutor;

impl Executor for ProcessExecutor {
    fn execute(&self, argv: &[String]) -> ExecOutcome {
        let Some((program, args)) = argv.split_first().filter(|(program, _)| !program.is_empty()) else {
            return ExecOutcome::failed(ExecError::EmptyCommand);
        };

        // stdin belongs to the producer
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output();

        match output {
            Ok(output) => ExecOutcome {
                error: ExecError::from_status(program, output.status),
                stdout: output.stdout,
                stderr: output.stderr,
            },
            Err(source) => ExecOutcome::failed(ExecError::Spawn {
                program: program.clone(),
                source,
            }),
        }
    }
}
