//! Command-line interface for pardo
//!
//! Parses flags with clap, layers them over the file and environment
//! configuration, and runs the dispatcher over standard input.

use anyhow::Result;
use clap::{ArgAction, Parser};
use std::io::{self, BufRead};
use std::path::PathBuf;

use crate::aggregator::Aggregator;
use crate::config::{Overrides, Settings};
use crate::exec::ProcessExecutor;
use crate::job::CommandTemplate;
use crate::parallel::{Dispatcher, RunSummary};

pub mod output;

/// pardo - run a command for every line of STDIN, in parallel
#[derive(Parser, Debug)]
#[command(author, version, long_about = None)]
#[command(after_help = "Example: find . -name '*.log' | pardo -w 4 --pass-std gzip {}")]
pub struct Cli {
    /// Number of workers [default: available cores]
    #[arg(short, long, allow_negative_numbers = true)]
    pub workers: Option<i64>,

    /// Replace this token with the STDIN line [default: {}]
    #[arg(short, long, value_name = "TOKEN")]
    pub replace: Option<String>,

    /// Log workers' STDOUT and STDERR to STDERR with [Info]/[Erro] prefixes
    #[arg(short, long)]
    pub log: bool,

    /// Echo each STDIN line to STDOUT once its command has finished
    #[arg(short, long)]
    pub echo: bool,

    /// Echo workers' STDOUT and STDERR to STDOUT
    #[arg(long)]
    pub to_stdout: bool,

    /// Echo workers' STDOUT and STDERR to STDERR
    #[arg(long)]
    pub to_stderr: bool,

    /// Pass workers' STDOUT and STDERR through to the same streams
    #[arg(long)]
    pub pass_std: bool,

    /// Configuration file path (TOML, JSON or YAML)
    #[arg(short, long, value_name = "FILE", env = "PARDO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Diagnostic logging on STDERR (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Command to run; a single argument is split shell-style, then each word substituted
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

impl Cli {
    /// Execute the dispatcher over standard input
    pub fn run(self) -> Result<RunSummary> {
        setup_logging(self.verbose);

        let settings = Settings::load(self.config.as_deref(), &self.overrides())?;
        tracing::debug!(?settings, "Loaded configuration");
        let config = settings.validate()?;

        let dispatcher = Dispatcher::new(config, ProcessExecutor);
        let aggregator = Aggregator::stdio(dispatcher.config().mode);
        dispatcher.run(io::stdin().lock().lines(), aggregator)
    }

    fn overrides(&self) -> Overrides {
        Overrides {
            workers: self.workers,
            replace: self.replace.clone(),
            command: CommandTemplate::from_args(self.command.clone()),
            log: self.log,
            to_stdout: self.to_stdout,
            to_stderr: self.to_stderr,
            pass_std: self.pass_std,
            echo: self.echo,
        }
    }
}

/// Diagnostics go to stderr and stay off unless asked for
fn setup_logging(verbose: u8) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("off"),
            1 => tracing_subscriber::EnvFilter::new("info"),
            2 => tracing_subscriber::EnvFilter::new("debug"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        }
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}
