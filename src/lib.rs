//! # pardo - run a command for every input line, in parallel
//!
//! Reads lines from standard input, substitutes each one into a command
//! template and runs the resulting commands across a fixed pool of workers.
//! All captured output funnels through a single aggregator, so output from
//! different commands never interleaves and nothing is lost on exit.
//!
//! ```bash
//! # Compress every log file, four at a time, surfacing errors only
//! find . -name '*.log' | pardo -w 4 --pass-std gzip {}
//!
//! # Show which inputs were processed
//! cat urls.txt | pardo -e curl -sfO {}
//! ```

pub mod aggregator;
pub mod cli;
pub mod config;
pub mod events;
pub mod exec;
pub mod job;
pub mod parallel;

pub use cli::Cli;
pub use config::{DispatchConfig, OutputMode};

/// Result type alias for pardo operations
pub type Result<T> = anyhow::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
