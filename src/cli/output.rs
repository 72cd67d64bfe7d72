//! Messages pardo itself prints, as opposed to relayed command output
//!
//! Only used before the dispatcher starts or after it has returned, so it
//! never competes with the aggregator for the output streams.

use console::style;

/// Print a fatal error, including its cause chain
pub fn fatal(error: &anyhow::Error) {
    eprintln!("{} {:#}", style("✖").red().bold().for_stderr(), error);
}
