//! Parallel dispatch core
//!
//! One producer, a fixed pool of workers and one aggregator, connected by two
//! bounded crossbeam channels:
//!
//! ```text
//! ┌──────────┐  Job   ┌──────────────┐  LogEvent  ┌────────────┐
//! │ Producer │───────▶│ Worker pool  │───────────▶│ Aggregator │──▶ stdout / stderr
//! │ (caller) │        │ (N threads)  │            │ (1 thread) │
//! └──────────┘        └──────────────┘            └────────────┘
//! ```
//!
//! # Shutdown
//!
//! The producer drops the work channel's only sender once input runs out.
//! Workers leave their loop when the channel is closed and empty, which in
//! turn closes the event channel for the aggregator.
//!
//! # Completion
//!
//! Closing channels is not enough to know output has been written: a worker
//! can finish a job while its events are still queued. [`CompletionTracker`]
//! counts one unit per job at dispatch and one per event at publish; the
//! worker returns the job's unit after processing and the aggregator returns
//! an event's unit after writing it. [`Dispatcher::run`] waits for the tally
//! to reach zero before returning.
//!
//! # Example
//!
//! ```rust,no_run
//! use pardo::aggregator::Aggregator;
//! use pardo::config::Settings;
//! use pardo::exec::ProcessExecutor;
//! use pardo::job::CommandTemplate;
//! use pardo::parallel::Dispatcher;
//!
//! # fn main() -> anyhow::Result<()> {
//! let settings = Settings {
//!     workers: Some(2),
//!     command: Some(CommandTemplate::Line("echo {}".into())),
//!     to_stdout: true,
//!     ..Settings::default()
//! };
//! let dispatcher = Dispatcher::new(settings.validate()?, ProcessExecutor);
//! let records = ["a", "b", "c"].map(|r| Ok::<_, std::io::Error>(r.to_string()));
//! let summary = dispatcher.run(records, Aggregator::stdio(dispatcher.config().mode))?;
//! assert_eq!(summary.jobs_dispatched, 3);
//! # Ok(())
//! # }
//! ```

mod completion;
pub mod core;

// Re-export main types for easier access
pub use completion::{CompletionTracker, WorkTicket};
pub use self::core::{Dispatcher, RunSummary, default_workers};
