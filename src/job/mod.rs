//! Jobs and the producer that turns input records into them

use anyhow::{Context, Result, anyhow};
use crossbeam::channel::Sender;
use std::io;

use crate::parallel::{CompletionTracker, WorkTicket};

mod template;

pub use template::{ArgTemplate, CommandTemplate};

/// One fully expanded command invocation
#[derive(Debug)]
pub struct Job {
    pub argv: Vec<String>,
    /// Original record, present when input echoing is enabled
    pub echo_input: Option<String>,
    ticket: WorkTicket,
}

impl Job {
    pub fn new(argv: Vec<String>, echo_input: Option<String>, ticket: WorkTicket) -> Self {
        Self {
            argv,
            echo_input,
            ticket,
        }
    }

    /// Ticket for a log event published on behalf of this job
    pub fn event_ticket(&self) -> WorkTicket {
        self.ticket.child()
    }

    /// Release the job's own unit of outstanding work
    pub fn complete(self) {
        drop(self.ticket);
    }
}

/// Expands records into jobs and feeds them to the worker pool
pub struct Producer<'a> {
    template: &'a ArgTemplate,
    placeholder: &'a str,
    echo_input: bool,
}

impl<'a> Producer<'a> {
    pub fn new(template: &'a ArgTemplate, placeholder: &'a str, echo_input: bool) -> Self {
        Self {
            template,
            placeholder,
            echo_input,
        }
    }

    pub fn job_for(&self, record: String, ticket: WorkTicket) -> Job {
        let argv = self.template.expand(self.placeholder, &record);
        let echo_input = self.echo_input.then_some(record);
        Job::new(argv, echo_input, ticket)
    }

    /// Publish one job per record, blocking while the pool is saturated
    ///
    /// Consumes `jobs`; dropping the sender is what tells the workers no
    /// more work is coming. Returns the number of jobs published. A record
    /// that fails to read ends production early with that error, after
    /// everything read so far has been handed over.
    pub fn publish<I>(&self, records: I, jobs: Sender<Job>, tracker: &CompletionTracker) -> Result<usize>
    where
        I: IntoIterator<Item = io::Result<String>>,
    {
        let mut dispatched = 0;

        for record in records {
            let record = record.context("Failed to read input record")?;
            let job = self.job_for(record, tracker.ticket());
            tracing::trace!(argv = ?job.argv, "Dispatching job");

            jobs.send(job)
                .map_err(|_| anyhow!("Worker pool shut down before all jobs were dispatched"))?;
            dispatched += 1;
        }

        Ok(dispatched)
    }
}
