use anyhow::{Result, anyhow};
use crossbeam::channel::{Receiver, Sender, bounded};
use std::io::{self, Write};

use super::CompletionTracker;
use crate::aggregator::{AggregateStats, Aggregator};
use crate::config::DispatchConfig;
use crate::events::{EventKind, LogEvent};
use crate::exec::{ExecError, Executor};
use crate::job::{Job, Producer};

/// What a finished run did
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub workers: usize,
    pub jobs_dispatched: usize,
    /// Completion units released: one per job plus one per event
    pub work_units: usize,
    pub events_written: usize,
    pub events_discarded: usize,
    pub write_failures: usize,
}

impl RunSummary {
    fn new(workers: usize, jobs_dispatched: usize, work_units: usize, stats: AggregateStats) -> Self {
        Self {
            workers,
            jobs_dispatched,
            work_units,
            events_written: stats.written,
            events_discarded: stats.discarded,
            write_failures: stats.write_failures,
        }
    }
}

/// Wires producer, worker pool and aggregator together for one run
pub struct Dispatcher<X> {
    config: DispatchConfig,
    executor: X,
}

/// Per-thread state so workers don't take a pile of arguments
struct WorkerContext<'a, X> {
    worker_id: usize,
    jobs: Receiver<Job>,
    events: Sender<LogEvent>,
    executor: &'a X,
}

/// Event channel closed underneath a worker
struct AggregatorGone;

impl<X: Executor> Dispatcher<X> {
    pub fn new(config: DispatchConfig, executor: X) -> Self {
        Self { config, executor }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Run every record through the pool and wait for all output to be written
    ///
    /// The producer runs on the calling thread. This returns only after the
    /// work channel has been closed and drained and the completion tracker
    /// has seen every job and every event released. A failure reading
    /// `records` is returned after that point too, so no dispatched job is
    /// ever abandoned.
    pub fn run<I, O, E>(&self, records: I, aggregator: Aggregator<O, E>) -> Result<RunSummary>
    where
        I: IntoIterator<Item = io::Result<String>>,
        O: Write + Send,
        E: Write + Send,
    {
        let workers = self.config.workers.get();
        let capacity = self.config.channel_capacity();
        let (job_tx, job_rx) = bounded::<Job>(capacity);
        let (event_tx, event_rx) = bounded::<LogEvent>(capacity);

        let tracker = CompletionTracker::new();
        let producer = Producer::new(
            &self.config.template,
            &self.config.placeholder,
            self.config.echo_input,
        );

        tracing::info!(
            workers,
            capacity,
            mode = %self.config.mode,
            "Starting dispatcher"
        );

        crossbeam::thread::scope(|s| -> Result<RunSummary> {
            let aggregate = s.spawn(move |_| aggregator.drain(event_rx));

            for worker_id in 0..workers {
                let ctx = WorkerContext {
                    worker_id,
                    jobs: job_rx.clone(),
                    events: event_tx.clone(),
                    executor: &self.executor,
                };
                s.spawn(move |_| ctx.run());
            }

            // Workers and aggregator hold the only remaining ends
            drop(job_rx);
            drop(event_tx);

            let produced = producer.publish(records, job_tx, &tracker);
            let work_units = tracker.wait();

            let stats = aggregate
                .join()
                .map_err(|_| anyhow!("Aggregator thread panicked"))?;
            let summary = RunSummary::new(workers, produced?, work_units, stats);
            tracing::info!(?summary, "Dispatcher finished");
            Ok(summary)
        })
        .map_err(|_| anyhow!("Thread panic occurred during parallel execution"))?
    }
}

impl<X: Executor> WorkerContext<'_, X> {
    fn run(self) {
        let _span = tracing::debug_span!("worker", id = self.worker_id).entered();
        tracing::debug!("Worker started");

        while let Ok(job) = self.jobs.recv() {
            if self.process(job).is_err() {
                tracing::warn!("Event channel closed, worker stopping");
                break;
            }
        }

        tracing::debug!("Worker stopped");
    }

    /// Execute one job and publish its events in stdout, stderr, echo order
    fn process(&self, mut job: Job) -> Result<(), AggregatorGone> {
        let outcome = self.executor.execute(&job.argv);
        if let Some(error) = &outcome.error {
            tracing::debug!(argv = ?job.argv, %error, "Job failed");
        }

        if !outcome.stdout.is_empty() {
            self.publish(&job, EventKind::StandardOutput, outcome.stdout)?;
        }

        if let Some(text) = error_text(outcome.stderr, outcome.error) {
            self.publish(&job, EventKind::StandardError, text)?;
        }

        if let Some(record) = job.echo_input.take() {
            let event = LogEvent::new(
                EventKind::EchoedInput,
                Vec::new(),
                record.into_bytes(),
                job.event_ticket(),
            );
            self.events.send(event).map_err(|_| AggregatorGone)?;
        }

        job.complete();
        Ok(())
    }

    fn publish(&self, job: &Job, kind: EventKind, text: Vec<u8>) -> Result<(), AggregatorGone> {
        let event = LogEvent::new(kind, job.argv.clone(), text, job.event_ticket());
        self.events.send(event).map_err(|_| AggregatorGone)
    }
}

/// Stderr text for a job, with any execution error on its own trailing line
fn error_text(mut stderr: Vec<u8>, error: Option<ExecError>) -> Option<Vec<u8>> {
    let Some(error) = error else {
        return (!stderr.is_empty()).then_some(stderr);
    };

    if !stderr.is_empty() && !stderr.ends_with(b"\n") {
        stderr.push(b'\n');
    }
    stderr.extend_from_slice(error.to_string().as_bytes());
    stderr.push(b'\n');
    Some(stderr)
}

/// Default pool size: one worker per available core
pub fn default_workers() -> usize {
    std::cmp::max(1, num_cpus::get())
}
