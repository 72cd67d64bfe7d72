//! The single consumer of log events
//!
//! The aggregator owns both output streams for the whole run. Events are
//! written one at a time, so output from different jobs never interleaves
//! below event granularity.

use console::style;
use crossbeam::channel::Receiver;
use std::io::{self, Write};

use crate::config::OutputMode;
use crate::events::{EventKind, LogEvent};

/// Counters reported once the event channel is drained
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AggregateStats {
    pub written: usize,
    pub discarded: usize,
    pub write_failures: usize,
}

enum Stream {
    Stdout,
    Stderr,
}

pub struct Aggregator<O: Write, E: Write> {
    mode: OutputMode,
    stdout: O,
    stderr: E,
    stats: AggregateStats,
}

impl Aggregator<io::Stdout, io::Stderr> {
    /// Aggregator writing to the process's own streams
    pub fn stdio(mode: OutputMode) -> Self {
        Self::new(mode, io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> Aggregator<O, E> {
    pub fn new(mode: OutputMode, stdout: O, stderr: E) -> Self {
        Self {
            mode,
            stdout,
            stderr,
            stats: AggregateStats::default(),
        }
    }

    /// Consume events until every sender is gone
    pub fn drain(mut self, events: Receiver<LogEvent>) -> AggregateStats {
        for event in events {
            self.handle(event);
        }
        if let Err(e) = self.stdout.flush().and_then(|_| self.stderr.flush()) {
            tracing::warn!(error = %e, "Failed to flush output");
        }
        tracing::debug!(stats = ?self.stats, "Event channel drained");
        self.stats
    }

    /// Write (or discard) one event, then release its unit of work
    pub fn handle(&mut self, event: LogEvent) {
        match self.route(event.kind) {
            Some(stream) => {
                let bytes = self.render(&event);
                let result = match stream {
                    Stream::Stdout => self.stdout.write_all(&bytes),
                    Stream::Stderr => self.stderr.write_all(&bytes),
                };
                match result {
                    Ok(()) => self.stats.written += 1,
                    Err(e) => {
                        // keep draining so the run can still finish
                        self.stats.write_failures += 1;
                        tracing::warn!(error = %e, "Failed to write event");
                    }
                }
            }
            None => self.stats.discarded += 1,
        }
        event.complete();
    }

    #[cfg(test)]
    fn into_parts(self) -> (O, E, AggregateStats) {
        (self.stdout, self.stderr, self.stats)
    }

    fn route(&self, kind: EventKind) -> Option<Stream> {
        match self.mode {
            OutputMode::Silent => None,
            OutputMode::DiagnosticLog | OutputMode::ForwardToStderr => Some(Stream::Stderr),
            OutputMode::ForwardToStdout => Some(Stream::Stdout),
            OutputMode::PassThrough if kind.is_error() => Some(Stream::Stderr),
            OutputMode::PassThrough => Some(Stream::Stdout),
            OutputMode::EchoOnly if kind == EventKind::EchoedInput => Some(Stream::Stdout),
            OutputMode::EchoOnly => None,
        }
    }

    fn render(&self, event: &LogEvent) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(event.text.len() + 32);

        if self.mode == OutputMode::DiagnosticLog {
            let tag = if event.kind.is_error() {
                style("[Erro]").red().for_stderr()
            } else {
                style("[Info]").cyan().for_stderr()
            };
            bytes.extend_from_slice(
                format!("{} [{}] -> ", tag, event.source_command.join(" ")).as_bytes(),
            );
            bytes.extend_from_slice(&event.text);
            terminate_line(&mut bytes);
            return bytes;
        }

        bytes.extend_from_slice(&event.text);
        if event.kind == EventKind::EchoedInput {
            terminate_line(&mut bytes);
        }
        bytes
    }
}

fn terminate_line(bytes: &mut Vec<u8>) {
    if bytes.last() != Some(&b'\n') {
        bytes.push(b'\n');
    }
}
