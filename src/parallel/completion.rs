use crossbeam::sync::WaitGroup;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Outstanding-work tally for one dispatcher run
///
/// One unit is taken per job when it is dispatched and one per log event when
/// it is published. A unit is returned when its [`WorkTicket`] is dropped: the
/// worker drops the job ticket once processing returns, the aggregator drops an
/// event ticket once the event is written. [`CompletionTracker::wait`] blocks
/// until every unit is back.
pub struct CompletionTracker {
    group: WaitGroup,
    outstanding: Arc<AtomicUsize>,
    issued: Arc<AtomicUsize>,
}

/// One unit of outstanding work
#[derive(Debug)]
pub struct WorkTicket {
    group: WaitGroup,
    outstanding: Arc<AtomicUsize>,
    issued: Arc<AtomicUsize>,
}

impl CompletionTracker {
    pub fn new() -> Self {
        Self {
            group: WaitGroup::new(),
            outstanding: Arc::new(AtomicUsize::new(0)),
            issued: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Take a unit for a newly dispatched job
    pub fn ticket(&self) -> WorkTicket {
        WorkTicket::issue(&self.group, &self.outstanding, &self.issued)
    }

    /// Units currently taken and not yet returned
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Block until every ticket has been dropped
    ///
    /// Returns how many units were taken over the tracker's lifetime: one per
    /// job plus one per published event.
    pub fn wait(self) -> usize {
        tracing::debug!(outstanding = self.outstanding(), "Waiting for outstanding work to drain");
        self.group.wait();
        self.issued.load(Ordering::Acquire)
    }
}

impl Default for CompletionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkTicket {
    fn issue(group: &WaitGroup, outstanding: &Arc<AtomicUsize>, issued: &Arc<AtomicUsize>) -> Self {
        outstanding.fetch_add(1, Ordering::AcqRel);
        issued.fetch_add(1, Ordering::Relaxed);
        Self {
            group: group.clone(),
            outstanding: outstanding.clone(),
            issued: issued.clone(),
        }
    }

    /// Take an additional unit tied to the same run
    ///
    /// Used for every log event a job publishes. The parent ticket is still
    /// alive at that point, so the tally cannot reach zero in between.
    pub fn child(&self) -> WorkTicket {
        WorkTicket::issue(&self.group, &self.outstanding, &self.issued)
    }
}

impl Drop for WorkTicket {
    fn drop(&mut self) {
        self.outstanding.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_tickets_are_counted() {
        let tracker = CompletionTracker::new();
        let job = tracker.ticket();
        let event = job.child();
        assert_eq!(tracker.outstanding(), 2);

        drop(job);
        assert_eq!(tracker.outstanding(), 1);
        drop(event);
        assert_eq!(tracker.outstanding(), 0);
        assert_eq!(tracker.wait(), 2);
    }

    #[test]
    fn test_wait_without_tickets_returns() {
        let tracker = CompletionTracker::new();
        assert_eq!(tracker.wait(), 0);
    }

    #[test]
    fn test_wait_blocks_until_child_ticket_dropped() {
        let tracker = CompletionTracker::new();
        let job = tracker.ticket();
        let event = job.child();
        let outstanding = tracker.outstanding.clone();

        // Job finishes first, its event is still in flight
        drop(job);

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            drop(event);
        });

        assert_eq!(tracker.wait(), 2);
        assert_eq!(outstanding.load(Ordering::Acquire), 0);
        handle.join().unwrap();
    }
}
