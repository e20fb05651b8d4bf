use crossbeam::channel::{Receiver, Select, Sender};
use std::fmt;
use std::time::Duration;

use super::queue::WorkQueue;

/// Interval between empty polls under [`DrainPolicy::Timeout`]
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Message from a worker back to the dispatcher
#[derive(Debug)]
pub enum Discovery<T> {
    /// A new job to queue
    Found(T),
    /// The worker finished one job, after reporting all of its children
    Finished,
}

/// How the dispatcher decides that no more work will ever arrive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainPolicy {
    /// Drain once every discovered job has been reported finished
    Tracked,
    /// Drain once the queue has stayed empty for `seconds`
    Timeout { seconds: u64 },
}

impl DrainPolicy {
    /// Consecutive empty polls that end a timeout drain
    fn max_idle_polls(seconds: u64) -> u64 {
        std::cmp::max(1, seconds.saturating_mul(2))
    }
}

impl fmt::Display for DrainPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrainPolicy::Tracked => f.write_str("tracked"),
            DrainPolicy::Timeout { seconds } => write!(f, "timeout ({}s)", seconds),
        }
    }
}

/// Moves discovered jobs into the work queue and feeds the worker pool
/// from it. Dropping the dispatcher closes the worker channel, which is
/// the termination signal for the whole pool.
pub struct Dispatcher<T> {
    queue: WorkQueue<T>,
    intake_rx: Receiver<Discovery<T>>,
    work_tx: Sender<T>,
    policy: DrainPolicy,
    in_flight: usize,
}

impl<T> Dispatcher<T> {
    pub fn new(intake_rx: Receiver<Discovery<T>>, work_tx: Sender<T>, policy: DrainPolicy) -> Self {
        Self {
            queue: WorkQueue::new(),
            intake_rx,
            work_tx,
            policy,
            in_flight: 0,
        }
    }

    /// Queue the starting job
    pub fn seed(&mut self, item: T) {
        self.queue.push(item);
        self.in_flight += 1;
    }

    /// Jobs queued or being processed
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Relay jobs until the queue is drained, then close the worker channel.
    /// Returns the number of jobs handed to workers.
    pub fn run(mut self) -> usize {
        let mut pending: Option<T> = None;
        let mut idle_polls = 0u64;
        let mut dispatched = 0usize;

        loop {
            if pending.is_none() {
                pending = self.queue.pop();
            }

            if pending.is_none() && self.policy == DrainPolicy::Tracked && self.in_flight == 0 {
                tracing::debug!("Work queue drained with no jobs in flight");
                break;
            }

            let mut select = Select::new();
            let recv_index = select.recv(&self.intake_rx);
            let send_index = pending.as_ref().map(|_| select.send(&self.work_tx));

            let operation = match (self.policy, pending.is_some()) {
                (DrainPolicy::Timeout { seconds }, false) => {
                    match select.select_timeout(POLL_INTERVAL) {
                        Ok(operation) => operation,
                        Err(_) => {
                            idle_polls += 1;
                            if idle_polls >= DrainPolicy::max_idle_polls(seconds) {
                                if self.in_flight > 0 {
                                    tracing::warn!(
                                        "Drain timeout elapsed with {} jobs still in flight; results may be incomplete",
                                        self.in_flight
                                    );
                                }
                                break;
                            }
                            continue;
                        }
                    }
                }
                _ => select.select(),
            };

            if operation.index() == recv_index {
                match operation.recv(&self.intake_rx) {
                    Ok(Discovery::Found(item)) => {
                        idle_polls = 0;
                        self.queue.push(item);
                        self.in_flight += 1;
                    }
                    Ok(Discovery::Finished) => {
                        self.in_flight = self.in_flight.saturating_sub(1);
                    }
                    Err(_) => {
                        tracing::warn!("All workers disconnected before the queue drained");
                        break;
                    }
                }
            } else if Some(operation.index()) == send_index {
                if let Some(item) = pending.take() {
                    if operation.send(&self.work_tx, item).is_err() {
                        tracing::warn!("Worker channel closed before the queue drained");
                        break;
                    }
                    dispatched += 1;
                }
            }
        }

        tracing::debug!("Dispatcher finished after {} jobs, {} left queued", dispatched, self.queue.len());
        dispatched
    }
}
