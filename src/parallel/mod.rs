//! Work distribution for the scan pipeline
//!
//! This module knows nothing about files or rules. It owns the two pieces
//! of coordination the worker pool needs:
//!
//! - [`WorkQueue`]: an unbounded FIFO of pending jobs, owned by one thread
//! - [`Dispatcher`]: moves jobs discovered by workers into the queue and
//!   hands queued jobs back to idle workers, deciding when the pool is done
//!
//! ```text
//!   root ──▶ Dispatcher ──work──▶ worker 1..N
//!               ▲                    │
//!               └──── Discovery ─────┘
//!                (Found(job) / Finished)
//! ```
//!
//! With [`DrainPolicy::Tracked`] the dispatcher counts every job from
//! discovery to completion and closes the worker channel when that count
//! reaches zero. [`DrainPolicy::Timeout`] instead waits for the queue to
//! stay empty for a fixed window, which can end the scan early if a worker
//! is still expanding a slow directory.

pub mod dispatcher;
pub mod queue;

pub use dispatcher::{Discovery, Dispatcher, DrainPolicy, POLL_INTERVAL};
pub use queue::WorkQueue;
