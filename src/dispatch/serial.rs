//! # Serial execution queue.
//!
//! [`SerialQueue`] runs submitted jobs one at a time on a dedicated
//! worker task, in submission order.
//!
//! ## Architecture
//! ```text
//! submit(job) ──► [bounded queue] ──► worker ──► job()
//!                 (try_send)              └────► panic → caught, counted
//! ```
//!
//! ## Rules
//! - **FIFO**: one worker drains one queue, so jobs never reorder.
//! - **Non-blocking**: `submit` uses `try_send`; a full queue returns
//!   [`SubmitError::Full`] and the job is dropped for this queue only.
//! - **Isolation**: a panicking job is caught, counted and the worker
//!   continues with the next job.
//! - **Shutdown**: [`shutdown`](SerialQueue::shutdown) closes intake,
//!   drains what is already queued and joins the worker;
//!   [`halt`](SerialQueue::halt) stops promptly and drops pending jobs.
//!
//! ## Panic handling
//! Worker jobs run under `catch_unwind` via `AssertUnwindSafe`, which can
//! leave shared state inconsistent if a job panics while holding a lock.
//!
//! Queues must be created inside a Tokio runtime (the worker is spawned
//! immediately).

use std::borrow::Cow;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::QueueConfig;
use crate::dispatch::{Dispatch, Job};
use crate::error::SubmitError;

/// Serial execution context backed by one worker task.
///
/// Cloning is cheap and clones share the same worker, so records
/// registered through different clones of one queue still execute in a
/// single submission order.
#[derive(Clone)]
pub struct SerialQueue {
    name: Cow<'static, str>,
    tx: mpsc::Sender<Job>,
    halt_token: CancellationToken,
    drain_token: CancellationToken,
    panics: Arc<AtomicU64>,
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl SerialQueue {
    /// Creates a queue with the default capacity and spawns its worker.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self::with_config(name, QueueConfig::default())
    }

    /// Creates a queue with the given configuration and spawns its worker.
    pub fn with_config(name: impl Into<Cow<'static, str>>, config: QueueConfig) -> Self {
        let (tx, mut rx) = mpsc::channel::<Job>(config.capacity_clamped());
        let halt_token = CancellationToken::new();
        let drain_token = CancellationToken::new();
        let panics = Arc::new(AtomicU64::new(0));

        let halt = halt_token.clone();
        let drain = drain_token.clone();
        let counter = Arc::clone(&panics);
        let worker = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = halt.cancelled() => break,
                    _ = drain.cancelled() => {
                        // Intake is closed; run what is already queued.
                        while let Ok(job) = rx.try_recv() {
                            run_isolated(job, &counter).await;
                        }
                        break;
                    }
                    job = rx.recv() => match job {
                        Some(job) => run_isolated(job, &counter).await,
                        None => break,
                    },
                }
            }
        });

        Self {
            name: name.into(),
            tx,
            halt_token,
            drain_token,
            panics,
            worker: Arc::new(Mutex::new(Some(worker))),
        }
    }

    /// Number of jobs that panicked since the queue was created.
    pub fn panics(&self) -> u64 {
        self.panics.load(AtomicOrdering::Relaxed)
    }

    /// Returns true once the queue no longer accepts jobs.
    pub fn is_closed(&self) -> bool {
        self.halt_token.is_cancelled() || self.drain_token.is_cancelled() || self.tx.is_closed()
    }

    /// Stops the worker promptly. Pending jobs are dropped; further
    /// submissions fail with [`SubmitError::Closed`].
    pub fn halt(&self) {
        self.halt_token.cancel();
    }

    /// Gracefully shuts the queue down: closes intake, drains jobs that
    /// were already queued, then joins the worker.
    ///
    /// Safe to call from any clone; only the first caller joins the
    /// worker. Jobs submitted concurrently with shutdown may be dropped.
    pub async fn shutdown(&self) {
        self.drain_token.cancel();
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = worker {
            let _ = worker.await;
        }
    }
}

impl Dispatch for SerialQueue {
    fn submit(&self, job: Job) -> Result<(), SubmitError> {
        if self.halt_token.is_cancelled() || self.drain_token.is_cancelled() {
            return Err(SubmitError::Closed);
        }
        self.tx.try_send(job).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => SubmitError::Full,
            mpsc::error::TrySendError::Closed(_) => SubmitError::Closed,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Runs one job, converting a panic into a counter bump.
async fn run_isolated(job: Job, panics: &AtomicU64) {
    let fut = async move { job() };
    if AssertUnwindSafe(fut).catch_unwind().await.is_err() {
        panics.fetch_add(1, AtomicOrdering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::config::QueueConfig;

    fn push_job(log: &Arc<Mutex<Vec<usize>>>, value: usize) -> Job {
        let log = Arc::clone(log);
        Box::new(move || log.lock().unwrap().push(value))
    }

    #[tokio::test]
    async fn test_jobs_run_in_submission_order() {
        let queue = SerialQueue::new("fifo");
        let log: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));

        for i in 0..10 {
            queue.submit(push_job(&log, i)).unwrap();
        }
        queue.shutdown().await;

        let expected: Vec<usize> = (0..10).collect();
        assert_eq!(*log.lock().unwrap(), expected);
    }

    #[tokio::test]
    async fn test_panicking_job_is_isolated_and_counted() {
        let queue = SerialQueue::new("panicky");
        let ran = Arc::new(AtomicUsize::new(0));

        queue
            .submit(Box::new(|| panic!("job blew up")))
            .unwrap();
        let after = Arc::clone(&ran);
        queue
            .submit(Box::new(move || {
                after.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
        queue.shutdown().await;

        assert_eq!(ran.load(Ordering::SeqCst), 1, "later job still ran");
        assert_eq!(queue.panics(), 1);
    }

    #[tokio::test]
    async fn test_submit_after_halt_is_closed() {
        let queue = SerialQueue::new("halted");
        queue.halt();

        let result = queue.submit(Box::new(|| {}));
        assert_eq!(result, Err(SubmitError::Closed));
        assert!(queue.is_closed());
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_is_closed() {
        let queue = SerialQueue::new("drained");
        queue.shutdown().await;

        let result = queue.submit(Box::new(|| {}));
        assert_eq!(result, Err(SubmitError::Closed));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_full_queue_rejects_with_full() {
        let queue = SerialQueue::with_config("tiny", QueueConfig { capacity: 1 });
        let gate = Arc::new(Mutex::new(()));
        let held = gate.lock().unwrap();

        // Worker blocks on the gate; at most one more job fits the queue.
        let blocker = Arc::clone(&gate);
        queue
            .submit(Box::new(move || {
                drop(blocker.lock());
            }))
            .unwrap();
        let second = queue.submit(Box::new(|| {}));
        let third = queue.submit(Box::new(|| {}));

        assert!(
            second == Err(SubmitError::Full) || third == Err(SubmitError::Full),
            "a bounded queue must eventually reject: {second:?} / {third:?}"
        );

        drop(held);
        queue.shutdown().await;
    }

    #[tokio::test]
    async fn test_clones_share_one_worker() {
        let queue = SerialQueue::new("shared");
        let alias = queue.clone();
        let log: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));

        queue.submit(push_job(&log, 1)).unwrap();
        alias.submit(push_job(&log, 2)).unwrap();
        queue.shutdown().await;

        assert_eq!(*log.lock().unwrap(), [1, 2]);
        assert!(alias.is_closed());
    }
}
