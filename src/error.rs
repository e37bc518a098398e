//! Error types surfaced at the dispatch boundary.
//!
//! The bus itself surfaces no errors: a dead target self-disposes
//! silently (a designed degradation path, not a fault), and `raise`
//! swallows failed submissions because delivery is fire-and-forget.
//! [`SubmitError`] exists for direct users of
//! [`Dispatch::submit`](crate::Dispatch::submit).

use thiserror::Error;

/// # Errors produced when submitting a job to an execution context.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// The context's queue is full; the job was dropped.
    #[error("dispatch queue is full; job dropped")]
    Full,

    /// The context no longer accepts jobs (halted, shut down, or its
    /// worker is gone).
    #[error("dispatch queue is closed")]
    Closed,
}

impl SubmitError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use eventor::SubmitError;
    ///
    /// assert_eq!(SubmitError::Full.as_label(), "queue_full");
    /// assert_eq!(SubmitError::Closed.as_label(), "queue_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SubmitError::Full => "queue_full",
            SubmitError::Closed => "queue_closed",
        }
    }
}
