//! # Core dispatch trait
//!
//! `Dispatch` is the extension point for plugging custom execution
//! contexts into the bus. The contract is small on purpose: accept a
//! no-argument unit of work, fire-and-forget.
//!
//! ## Contract
//! - `submit` must not block the caller; reject with
//!   [`SubmitError`](crate::SubmitError) instead of waiting.
//! - A *serial* context must run jobs in submission order. Nothing is
//!   guaranteed across distinct contexts.
//! - Implementations may drop jobs on overflow or shutdown; the bus
//!   treats a failed submission as a dropped delivery for that one
//!   record.

use std::sync::Arc;

use crate::error::SubmitError;

/// A unit of work submitted to an execution context.
pub type Job = Box<dyn FnOnce() + Send>;

/// Shared handle to an execution context (`Arc<dyn Dispatch>`).
pub type DispatchRef = Arc<dyn Dispatch>;

/// Contract for execution contexts.
///
/// Called from whichever thread invokes `raise`; implementations must be
/// safe to share across threads.
pub trait Dispatch: Send + Sync + 'static {
    /// Accepts a job for later execution, without waiting for it.
    fn submit(&self, job: Job) -> Result<(), SubmitError>;

    /// Human-readable name (for logs/diagnostics).
    fn name(&self) -> &str {
        "dispatch"
    }
}

impl<D: Dispatch + ?Sized> Dispatch for Arc<D> {
    fn submit(&self, job: Job) -> Result<(), SubmitError> {
        (**self).submit(job)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
