//! Execution contexts the bus dispatches onto.
//!
//! The bus itself performs no threading: it invokes inline records
//! synchronously and hands context records to a [`Dispatch`]
//! implementation as fire-and-forget jobs. [`SerialQueue`] is the
//! provided implementation: a bounded queue drained by one worker task,
//! so jobs run in strict submission order.

mod dispatch;
mod serial;

pub use dispatch::{Dispatch, DispatchRef, Job};
pub use serial::SerialQueue;
