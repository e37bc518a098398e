//! # eventor
//!
//! **Eventor** is a typed multi-subscriber event bus for Rust.
//!
//! A [`Bus<T>`] holds an ordered set of subscriptions and delivers payloads
//! to them on demand. Subscriptions hold their owning object *weakly*: a bus
//! never keeps a subscriber alive, and a subscription whose owner has been
//! dropped removes itself the first time it would fire. Each subscription can
//! run inline on the raising thread or on a caller-chosen execution context
//! such as a [`SerialQueue`].
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   raise(payload)
//!       │  snapshot of the subscription sequence, registration order
//!       │
//!       ├──► subscription A (inline)  ──► handler runs before raise returns
//!       │
//!       ├──► subscription B (queue 1) ──► [bounded queue] ──► worker ──► handler
//!       │                                                       └─ panic → isolated, counted
//!       └──► subscription C (queue 2) ──► [bounded queue] ──► worker ──► handler
//! ```
//!
//! ### Subscription lifecycle
//! ```text
//! register(target, handler) ──► active
//!
//!   active ──► disposed   via handle.dispose()            (explicit)
//!   active ──► disposed   via raise finding target dead   (automatic)
//!
//! disposed is terminal; the change hook fires after every mutation.
//! ```
//!
//! ## Rules
//! - **Registration order**: one `raise` delivers in registration order.
//! - **Snapshot semantics**: subscriptions added during a raise are not
//!   delivered to by that raise; subscriptions removed during a raise still
//!   receive that raise's payload.
//! - **Weak ownership**: neither the bus nor a [`SubscriptionHandle`] keeps
//!   the target alive; a dead target is discovered at invocation time and
//!   the record is removed instead of invoked.
//! - **Context ordering**: two subscriptions sharing one serial context run
//!   in submission order; across distinct contexts there is no ordering.
//!
//! ## Features
//! | Area              | Description                                            | Key types                     |
//! |-------------------|--------------------------------------------------------|-------------------------------|
//! | **Bus**           | Register, raise, subset raise, count, change hook.     | [`Bus`], [`SubscriptionRef`]  |
//! | **Disposal**      | Idempotent unsubscription handles.                     | [`SubscriptionHandle`]        |
//! | **Dispatch**      | Execution-context seam and the serial implementation.  | [`Dispatch`], [`SerialQueue`] |
//! | **Configuration** | Queue capacity tuning.                                 | [`QueueConfig`]               |
//! | **Errors**        | Typed submission failures.                             | [`SubmitError`]               |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use eventor::{Bus, SerialQueue};
//!
//! struct Telemetry {
//!     frames: Mutex<Vec<u64>>,
//! }
//!
//! impl Telemetry {
//!     fn on_frame(&self, frame: &u64) {
//!         self.frames.lock().unwrap().push(*frame);
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let bus: Bus<u64> = Bus::new();
//!     let telemetry = Arc::new(Telemetry { frames: Mutex::new(Vec::new()) });
//!
//!     // Inline: runs synchronously on the raising thread.
//!     let inline = bus.register(&telemetry, Telemetry::on_frame);
//!
//!     // Queued: runs on a dedicated serial worker, in submission order.
//!     let queue = SerialQueue::new("telemetry");
//!     let queued = bus.register_on(&telemetry, queue.clone(), Telemetry::on_frame);
//!
//!     bus.raise(42);
//!     queue.shutdown().await; // drain the worker before asserting
//!
//!     assert_eq!(*telemetry.frames.lock().unwrap(), [42, 42]);
//!
//!     inline.dispose();
//!     queued.dispose();
//!     assert_eq!(bus.handlers_count(), 0);
//! }
//! ```
mod bus;
mod config;
mod dispatch;
mod error;

// ---- Public re-exports ----

pub use bus::{Bus, Subscription, SubscriptionHandle, SubscriptionRef};
pub use config::QueueConfig;
pub use dispatch::{Dispatch, DispatchRef, Job, SerialQueue};
pub use error::SubmitError;

// Optional: expose a simple built-in change logger (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
mod log;
#[cfg(feature = "logging")]
pub use log::LogWriter;
