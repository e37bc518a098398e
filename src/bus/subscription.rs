//! # Subscription records.
//!
//! A [`Subscription`] pairs a weakly-held target object, an optional
//! execution context and a handler. Records are owned by the bus's
//! sequence and shared (via [`SubscriptionRef`]) with anyone who needs
//! to address them, e.g. for subset raises.
//!
//! ## Rules
//! - The target reference is weak: a record never keeps its owner alive.
//! - The back-reference to the bus is weak: records never keep the bus
//!   alive either, so no reference cycle forms.
//! - If the target is gone at invocation time, the record removes itself
//!   from the bus instead of invoking.

use std::any::Any;
use std::sync::{Arc, Weak};

use crate::bus::BusShared;
use crate::dispatch::DispatchRef;

/// Shared handle to a subscription record (`Arc<Subscription<T>>`).
pub type SubscriptionRef<T> = Arc<Subscription<T>>;

/// How a subscription's callback is shaped.
///
/// Dispatched by pattern match at invocation time:
/// - `Method` is invoked against the resolved, downcast target;
/// - `Closure` is invoked with the payload directly (the target weak
///   reference still gates liveness).
pub(crate) enum Handler<T> {
    Method(Box<dyn Fn(&(dyn Any + Send + Sync), &T) + Send + Sync>),
    Closure(Box<dyn Fn(&T) + Send + Sync>),
}

/// One registered interest in a bus's events.
///
/// Created by the `register*` methods on [`Bus`](crate::Bus); removed by
/// the returned [`SubscriptionHandle`](crate::SubscriptionHandle), by
/// [`Bus::clear`](crate::Bus::clear), or automatically the first time it
/// is invoked after its target has been dropped.
pub struct Subscription<T> {
    id: u64,
    target: Weak<dyn Any + Send + Sync>,
    context: Option<DispatchRef>,
    handler: Handler<T>,
    bus: Weak<BusShared<T>>,
}

impl<T: Send + Sync + 'static> Subscription<T> {
    pub(crate) fn new(
        id: u64,
        target: Weak<dyn Any + Send + Sync>,
        context: Option<DispatchRef>,
        handler: Handler<T>,
        bus: Weak<BusShared<T>>,
    ) -> Self {
        Self {
            id,
            target,
            context,
            handler,
            bus,
        }
    }

    /// Unique id of this record within the process.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns true while the target object is still resolvable.
    ///
    /// A record whose target has been dropped stays in the bus until the
    /// next invocation discovers it and removes it.
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.target.strong_count() > 0
    }

    /// Name of the execution context, or `None` for an inline record.
    pub fn context_name(&self) -> Option<&str> {
        self.context.as_ref().map(|ctx| ctx.name())
    }

    /// Delivers one payload to this record, honoring its context.
    ///
    /// Inline records invoke synchronously; context records submit a job
    /// and return immediately. A failed submission (queue full or closed)
    /// drops this one delivery only.
    pub(crate) fn deliver(record: &Arc<Self>, payload: &Arc<T>) {
        match &record.context {
            None => record.invoke(payload),
            Some(ctx) => {
                let record = Arc::clone(record);
                let payload = Arc::clone(payload);
                let _ = ctx.submit(Box::new(move || record.invoke(&payload)));
            }
        }
    }

    /// Resolves the target and runs the handler, or self-disposes.
    pub(crate) fn invoke(&self, payload: &T) {
        let Some(target) = self.target.upgrade() else {
            self.dispose();
            return;
        };
        match &self.handler {
            Handler::Method(call) => call(target.as_ref(), payload),
            Handler::Closure(call) => call(payload),
        }
    }

    /// Removes this record from its bus, if the bus still exists.
    pub(crate) fn dispose(&self) {
        if let Some(shared) = self.bus.upgrade() {
            BusShared::remove(&shared, self.id);
        }
    }
}
