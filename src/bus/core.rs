//! # The event bus.
//!
//! [`Bus<T>`] maintains an ordered sequence of subscription records and
//! delivers payloads to them, honoring each record's execution context,
//! weak ownership and removal semantics.
//!
//! ## Ordering guarantees
//! - Within one `raise`, records are processed in registration order.
//! - Inline records execute before `raise` returns (true synchronous call).
//! - Context records are *submitted* in order; execution order across
//!   distinct contexts is not guaranteed, but two records sharing one
//!   serial context execute in submission order.
//!
//! ## Locking
//! The sequence and the change hook each live behind a `std::sync::Mutex`.
//! No lock is held while user code (a handler or the hook) runs, so
//! handlers may re-enter the bus freely: register, dispose or raise from
//! inside a handler never deadlocks.
//!
//! ## Example
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use eventor::Bus;
//!
//! struct Sink {
//!     values: Mutex<Vec<i32>>,
//! }
//!
//! impl Sink {
//!     fn push(&self, value: &i32) {
//!         self.values.lock().unwrap().push(*value);
//!     }
//! }
//!
//! let bus: Bus<i32> = Bus::new();
//! let sink = Arc::new(Sink { values: Mutex::new(Vec::new()) });
//!
//! let handle = bus.register(&sink, Sink::push);
//! bus.raise(5);
//! assert_eq!(*sink.values.lock().unwrap(), [5]);
//!
//! handle.dispose();
//! bus.raise(6); // no subscribers left
//! assert_eq!(bus.handlers_count(), 0);
//! ```

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::bus::handle::SubscriptionHandle;
use crate::bus::{Handler, Subscription, SubscriptionRef};
use crate::dispatch::{Dispatch, DispatchRef};

/// Global sequence counter for subscription ids.
static SUBSCRIPTION_SEQ: AtomicU64 = AtomicU64::new(0);

/// Hook invoked after every mutation of the subscription sequence.
///
/// Receives the bus and the records present in the new set but absent
/// from the old one. A pure removal fires with an empty slice; removals
/// are not itemized.
type ChangeHook<T> = Arc<dyn Fn(&Bus<T>, &[SubscriptionRef<T>]) + Send + Sync>;

/// State shared between bus handles, disposal handles and records.
pub(crate) struct BusShared<T> {
    subscriptions: Mutex<Vec<SubscriptionRef<T>>>,
    on_change: Mutex<Option<ChangeHook<T>>>,
}

impl<T: Send + Sync + 'static> BusShared<T> {
    fn lock_subscriptions(&self) -> MutexGuard<'_, Vec<SubscriptionRef<T>>> {
        // No user code runs under the lock, so a poisoned guard only means
        // a panic elsewhere unwound through the bus; the data is intact.
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_hook(&self) -> MutexGuard<'_, Option<ChangeHook<T>>> {
        self.on_change.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Removes the record with `id`, firing the change hook if present.
    ///
    /// Returns whether a record was actually removed; repeated calls for
    /// the same id are no-ops.
    pub(crate) fn remove(shared: &Arc<Self>, id: u64) -> bool {
        let removed = {
            let mut subscriptions = shared.lock_subscriptions();
            let before = subscriptions.len();
            subscriptions.retain(|record| record.id() != id);
            subscriptions.len() != before
        };
        if removed {
            let bus = Bus {
                shared: Arc::clone(shared),
            };
            bus.notify_change(&[]);
        }
        removed
    }

    pub(crate) fn contains(&self, id: u64) -> bool {
        self.lock_subscriptions()
            .iter()
            .any(|record| record.id() == id)
    }
}

/// Typed multi-subscriber event bus.
///
/// `Bus<T>` is a cheap cloneable handle over shared state: clones observe
/// and mutate the same subscription sequence. The bus lives as long as any
/// handle does; once the last handle drops, outstanding
/// [`SubscriptionHandle`]s become inert and disposing them is a no-op.
pub struct Bus<T> {
    shared: Arc<BusShared<T>>,
}

impl<T> Clone for Bus<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Send + Sync + 'static> Default for Bus<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync + 'static> Bus<T> {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(BusShared {
                subscriptions: Mutex::new(Vec::new()),
                on_change: Mutex::new(None),
            }),
        }
    }

    /// Registers a method-shaped handler invoked inline.
    ///
    /// `handler` is called as `handler(&target, &payload)` against the
    /// resolved target, on whichever thread called `raise`. The target is
    /// held weakly; once it is dropped the record removes itself the next
    /// time it would fire.
    ///
    /// The returned handle is the only way to unsubscribe explicitly;
    /// dropping it leaves the subscription active.
    #[must_use]
    pub fn register<O, F>(&self, target: &Arc<O>, handler: F) -> SubscriptionHandle<T>
    where
        O: Send + Sync + 'static,
        F: Fn(&O, &T) + Send + Sync + 'static,
    {
        self.insert(erase_target(target), None, method_handler(handler))
    }

    /// Registers a method-shaped handler invoked on `context`.
    ///
    /// Delivery submits a job to the context and returns immediately;
    /// jobs submitted to one serial context run in submission order.
    #[must_use]
    pub fn register_on<O, C, F>(&self, target: &Arc<O>, context: C, handler: F) -> SubscriptionHandle<T>
    where
        O: Send + Sync + 'static,
        C: Dispatch,
        F: Fn(&O, &T) + Send + Sync + 'static,
    {
        self.insert(
            erase_target(target),
            Some(Arc::new(context) as DispatchRef),
            method_handler(handler),
        )
    }

    /// Registers a free callback invoked inline.
    ///
    /// `target` is tracked weakly purely to gate the handler's liveness:
    /// once it is dropped the record removes itself instead of invoking.
    /// The closure should capture the target weakly (or not at all):
    /// capturing it strongly defeats the liveness gate, and capturing the
    /// bus strongly creates a reference cycle.
    #[must_use]
    pub fn register_closure<O, F>(&self, target: &Arc<O>, handler: F) -> SubscriptionHandle<T>
    where
        O: Send + Sync + 'static,
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.insert(erase_target(target), None, Handler::Closure(Box::new(handler)))
    }

    /// Registers a free callback invoked on `context`.
    #[must_use]
    pub fn register_closure_on<O, C, F>(
        &self,
        target: &Arc<O>,
        context: C,
        handler: F,
    ) -> SubscriptionHandle<T>
    where
        O: Send + Sync + 'static,
        C: Dispatch,
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.insert(
            erase_target(target),
            Some(Arc::new(context) as DispatchRef),
            Handler::Closure(Box::new(handler)),
        )
    }

    /// Raises a payload to every current subscription (wraps it in `Arc`).
    ///
    /// Takes a snapshot of the sequence first: records added during this
    /// raise are not delivered to, records removed during it still are.
    /// Inline records run before this method returns; context records are
    /// submitted fire-and-forget.
    pub fn raise(&self, payload: T) {
        self.raise_arc(Arc::new(payload));
    }

    /// Raises a pre-allocated `Arc<T>` to every current subscription.
    ///
    /// Preferred over [`raise`](Self::raise) when the payload is already
    /// shared (no extra allocation).
    pub fn raise_arc(&self, payload: Arc<T>) {
        let snapshot: Vec<SubscriptionRef<T>> = self.shared.lock_subscriptions().clone();
        deliver(&snapshot, &payload);
    }

    /// Raises a payload to exactly the supplied records.
    ///
    /// Used to redeliver to a specific group, e.g. a subset captured from
    /// [`subscriptions`](Self::subscriptions) or from the change hook.
    /// Per-record rules (context, dead-target disposal) apply unchanged.
    pub fn raise_on(&self, payload: T, subscriptions: &[SubscriptionRef<T>]) {
        self.raise_arc_on(Arc::new(payload), subscriptions);
    }

    /// Raises a pre-allocated `Arc<T>` to exactly the supplied records.
    pub fn raise_arc_on(&self, payload: Arc<T>, subscriptions: &[SubscriptionRef<T>]) {
        deliver(subscriptions, &payload);
    }

    /// Number of currently registered subscriptions.
    ///
    /// A record whose target has already been dropped still counts until
    /// a raise discovers it.
    pub fn handlers_count(&self) -> usize {
        self.shared.lock_subscriptions().len()
    }

    /// Snapshot of the current sequence, in registration order.
    pub fn subscriptions(&self) -> Vec<SubscriptionRef<T>> {
        self.shared.lock_subscriptions().clone()
    }

    /// Installs the change-notification hook, replacing any previous one.
    ///
    /// The hook fires synchronously after every mutation of the sequence,
    /// with the bus and the newly added records (empty for a pure
    /// removal). It runs with no bus lock held, so it may call back into
    /// the bus.
    pub fn set_on_change<F>(&self, hook: F)
    where
        F: Fn(&Bus<T>, &[SubscriptionRef<T>]) + Send + Sync + 'static,
    {
        *self.shared.lock_hook() = Some(Arc::new(hook));
    }

    /// Removes the change-notification hook.
    pub fn clear_on_change(&self) {
        *self.shared.lock_hook() = None;
    }

    /// Removes every subscription.
    ///
    /// Fires the change hook once (empty additions) if the sequence was
    /// non-empty.
    pub fn clear(&self) {
        let removed = {
            let mut subscriptions = self.shared.lock_subscriptions();
            let before = subscriptions.len();
            subscriptions.clear();
            before > 0
        };
        if removed {
            self.notify_change(&[]);
        }
    }

    fn insert(
        &self,
        target: Weak<dyn Any + Send + Sync>,
        context: Option<DispatchRef>,
        handler: Handler<T>,
    ) -> SubscriptionHandle<T> {
        let id = SUBSCRIPTION_SEQ.fetch_add(1, AtomicOrdering::Relaxed);
        let record: SubscriptionRef<T> = Arc::new(Subscription::new(
            id,
            target,
            context,
            handler,
            Arc::downgrade(&self.shared),
        ));
        self.shared.lock_subscriptions().push(Arc::clone(&record));
        self.notify_change(std::slice::from_ref(&record));
        SubscriptionHandle::new(Arc::downgrade(&self.shared), id)
    }

    fn notify_change(&self, added: &[SubscriptionRef<T>]) {
        let hook = self.shared.lock_hook().clone();
        if let Some(hook) = hook {
            hook(self, added);
        }
    }
}

impl Bus<()> {
    /// Raises the unit payload.
    ///
    /// Equivalent to `raise(())` on a unit-payload bus.
    pub fn trigger(&self) {
        self.raise(());
    }
}

/// Delivers one payload to each record, in sequence order.
fn deliver<T: Send + Sync + 'static>(records: &[SubscriptionRef<T>], payload: &Arc<T>) {
    for record in records {
        Subscription::deliver(record, payload);
    }
}

/// Type-erases a target for weak liveness tracking.
fn erase_target<O: Send + Sync + 'static>(target: &Arc<O>) -> Weak<dyn Any + Send + Sync> {
    let erased = target.clone() as Arc<dyn Any + Send + Sync>;
    Arc::downgrade(&erased)
}

/// Wraps a bound-method-shaped callback for type-erased invocation.
fn method_handler<O, F, T>(handler: F) -> Handler<T>
where
    O: Send + Sync + 'static,
    F: Fn(&O, &T) + Send + Sync + 'static,
{
    Handler::Method(Box::new(move |target, payload| {
        if let Some(target) = target.downcast_ref::<O>() {
            handler(target, payload);
        }
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;

    fn counting_closure(counter: &Arc<AtomicUsize>) -> impl Fn(&i32) + Send + Sync + 'static {
        let counter = Arc::clone(counter);
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_raise_delivers_in_registration_order() {
        let bus: Bus<i32> = Bus::new();
        let log: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let a = Arc::new(());
        let b = Arc::new(());

        let log_a = Arc::clone(&log);
        let _first = bus.register_closure(&a, move |value| {
            log_a.lock().unwrap().push(format!("a:{value}"));
        });
        let log_b = Arc::clone(&log);
        let _second = bus.register_closure(&b, move |value| {
            log_b.lock().unwrap().push(format!("b:{value}"));
        });

        bus.raise(5);

        assert_eq!(*log.lock().unwrap(), ["a:5", "b:5"]);
        assert_eq!(bus.handlers_count(), 2);
    }

    #[test]
    fn test_each_live_subscription_invoked_exactly_once() {
        let bus: Bus<i32> = Bus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let target = Arc::new(());

        for _ in 0..3 {
            let _ = bus.register_closure(&target, counting_closure(&counter));
        }
        bus.raise(1);

        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_dispose_prevents_all_future_raises() {
        let bus: Bus<i32> = Bus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let target = Arc::new(());

        let handle = bus.register_closure(&target, counting_closure(&counter));
        handle.dispose();

        bus.raise(5);
        bus.raise(6);

        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(bus.handlers_count(), 0);
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let bus: Bus<i32> = Bus::new();
        let target = Arc::new(());
        let other = Arc::new(());

        let handle = bus.register_closure(&target, |_| {});
        let _keep = bus.register_closure(&other, |_| {});

        handle.dispose();
        handle.dispose();
        handle.dispose();

        assert_eq!(bus.handlers_count(), 1);
    }

    #[test]
    fn test_dispose_after_bus_dropped_is_noop() {
        let bus: Bus<i32> = Bus::new();
        let target = Arc::new(());
        let handle = bus.register_closure(&target, |_| {});

        drop(bus);
        handle.dispose(); // must not panic
        assert!(!handle.is_active());
    }

    #[test]
    fn test_dead_target_removed_on_raise_without_invocation() {
        let bus: Bus<i32> = Bus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let target = Arc::new(());

        let _handle = bus.register_closure(&target, counting_closure(&counter));
        drop(target);
        assert_eq!(bus.handlers_count(), 1, "not removed until a raise runs");

        bus.raise(5);

        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(bus.handlers_count(), 0);
    }

    #[test]
    fn test_raise_on_subset_targets_only_that_subset() {
        let bus: Bus<i32> = Bus::new();
        let hits_a = Arc::new(AtomicUsize::new(0));
        let hits_b = Arc::new(AtomicUsize::new(0));
        let a = Arc::new(());
        let b = Arc::new(());

        let _first = bus.register_closure(&a, counting_closure(&hits_a));
        let _second = bus.register_closure(&b, counting_closure(&hits_b));

        let records = bus.subscriptions();
        bus.raise_on(9, &records[1..]);

        assert_eq!(hits_a.load(Ordering::SeqCst), 0);
        assert_eq!(hits_b.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_change_hook_reports_additions_and_fires_on_removal() {
        let bus: Bus<i32> = Bus::new();
        let observed: Arc<Mutex<Vec<(usize, usize)>>> = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&observed);
        bus.set_on_change(move |bus, added| {
            log.lock().unwrap().push((added.len(), bus.handlers_count()));
        });

        let target = Arc::new(());
        let first = bus.register_closure(&target, |_| {});
        let _second = bus.register_closure(&target, |_| {});
        first.dispose();
        first.dispose(); // no mutation, no firing

        assert_eq!(*observed.lock().unwrap(), [(1, 1), (1, 2), (0, 1)]);
    }

    #[test]
    fn test_subscriptions_added_during_raise_not_delivered_that_pass() {
        let bus: Bus<i32> = Bus::new();
        let late_hits = Arc::new(AtomicUsize::new(0));
        let target = Arc::new(());

        let bus_inside = bus.clone();
        let target_inside = Arc::clone(&target);
        let late = Arc::clone(&late_hits);
        let _outer = bus.register_closure(&target, move |_| {
            let _ = bus_inside.register_closure(&target_inside, counting_closure(&late));
        });

        bus.raise(1);
        assert_eq!(late_hits.load(Ordering::SeqCst), 0);
        assert_eq!(bus.handlers_count(), 2);

        bus.raise(2);
        assert_eq!(late_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_trigger_equals_raise_unit() {
        let bus: Bus<()> = Bus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let target = Arc::new(());

        let hits = Arc::clone(&counter);
        let _handle = bus.register_closure(&target, move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
        });

        bus.trigger();
        bus.raise(());

        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_clear_removes_everything_and_fires_once() {
        let bus: Bus<i32> = Bus::new();
        let target = Arc::new(());
        let _a = bus.register_closure(&target, |_| {});
        let _b = bus.register_closure(&target, |_| {});

        let firings = Arc::new(AtomicUsize::new(0));
        let count = Arc::clone(&firings);
        bus.set_on_change(move |_, added| {
            assert!(added.is_empty());
            count.fetch_add(1, Ordering::SeqCst);
        });

        bus.clear();
        bus.clear(); // already empty, no firing

        assert_eq!(bus.handlers_count(), 0);
        assert_eq!(firings.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clones_share_one_sequence() {
        let bus: Bus<i32> = Bus::new();
        let alias = bus.clone();
        let target = Arc::new(());

        let _handle = bus.register_closure(&target, |_| {});

        assert_eq!(alias.handlers_count(), 1);
    }
}
