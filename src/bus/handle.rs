//! Disposal handles returned by `register*`.

use std::sync::Weak;

use crate::bus::BusShared;

/// Handle that can deregister one subscription, idempotently.
///
/// Holds a weak reference to the bus: disposing after the bus has been
/// dropped is a safe no-op. Dropping the handle itself does **not**
/// dispose the subscription: an undisposed subscription stays active for
/// as long as its target and its bus live.
pub struct SubscriptionHandle<T> {
    bus: Weak<BusShared<T>>,
    id: u64,
}

impl<T: Send + Sync + 'static> SubscriptionHandle<T> {
    pub(crate) fn new(bus: Weak<BusShared<T>>, id: u64) -> Self {
        Self { bus, id }
    }

    /// Id of the subscription this handle controls.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Removes the subscription from the bus, if it is still present.
    ///
    /// Idempotent: repeated calls, and calls after the bus has been
    /// dropped, are no-ops. Fires the bus's change hook (with empty
    /// additions) only when a record was actually removed.
    pub fn dispose(&self) {
        if let Some(shared) = self.bus.upgrade() {
            BusShared::remove(&shared, self.id);
        }
    }

    /// Returns true while the bus exists and still contains this record.
    pub fn is_active(&self) -> bool {
        self.bus
            .upgrade()
            .map(|shared| shared.contains(self.id))
            .unwrap_or(false)
    }
}
