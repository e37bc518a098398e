//! # Simple logging change hook for debugging and demos.
//!
//! [`LogWriter`] prints subscription-set changes to stdout in a
//! human-readable format.
//!
//! ## Output format
//! ```text
//! [subscribed] id=3 context=telemetry total=2
//! [subscribed] id=4 context=inline total=3
//! [unsubscribed] remaining=2
//! ```
//!
//! ## Example
//! ```no_run
//! # use eventor::{Bus, LogWriter};
//! let bus: Bus<u32> = Bus::new();
//! LogWriter::attach(&bus);
//! // every register/dispose now prints a line
//! ```

use crate::Bus;

/// Simple stdout change logger.
///
/// Enabled via the `logging` feature. Installs itself as the bus's change
/// hook, so attaching replaces any hook already set.
///
/// Not intended for production use - set a custom hook for structured
/// logging or metrics collection.
pub struct LogWriter;

impl LogWriter {
    /// Installs the logger on `bus` as its change-notification hook.
    pub fn attach<T: Send + Sync + 'static>(bus: &Bus<T>) {
        bus.set_on_change(|bus, added| {
            if added.is_empty() {
                println!("[unsubscribed] remaining={}", bus.handlers_count());
            }
            for record in added {
                println!(
                    "[subscribed] id={} context={} total={}",
                    record.id(),
                    record.context_name().unwrap_or("inline"),
                    bus.handlers_count()
                );
            }
        });
    }
}
