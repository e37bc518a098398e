//! # Queue configuration.
//!
//! Provides [`QueueConfig`], the tuning knobs for a
//! [`SerialQueue`](crate::SerialQueue).
//!
//! ## Sentinel values
//! - `capacity = 0` → clamped to 1 (a bounded channel needs at least one
//!   slot)

/// Configuration for a serial queue.
///
/// ## Field semantics
/// - `capacity`: ring size of the job queue (min 1; clamped by the queue).
///   Submissions over a full queue are rejected with
///   [`SubmitError::Full`](crate::SubmitError::Full) and that one delivery
///   is dropped.
///
/// ## Notes
/// All fields are public for flexibility. Prefer the clamping accessor
/// over reading `capacity` directly.
#[derive(Clone, Copy, Debug)]
pub struct QueueConfig {
    /// Capacity of the job queue.
    ///
    /// Slow consumers whose queue fills up lose deliveries (the submitter
    /// sees [`SubmitError::Full`](crate::SubmitError::Full)); size this to
    /// the burstiness of the bus feeding it.
    pub capacity: usize,
}

impl QueueConfig {
    /// Returns the capacity clamped to a minimum of 1.
    ///
    /// The queue uses this value to avoid constructing an invalid channel.
    #[inline]
    pub fn capacity_clamped(&self) -> usize {
        self.capacity.max(1)
    }
}

impl Default for QueueConfig {
    /// Default configuration:
    ///
    /// - `capacity = 1024` (good baseline)
    fn default() -> Self {
        Self { capacity: 1024 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_capacity_clamps_to_one() {
        let config = QueueConfig { capacity: 0 };
        assert_eq!(config.capacity_clamped(), 1);
    }

    #[test]
    fn test_nonzero_capacity_passes_through() {
        let config = QueueConfig { capacity: 16 };
        assert_eq!(config.capacity_clamped(), 16);
    }
}
