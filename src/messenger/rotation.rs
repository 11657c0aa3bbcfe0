//! Time-window rotation across pool members.

use chrono::Utc;

/// Length of one rotation window in seconds.
pub const ROTATION_PERIOD_SECS: u64 = 300;

/// Source of wall-clock time for the pool.
pub trait Clock: Send + Sync {
    fn epoch_seconds(&self) -> u64;
}

/// The real clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn epoch_seconds(&self) -> u64 {
        u64::try_from(Utc::now().timestamp()).unwrap_or(0)
    }
}

/// Pool member used at `epoch_seconds`.
///
/// Every caller in the same window picks the same member, with no shared
/// state between pools or across restarts.
pub fn rotation_index(epoch_seconds: u64, pool_size: usize) -> usize {
    if pool_size <= 1 {
        return 0;
    }
    ((epoch_seconds / ROTATION_PERIOD_SECS) % pool_size as u64) as usize
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::*;

    /// A clock that only moves when told to.
    #[derive(Debug, Default)]
    pub struct FixedClock(AtomicU64);

    impl FixedClock {
        pub fn at(seconds: u64) -> Self {
            Self(AtomicU64::new(seconds))
        }

        pub fn set(&self, seconds: u64) {
            self.0.store(seconds, Ordering::SeqCst);
        }
    }

    impl Clock for FixedClock {
        fn epoch_seconds(&self) -> u64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn test_stable_within_window() {
        for pool_size in 1..=5 {
            let window_start = 1_700_000_100 - (1_700_000_100 % ROTATION_PERIOD_SECS);
            let expected = rotation_index(window_start, pool_size);
            for offset in 0..ROTATION_PERIOD_SECS {
                assert_eq!(rotation_index(window_start + offset, pool_size), expected);
            }
        }
    }

    #[test]
    fn test_changes_at_window_boundary() {
        let boundary = 300 * 1_000;
        assert_eq!(rotation_index(boundary - 1, 3), 999 % 3);
        assert_eq!(rotation_index(boundary, 3), 1_000 % 3);
        assert_ne!(rotation_index(boundary - 1, 3), rotation_index(boundary, 3));
    }

    #[test]
    fn test_cycles_through_every_member() {
        let picks: Vec<usize> = (0..4)
            .map(|w| rotation_index(w * ROTATION_PERIOD_SECS, 4))
            .collect();
        assert_eq!(picks, vec![0, 1, 2, 3]);
        assert_eq!(rotation_index(4 * ROTATION_PERIOD_SECS, 4), 0);
    }

    #[test]
    fn test_single_member_pool() {
        for t in [0, 299, 300, 1_700_000_000, u64::MAX] {
            assert_eq!(rotation_index(t, 1), 0);
        }
    }

    #[test]
    fn test_system_clock_is_after_2020() {
        assert!(SystemClock.epoch_seconds() > 1_577_836_800);
    }
}
