//! Monotonic timestamps for store mutations

use chrono::{DateTime, Duration, Utc};

/// Wall clock that never hands out the same instant twice
///
/// Two mutations in quick succession still get distinct, ordered
/// `updated_at`/`last_modified` values.
#[derive(Debug, Clone, Default)]
pub struct Clock {
    last: Option<DateTime<Utc>>,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure future timestamps sort after `seen` (e.g. loaded from disk)
    pub fn observe(&mut self, seen: DateTime<Utc>) {
        if self.last.map_or(true, |last| seen > last) {
            self.last = Some(seen);
        }
    }

    pub fn now(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.last {
            if now <= last {
                now = last + Duration::nanoseconds(1);
            }
        }
        self.last = Some(now);
        now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamps_strictly_increase() {
        let mut clock = Clock::new();
        let stamps: Vec<_> = (0..100).map(|_| clock.now()).collect();
        assert!(stamps.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_observe_future_timestamp() {
        let mut clock = Clock::new();
        let future = Utc::now() + Duration::hours(1);
        clock.observe(future);
        assert!(clock.now() > future);
    }
}
