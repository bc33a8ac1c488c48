//! Deterministic `Clock` implementation for tests.

use chrono::{DateTime, TimeZone, Utc};
use stagehand_core::clock::Clock;

/// A clock that always returns a fixed point in time.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Default for FixedClock {
    /// Midnight UTC on 2024-02-14.
    fn default() -> Self {
        Self(
            Utc.with_ymd_and_hms(2024, 2, 14, 0, 0, 0)
                .single()
                .unwrap_or(DateTime::UNIX_EPOCH),
        )
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
