//! Time provider abstraction for testable time-dependent logic

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Seconds in one day, used when converting `completed_within_days`
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Abstraction over system time for testable time-dependent logic
pub trait TimeProvider: Send + Sync {
    /// Get the current system time (for timestamps)
    fn system_time(&self) -> SystemTime;

    /// Current time as whole seconds since the Unix epoch
    fn unix_timestamp(&self) -> i64 {
        match self.system_time().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => elapsed.as_secs() as i64,
            Err(before_epoch) => -(before_epoch.duration().as_secs() as i64),
        }
    }
}

/// Production time provider using actual system time
#[derive(Debug, Default, Clone)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Frozen time provider for deterministic runs and tests
#[derive(Debug, Clone, Copy)]
pub struct MockTimeProvider {
    current_system_time: SystemTime,
}

impl MockTimeProvider {
    /// Create a mock provider frozen at the current system time
    pub fn new() -> Self {
        Self::at(SystemTime::now())
    }

    /// Create a mock provider frozen at the given time
    pub fn at(system_time: SystemTime) -> Self {
        Self {
            current_system_time: system_time,
        }
    }

    /// Create a mock provider frozen at the given Unix timestamp
    pub fn at_unix(seconds: u64) -> Self {
        Self::at(UNIX_EPOCH + Duration::from_secs(seconds))
    }
}

impl Default for MockTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeProvider for MockTimeProvider {
    fn system_time(&self) -> SystemTime {
        self.current_system_time
    }
}

/// Oldest acceptable completion time for a run `days` days back from now.
pub fn freshness_cutoff(time: &dyn TimeProvider, days: u32) -> i64 {
    time.unix_timestamp() - i64::from(days) * SECONDS_PER_DAY
}
