use std::time::{SystemTime, UNIX_EPOCH};

use crate::TimeSource;

/// Wall-clock time read from [`SystemTime::now`] on every call.
///
/// This clock follows host adjustments, including backward NTP steps, which
/// generators report as [`Error::ClockRegression`]. A host clock set before
/// 1970 reads as `0`.
///
/// [`Error::ClockRegression`]: crate::Error::ClockRegression
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn current_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_millis() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_EPOCH;

    #[test]
    fn reads_after_default_epoch() {
        assert!(SystemClock.current_millis() > DEFAULT_EPOCH);
    }
}
