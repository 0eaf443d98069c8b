use thiserror::Error;

/// A result type defaulting to the crate [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants that `flakegen` can emit.
///
/// None of these are retried internally. [`Error::InvalidArgument`] is raised
/// at construction time; the clock variants are raised from `next()` and
/// leave the generator state untouched, so a later call can succeed once the
/// host clock is sane again.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Error)]
#[non_exhaustive]
pub enum Error {
    /// The node id does not fit in the node-id field.
    #[error("node id {node_id} is outside the valid range [0, {max}]")]
    InvalidArgument {
        /// The rejected node id.
        node_id: i64,
        /// The largest accepted node id.
        max: u64,
    },

    /// The clock reported a timestamp earlier than the last one used.
    ///
    /// Issuing an ID here could reuse a past `(timestamp, sequence)` pair, so
    /// the call fails instead. Fix clock synchronization on the host (e.g.
    /// forbid backward NTP steps).
    #[error(
        "clock moved backwards: last timestamp {last_timestamp}, current timestamp {current_timestamp}"
    )]
    ClockRegression {
        /// Milliseconds since the custom epoch of the last issued ID.
        last_timestamp: u64,
        /// Milliseconds since the custom epoch just read from the clock.
        current_timestamp: u64,
    },

    /// The clock reads earlier than the configured custom epoch and no ID has
    /// been issued yet.
    ///
    /// Once an ID exists, the same reading is a [`Error::ClockRegression`]
    /// with a `current_timestamp` of `0`.
    #[error("clock reads {now_millis} ms, which is before the custom epoch {epoch_millis} ms")]
    ClockBeforeEpoch {
        /// Current clock reading in milliseconds since the Unix epoch.
        now_millis: u64,
        /// The configured custom epoch in milliseconds since the Unix epoch.
        epoch_millis: u64,
    },

    /// The elapsed time since the custom epoch no longer fits in the
    /// timestamp field.
    #[error("timestamp {timestamp} exceeds the 41-bit timestamp field")]
    TimestampOverflow {
        /// Milliseconds since the custom epoch.
        timestamp: u64,
    },

    /// The generator lock was poisoned by a panicking thread.
    ///
    /// Not available with the `parking-lot` feature, whose mutex does not
    /// poison.
    #[cfg_attr(docsrs, doc(cfg(not(feature = "parking-lot"))))]
    #[cfg(not(feature = "parking-lot"))]
    #[error("generator lock was poisoned")]
    LockPoisoned,
}

#[cfg(not(feature = "parking-lot"))]
use crate::generator::{MutexGuard, PoisonError};
#[cfg(not(feature = "parking-lot"))]
impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_argument_message_names_range() {
        let err = Error::InvalidArgument {
            node_id: 1024,
            max: 1023,
        };
        assert_eq!(
            err.to_string(),
            "node id 1024 is outside the valid range [0, 1023]"
        );
    }

    #[test]
    fn clock_regression_message_carries_both_timestamps() {
        let err = Error::ClockRegression {
            last_timestamp: 10,
            current_timestamp: 7,
        };
        assert_eq!(
            err.to_string(),
            "clock moved backwards: last timestamp 10, current timestamp 7"
        );
    }
}
