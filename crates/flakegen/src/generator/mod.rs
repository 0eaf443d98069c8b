mod atomic;
mod interface;
mod lock;
mod mutex;

pub use atomic::*;
pub use interface::*;
pub use lock::*;
pub(crate) use mutex::*;

#[cfg(feature = "tracing")]
use tracing::warn;

use crate::{Error, MAX_NODE_ID, Result, TimeSource};

/// Checks that `node_id` fits in the node-id field.
pub(crate) fn validate_node_id(node_id: i64) -> Result<u64> {
    u64::try_from(node_id)
        .ok()
        .filter(|&node_id| node_id <= MAX_NODE_ID)
        .ok_or(Error::InvalidArgument {
            node_id,
            max: MAX_NODE_ID,
        })
}

/// Reads `time` and converts the reading to milliseconds since
/// `custom_epoch`.
///
/// `last` is the timestamp of the last issued ID, if any. A reading below the
/// custom epoch after an ID was issued is a clock regression like any other;
/// before the first ID it is reported as [`Error::ClockBeforeEpoch`].
pub(crate) fn elapsed_since_epoch<T: TimeSource>(
    time: &T,
    custom_epoch: u64,
    last: Option<u64>,
) -> Result<u64> {
    let now_millis = time.current_millis();
    match (now_millis.checked_sub(custom_epoch), last) {
        (Some(elapsed), _) => Ok(elapsed),
        (None, Some(last)) => Err(clock_regression(last, 0)),
        (None, None) => Err(Error::ClockBeforeEpoch {
            now_millis,
            epoch_millis: custom_epoch,
        }),
    }
}

#[cold]
#[inline(never)]
pub(crate) fn clock_regression(last_timestamp: u64, current_timestamp: u64) -> Error {
    #[cfg(feature = "tracing")]
    warn!(
        last_timestamp,
        current_timestamp, "clock moved backwards, refusing to generate id"
    );
    Error::ClockRegression {
        last_timestamp,
        current_timestamp,
    }
}
