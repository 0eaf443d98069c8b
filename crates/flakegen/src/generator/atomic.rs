use core::{cmp, fmt};
use std::sync::Arc;

use portable_atomic::{AtomicU64, Ordering};
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    DEFAULT_EPOCH, DerivedNodeId, Error, MAX_SEQUENCE, MAX_TIMESTAMP, ParsedId, Result,
    SnowflakeGenerator, SnowflakeId, SystemClock, TimeSource, derive_node_id,
    generator::{clock_regression, elapsed_since_epoch, validate_node_id, write_settings},
};

/// State word before the first ID. Generated IDs never set the reserved bit,
/// so this can't collide with a real ID.
const NO_ID_YET: u64 = u64::MAX;

/// A lock-free Snowflake ID generator.
///
/// The last issued ID doubles as the generator state: it already packs the
/// last timestamp and sequence, so each call is a compare-and-swap over one
/// [`AtomicU64`]. Callers that lose the race retry with a fresh clock reading.
/// On sequence exhaustion a caller spins on the clock without holding
/// anything, then retries the swap.
///
/// Same guarantees as [`IdGenerator`]; clones share state.
///
/// ## Recommended When
/// - You're in a multi-threaded environment
/// - Fair access is sacrificed for higher throughput
///
/// ## See Also
/// - [`IdGenerator`]
///
/// [`IdGenerator`]: crate::IdGenerator
pub struct AtomicIdGenerator<T = SystemClock>
where
    T: TimeSource,
{
    #[cfg(feature = "cache-padded")]
    pub(crate) state: Arc<crossbeam_utils::CachePadded<AtomicU64>>,
    #[cfg(not(feature = "cache-padded"))]
    pub(crate) state: Arc<AtomicU64>,
    node_id: u64,
    custom_epoch: u64,
    time: T,
}

impl AtomicIdGenerator<SystemClock> {
    /// Creates a generator for `node_id` reading the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `node_id` is negative or larger
    /// than [`MAX_NODE_ID`].
    ///
    /// [`MAX_NODE_ID`]: crate::MAX_NODE_ID
    pub fn new(node_id: i64, custom_epoch: u64) -> Result<Self> {
        Self::with_clock(node_id, custom_epoch, SystemClock)
    }

    /// Creates a generator with a locally derived node id and
    /// [`DEFAULT_EPOCH`].
    pub fn auto() -> Self {
        Self::auto_with_clock(SystemClock)
    }
}

impl Default for AtomicIdGenerator<SystemClock> {
    fn default() -> Self {
        Self::auto()
    }
}

impl<T> AtomicIdGenerator<T>
where
    T: TimeSource,
{
    /// Creates a generator that reads `time` instead of the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `node_id` is out of range.
    pub fn with_clock(node_id: i64, custom_epoch: u64, time: T) -> Result<Self> {
        let node_id = validate_node_id(node_id)?;
        Ok(Self::from_parts(node_id, custom_epoch, time))
    }

    /// Creates a generator with a locally derived node id and
    /// [`DEFAULT_EPOCH`], reading `time`.
    pub fn auto_with_clock(time: T) -> Self {
        let DerivedNodeId { node_id, .. } = derive_node_id();
        Self::from_parts(node_id, DEFAULT_EPOCH, time)
    }

    fn from_parts(node_id: u64, custom_epoch: u64, time: T) -> Self {
        let state = AtomicU64::new(NO_ID_YET);
        Self {
            #[cfg(feature = "cache-padded")]
            state: Arc::new(crossbeam_utils::CachePadded::new(state)),
            #[cfg(not(feature = "cache-padded"))]
            state: Arc::new(state),
            node_id,
            custom_epoch,
            time,
        }
    }

    /// The node id embedded in every ID.
    pub fn node_id(&self) -> u64 {
        self.node_id
    }

    /// The custom epoch in milliseconds since the Unix epoch.
    pub fn custom_epoch(&self) -> u64 {
        self.custom_epoch
    }

    /// Generates the next ID as a raw `u64`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::next_id`].
    pub fn next(&self) -> Result<u64> {
        self.next_id().map(|id| id.to_raw())
    }

    /// Generates the next ID.
    ///
    /// # Errors
    ///
    /// - [`Error::ClockRegression`] if the clock reads earlier than the last
    ///   issued ID
    /// - [`Error::ClockBeforeEpoch`] if the clock reads earlier than the
    ///   custom epoch before any ID was issued (afterwards this is a
    ///   regression)
    /// - [`Error::TimestampOverflow`] once the 41-bit timestamp is exhausted
    ///
    /// The state word is only swapped on success.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self), fields(node_id = self.node_id)))]
    pub fn next_id(&self) -> Result<SnowflakeId> {
        loop {
            // Load before reading the clock: the reading is then at least as
            // late as the one that produced `current_raw`.
            let current_raw = self.state.load(Ordering::Acquire);
            let last = (current_raw != NO_ID_YET)
                .then(|| SnowflakeId::from_raw(current_raw).timestamp());
            let now = elapsed_since_epoch(&self.time, self.custom_epoch, last)?;

            let (timestamp, sequence) = match last {
                None => (now, 0),
                Some(last) => {
                    let current = SnowflakeId::from_raw(current_raw);
                    match now.cmp(&last) {
                        cmp::Ordering::Greater => (now, 0),
                        cmp::Ordering::Equal if current.sequence() < MAX_SEQUENCE => {
                            (now, current.sequence() + 1)
                        }
                        cmp::Ordering::Equal => (self.wait_next_millis(last)?, 0),
                        cmp::Ordering::Less => {
                            return Err(clock_regression(last, now));
                        }
                    }
                }
            };

            if timestamp > MAX_TIMESTAMP {
                return Err(Error::TimestampOverflow { timestamp });
            }

            let next = SnowflakeId::from_components(timestamp, self.node_id, sequence);
            if self
                .state
                .compare_exchange(
                    current_raw,
                    next.to_raw(),
                    Ordering::AcqRel,
                    Ordering::Relaxed,
                )
                .is_ok()
            {
                break Ok(next);
            }

            // Another caller won the race; retry against its ID.
            core::hint::spin_loop();
        }
    }

    /// Splits an ID into absolute timestamp, node id and sequence. See
    /// [`ParsedId::decode`].
    pub fn parse(&self, id: u64) -> ParsedId {
        ParsedId::decode(id, self.custom_epoch)
    }

    fn wait_next_millis(&self, last: u64) -> Result<u64> {
        loop {
            let now = elapsed_since_epoch(&self.time, self.custom_epoch, Some(last))?;
            match now.cmp(&last) {
                cmp::Ordering::Greater => break Ok(now),
                cmp::Ordering::Equal => core::hint::spin_loop(),
                cmp::Ordering::Less => break Err(clock_regression(last, now)),
            }
        }
    }
}

impl<T> Clone for AtomicIdGenerator<T>
where
    T: TimeSource + Clone,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            node_id: self.node_id,
            custom_epoch: self.custom_epoch,
            time: self.time.clone(),
        }
    }
}

impl<T> fmt::Display for AtomicIdGenerator<T>
where
    T: TimeSource,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_settings(f, self.node_id, self.custom_epoch)
    }
}

impl<T> fmt::Debug for AtomicIdGenerator<T>
where
    T: TimeSource,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtomicIdGenerator")
            .field("node_id", &self.node_id)
            .field("custom_epoch", &self.custom_epoch)
            .finish_non_exhaustive()
    }
}

impl<T> SnowflakeGenerator for AtomicIdGenerator<T>
where
    T: TimeSource,
{
    fn next_id(&self) -> Result<SnowflakeId> {
        self.next_id()
    }

    fn next(&self) -> Result<u64> {
        self.next()
    }

    fn parse(&self, id: u64) -> ParsedId {
        self.parse(id)
    }

    fn node_id(&self) -> u64 {
        self.node_id()
    }

    fn custom_epoch(&self) -> u64 {
        self.custom_epoch()
    }
}
