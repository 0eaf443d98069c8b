use core::{cmp::Ordering, fmt};
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::{instrument, trace};

use crate::{
    DEFAULT_EPOCH, DerivedNodeId, Error, MAX_SEQUENCE, MAX_TIMESTAMP, ParsedId, Result,
    SnowflakeGenerator, SnowflakeId, SystemClock, TimeSource, derive_node_id,
    generator::{
        Mutex, MutexGuard, clock_regression, elapsed_since_epoch, validate_node_id, write_settings,
    },
};

/// Mutable state guarded by the generator lock.
#[derive(Debug, Default)]
pub(crate) struct GeneratorState {
    /// Milliseconds since the custom epoch of the last issued ID.
    pub(crate) last_timestamp: Option<u64>,
    pub(crate) sequence: u64,
}

/// A lock-based Snowflake ID generator.
///
/// The clock read, the sequence decision and the state update all happen
/// while holding one mutex, so concurrent callers are fully serialized. When
/// a millisecond's 4096 sequence values are used up, the caller holding the
/// lock spins on the clock until the next millisecond, and everyone else
/// waits on the lock.
///
/// The generator is a handle: clones share the same state and lock. Create
/// one per logical node and pass clones (or references) to every caller;
/// two independent instances with the same node id can issue duplicates.
///
/// ## Recommended When
/// - You're in a multi-threaded environment
/// - Fair access across threads is important
///
/// ## See Also
/// - [`AtomicIdGenerator`]
///
/// [`AtomicIdGenerator`]: crate::AtomicIdGenerator
pub struct IdGenerator<T = SystemClock>
where
    T: TimeSource,
{
    #[cfg(feature = "cache-padded")]
    pub(crate) state: Arc<crossbeam_utils::CachePadded<Mutex<GeneratorState>>>,
    #[cfg(not(feature = "cache-padded"))]
    pub(crate) state: Arc<Mutex<GeneratorState>>,
    node_id: u64,
    custom_epoch: u64,
    time: T,
}

impl IdGenerator<SystemClock> {
    /// Creates a generator for `node_id` with timestamps counted from
    /// `custom_epoch` (milliseconds since the Unix epoch), reading the system
    /// clock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `node_id` is negative or larger
    /// than [`MAX_NODE_ID`].
    ///
    /// # Example
    /// ```
    /// use flakegen::{DEFAULT_EPOCH, IdGenerator};
    ///
    /// let generator = IdGenerator::new(5, DEFAULT_EPOCH).unwrap();
    /// let id = generator.next().unwrap();
    /// assert_eq!(generator.parse(id).node_id, 5);
    ///
    /// assert!(IdGenerator::new(1024, DEFAULT_EPOCH).is_err());
    /// ```
    ///
    /// [`MAX_NODE_ID`]: crate::MAX_NODE_ID
    pub fn new(node_id: i64, custom_epoch: u64) -> Result<Self> {
        Self::with_clock(node_id, custom_epoch, SystemClock)
    }

    /// Creates a generator with a locally derived node id and
    /// [`DEFAULT_EPOCH`].
    ///
    /// See [`derive_node_id`] for how the node id is chosen and why it can
    /// collide with other hosts.
    ///
    /// [`derive_node_id`]: crate::derive_node_id
    pub fn auto() -> Self {
        Self::auto_with_clock(SystemClock)
    }
}

impl Default for IdGenerator<SystemClock> {
    fn default() -> Self {
        Self::auto()
    }
}

impl<T> IdGenerator<T>
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
        let state = Mutex::new(GeneratorState::default());
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
    /// Within one millisecond the sequence counts up from 0. On the 4097th
    /// call in the same millisecond the sequence wraps to 0 and this call
    /// spins, still holding the lock, until the clock reaches the next
    /// millisecond.
    ///
    /// # Errors
    ///
    /// - [`Error::ClockRegression`] if the clock reads earlier than the last
    ///   issued ID, including while waiting for the next millisecond
    /// - [`Error::ClockBeforeEpoch`] if the clock reads earlier than the
    ///   custom epoch before any ID was issued (afterwards this is a
    ///   regression)
    /// - [`Error::TimestampOverflow`] once the 41-bit timestamp is exhausted
    /// - [`Error::LockPoisoned`] if the std mutex is poisoned
    ///
    /// State is only updated on success.
    ///
    /// # Example
    /// ```
    /// use flakegen::{DEFAULT_EPOCH, IdGenerator};
    ///
    /// let generator = IdGenerator::new(1, DEFAULT_EPOCH).unwrap();
    /// let first = generator.next_id().unwrap();
    /// let second = generator.next_id().unwrap();
    /// assert!(second > first);
    /// ```
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self), fields(node_id = self.node_id)))]
    pub fn next_id(&self) -> Result<SnowflakeId> {
        let mut state = self.lock()?;
        let now = elapsed_since_epoch(&self.time, self.custom_epoch, state.last_timestamp)?;

        let (timestamp, sequence) = match state.last_timestamp {
            None => (now, 0),
            Some(last) => match now.cmp(&last) {
                Ordering::Greater => (now, 0),
                Ordering::Equal => {
                    let sequence = (state.sequence + 1) & MAX_SEQUENCE;
                    if sequence == 0 {
                        (self.wait_next_millis(last)?, 0)
                    } else {
                        (now, sequence)
                    }
                }
                Ordering::Less => return Err(clock_regression(last, now)),
            },
        };

        if timestamp > MAX_TIMESTAMP {
            return Err(Error::TimestampOverflow { timestamp });
        }

        state.last_timestamp = Some(timestamp);
        state.sequence = sequence;

        Ok(SnowflakeId::from_components(timestamp, self.node_id, sequence))
    }

    /// Splits an ID into absolute timestamp, node id and sequence. No lock is
    /// taken and the input is not validated; see [`ParsedId::decode`].
    pub fn parse(&self, id: u64) -> ParsedId {
        ParsedId::decode(id, self.custom_epoch)
    }

    /// Spins until the clock moves past `last`.
    fn wait_next_millis(&self, last: u64) -> Result<u64> {
        #[cfg(feature = "tracing")]
        trace!(last, "sequence exhausted, waiting for next millisecond");

        loop {
            let now = elapsed_since_epoch(&self.time, self.custom_epoch, Some(last))?;
            match now.cmp(&last) {
                Ordering::Greater => break Ok(now),
                Ordering::Equal => core::hint::spin_loop(),
                Ordering::Less => break Err(clock_regression(last, now)),
            }
        }
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, GeneratorState>> {
        #[cfg(feature = "parking-lot")]
        {
            Ok(self.state.lock())
        }
        #[cfg(not(feature = "parking-lot"))]
        {
            Ok(self.state.lock()?)
        }
    }
}

impl<T> Clone for IdGenerator<T>
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

impl<T> fmt::Display for IdGenerator<T>
where
    T: TimeSource,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_settings(f, self.node_id, self.custom_epoch)
    }
}

impl<T> fmt::Debug for IdGenerator<T>
where
    T: TimeSource,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdGenerator")
            .field("node_id", &self.node_id)
            .field("custom_epoch", &self.custom_epoch)
            .finish_non_exhaustive()
    }
}

impl<T> SnowflakeGenerator for IdGenerator<T>
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
