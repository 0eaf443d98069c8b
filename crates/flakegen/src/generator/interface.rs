use core::fmt;

use crate::{EPOCH_BITS, NODE_ID_BITS, ParsedId, Result, SEQUENCE_BITS, SnowflakeId};

/// A minimal interface for generating Snowflake IDs.
///
/// Implemented by [`IdGenerator`] (mutex) and [`AtomicIdGenerator`]
/// (compare-and-swap). Both block for at most one clock tick when a
/// millisecond's sequence space is used up, and both fail rather than reuse a
/// timestamp when the clock moves backward.
///
/// The trait is object safe, so callers that choose a strategy at runtime can
/// hold a `Box<dyn SnowflakeGenerator + Send + Sync>`.
///
/// [`IdGenerator`]: crate::IdGenerator
/// [`AtomicIdGenerator`]: crate::AtomicIdGenerator
pub trait SnowflakeGenerator {
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
    /// - [`Error::LockPoisoned`] for a poisoned std mutex
    ///
    /// [`Error::ClockRegression`]: crate::Error::ClockRegression
    /// [`Error::ClockBeforeEpoch`]: crate::Error::ClockBeforeEpoch
    /// [`Error::TimestampOverflow`]: crate::Error::TimestampOverflow
    /// [`Error::LockPoisoned`]: crate::Error
    fn next_id(&self) -> Result<SnowflakeId>;

    /// Generates the next ID as a raw `u64`.
    ///
    /// # Errors
    ///
    /// Same as [`SnowflakeGenerator::next_id`].
    fn next(&self) -> Result<u64> {
        self.next_id().map(|id| id.to_raw())
    }

    /// Splits an ID into absolute timestamp, node id and sequence using this
    /// generator's custom epoch. See [`ParsedId::decode`].
    fn parse(&self, id: u64) -> ParsedId {
        ParsedId::decode(id, self.custom_epoch())
    }

    /// The node id embedded in every ID.
    fn node_id(&self) -> u64;

    /// The custom epoch in milliseconds since the Unix epoch.
    fn custom_epoch(&self) -> u64;
}

/// Renders the settings line shared by the generators' `Display` impls.
pub(crate) fn write_settings(
    f: &mut fmt::Formatter<'_>,
    node_id: u64,
    custom_epoch: u64,
) -> fmt::Result {
    write!(
        f,
        "Snowflake Settings [EPOCH_BITS={EPOCH_BITS}, NODE_ID_BITS={NODE_ID_BITS}, \
         SEQUENCE_BITS={SEQUENCE_BITS}, CUSTOM_EPOCH={custom_epoch}, NodeId={node_id}]"
    )
}
