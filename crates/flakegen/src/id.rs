use core::fmt;

/// Number of bits holding the milliseconds elapsed since the custom epoch.
pub const EPOCH_BITS: u32 = 41;

/// Number of bits holding the node id.
pub const NODE_ID_BITS: u32 = 10;

/// Number of bits holding the per-millisecond sequence.
pub const SEQUENCE_BITS: u32 = 12;

/// Largest timestamp (milliseconds since the custom epoch) that fits in an ID.
pub const MAX_TIMESTAMP: u64 = (1 << EPOCH_BITS) - 1;

/// Largest node id, `2^NODE_ID_BITS - 1`.
pub const MAX_NODE_ID: u64 = (1 << NODE_ID_BITS) - 1;

/// Largest sequence value, `2^SEQUENCE_BITS - 1`.
pub const MAX_SEQUENCE: u64 = (1 << SEQUENCE_BITS) - 1;

/// A 64-bit Snowflake ID.
///
/// - 1 bit reserved (always 0 for generated IDs)
/// - 41 bits timestamp (ms since the generator's custom epoch)
/// - 10 bits node ID
/// - 12 bits sequence
///
/// ```text
///  Bit Index:  63           63 62            22 21          12 11             0
///              +--------------+----------------+--------------+---------------+
///  Field:      | reserved (1) | timestamp (41) | node ID (10) | sequence (12) |
///              +--------------+----------------+--------------+---------------+
///              |<----------- MSB ---------- 64 bits --------- LSB ----------->|
/// ```
///
/// The timestamp stored here is relative to the custom epoch. Use
/// [`SnowflakeGenerator::parse`] to recover an absolute time.
///
/// [`SnowflakeGenerator::parse`]: crate::SnowflakeGenerator::parse
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnowflakeId {
    id: u64,
}

impl SnowflakeId {
    /// Bitmask for the 41-bit timestamp field once shifted down.
    pub const TIMESTAMP_MASK: u64 = MAX_TIMESTAMP;

    /// Bitmask for the 10-bit node ID field once shifted down.
    pub const NODE_ID_MASK: u64 = MAX_NODE_ID;

    /// Bitmask for the 12-bit sequence field.
    pub const SEQUENCE_MASK: u64 = MAX_SEQUENCE;

    /// Position of the timestamp field (bit 22).
    pub const TIMESTAMP_SHIFT: u32 = NODE_ID_BITS + SEQUENCE_BITS;

    /// Position of the node ID field (bit 12).
    pub const NODE_ID_SHIFT: u32 = SEQUENCE_BITS;

    /// The reserved sign bit.
    pub const RESERVED_MASK: u64 = 1 << 63;

    /// Packs the three fields into an ID. Each field is truncated to its bit
    /// width.
    pub const fn from_components(timestamp: u64, node_id: u64, sequence: u64) -> Self {
        let timestamp = (timestamp & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
        let node_id = (node_id & Self::NODE_ID_MASK) << Self::NODE_ID_SHIFT;
        let sequence = sequence & Self::SEQUENCE_MASK;
        Self {
            id: timestamp | node_id | sequence,
        }
    }

    /// Wraps a raw value without validation.
    pub const fn from_raw(id: u64) -> Self {
        Self { id }
    }

    /// Returns the packed 64-bit value.
    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    /// Extracts the timestamp (ms since the custom epoch).
    pub const fn timestamp(&self) -> u64 {
        (self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK
    }

    /// Extracts the node ID.
    pub const fn node_id(&self) -> u64 {
        (self.id >> Self::NODE_ID_SHIFT) & Self::NODE_ID_MASK
    }

    /// Extracts the sequence number.
    pub const fn sequence(&self) -> u64 {
        self.id & Self::SEQUENCE_MASK
    }

    /// Returns `true` if the reserved bit is clear, as it is for every ID a
    /// generator produces.
    pub const fn is_valid(&self) -> bool {
        self.id & Self::RESERVED_MASK == 0
    }

    /// Returns the ID as a zero-padded 20-digit string.
    pub fn to_padded_string(&self) -> String {
        format!("{:020}", self.id)
    }

    /// `(name, bits, value)` for each field, most significant first.
    fn fields(&self) -> [(&'static str, u32, u64); 4] {
        [
            ("reserved", 1, self.id >> 63),
            ("timestamp", EPOCH_BITS, self.timestamp()),
            ("node_id", NODE_ID_BITS, self.node_id()),
            ("sequence", SEQUENCE_BITS, self.sequence()),
        ]
    }
}

impl From<u64> for SnowflakeId {
    fn from(id: u64) -> Self {
        Self::from_raw(id)
    }
}

impl From<SnowflakeId> for u64 {
    fn from(id: SnowflakeId) -> Self {
        id.to_raw()
    }
}

impl fmt::Display for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Multi-line breakdown of the four fields:
///
/// ```text
/// SnowflakeId(0x00000000fa005001 = 4194324481) {
///     reserved   ( 1):             0  0x0
///     timestamp  (41):          1000  0x3e8
///     node_id    (10):             5  0x5
///     sequence   (12):             1  0x1
/// }
/// ```
impl fmt::Debug for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SnowflakeId(0x{:016x} = {}) {{", self.id, self.id)?;
        for (name, bits, value) in self.fields() {
            writeln!(f, "    {name:<10} ({bits:>2}): {value:>13}  0x{value:x}")?;
        }
        write!(f, "}}")
    }
}

/// The fields of an ID, with the timestamp converted back to milliseconds
/// since the Unix epoch.
///
/// Decoding never validates its input: any `u64` decodes to some triple, and
/// a value that was not produced by a generator with the same custom epoch
/// decodes to meaningless fields.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ParsedId {
    /// Milliseconds since the Unix epoch.
    pub timestamp_millis: u64,
    /// The node that produced the ID.
    pub node_id: u64,
    /// The per-millisecond sequence.
    pub sequence: u64,
}

impl ParsedId {
    /// Splits `id` into its fields and re-adds `custom_epoch` to the
    /// timestamp.
    ///
    /// The timestamp is everything above the node field, so a set reserved bit
    /// shows up as a far-future timestamp rather than an error.
    pub const fn decode(id: u64, custom_epoch: u64) -> Self {
        let node_id_mask = SnowflakeId::NODE_ID_MASK << SnowflakeId::NODE_ID_SHIFT;
        Self {
            timestamp_millis: (id >> SnowflakeId::TIMESTAMP_SHIFT).saturating_add(custom_epoch),
            node_id: (id & node_id_mask) >> SnowflakeId::NODE_ID_SHIFT,
            sequence: id & SnowflakeId::SEQUENCE_MASK,
        }
    }
}

impl From<ParsedId> for (u64, u64, u64) {
    fn from(parsed: ParsedId) -> Self {
        (parsed.timestamp_millis, parsed.node_id, parsed.sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_widths_fill_63_bits() {
        assert_eq!(EPOCH_BITS + NODE_ID_BITS + SEQUENCE_BITS, 63);
        assert_eq!(MAX_NODE_ID, 1023);
        assert_eq!(MAX_SEQUENCE, 4095);
        assert_eq!(MAX_TIMESTAMP, 2_199_023_255_551);
    }

    #[test]
    fn components_land_in_their_fields() {
        let id = SnowflakeId::from_components(1000, 5, 1);
        assert_eq!(id.to_raw(), (1000 << 22) | (5 << 12) | 1);
        assert_eq!(id.timestamp(), 1000);
        assert_eq!(id.node_id(), 5);
        assert_eq!(id.sequence(), 1);
        assert!(id.is_valid());
    }

    #[test]
    fn max_components_keep_reserved_bit_clear() {
        let id = SnowflakeId::from_components(MAX_TIMESTAMP, MAX_NODE_ID, MAX_SEQUENCE);
        assert_eq!(id.to_raw(), i64::MAX as u64);
        assert!(id.is_valid());
        assert!(!SnowflakeId::from_raw(u64::MAX).is_valid());
    }

    #[test]
    fn oversized_components_are_truncated() {
        let id = SnowflakeId::from_components(0, MAX_NODE_ID + 1, MAX_SEQUENCE + 2);
        assert_eq!(id.node_id(), 0);
        assert_eq!(id.sequence(), 1);
    }

    #[test]
    fn ordering_follows_timestamp_then_sequence() {
        let a = SnowflakeId::from_components(10, 1023, 4095);
        let b = SnowflakeId::from_components(11, 0, 0);
        let c = SnowflakeId::from_components(11, 0, 1);
        assert!(a < b && b < c);
    }

    #[test]
    fn decode_restores_absolute_time() {
        let epoch = 1_420_070_400_000;
        let raw = SnowflakeId::from_components(1000, 5, 0).to_raw();
        let parsed = ParsedId::decode(raw, epoch);
        assert_eq!(
            parsed,
            ParsedId {
                timestamp_millis: epoch + 1000,
                node_id: 5,
                sequence: 0,
            }
        );
        assert_eq!(<(u64, u64, u64)>::from(parsed), (epoch + 1000, 5, 0));
    }

    #[test]
    fn decode_does_not_validate_input() {
        let parsed = ParsedId::decode(u64::MAX, 0);
        assert_eq!(parsed.timestamp_millis, u64::MAX >> 22);
        assert_eq!(parsed.node_id, MAX_NODE_ID);
        assert_eq!(parsed.sequence, MAX_SEQUENCE);

        let saturated = ParsedId::decode(u64::MAX, u64::MAX);
        assert_eq!(saturated.timestamp_millis, u64::MAX);
    }

    #[test]
    fn display_is_decimal_and_debug_shows_layout() {
        let id = SnowflakeId::from_components(1, 2, 3);
        assert_eq!(id.to_string(), ((1u64 << 22) | (2 << 12) | 3).to_string());
        assert_eq!(id.to_padded_string().len(), 20);

        let debug = format!("{:?}", SnowflakeId::from_components(1000, 5, 1));
        let lines: Vec<&str> = debug.lines().collect();
        assert_eq!(
            lines,
            [
                "SnowflakeId(0x00000000fa005001 = 4194324481) {",
                "    reserved   ( 1):             0  0x0",
                "    timestamp  (41):          1000  0x3e8",
                "    node_id    (10):             5  0x5",
                "    sequence   (12):             1  0x1",
                "}",
            ]
        );
    }
}
