use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::SnowflakeId;

/// Errors raised while deserializing a [`SnowflakeId`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Error)]
#[non_exhaustive]
pub enum SerdeError {
    /// The value sets the reserved sign bit, so no generator produced it.
    #[error("{id} sets the reserved bit and is not a snowflake id")]
    ReservedBitSet {
        /// The rejected raw value.
        id: u64,
    },
}

/// Serializes as the native `u64`.
impl Serialize for SnowflakeId {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_raw().serialize(s)
    }
}

/// Deserializes from the native `u64`, rejecting values with the reserved bit
/// set.
impl<'de> Deserialize<'de> for SnowflakeId {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let id = Self::from_raw(u64::deserialize(d)?);
        if !id.is_valid() {
            return Err(serde::de::Error::custom(SerdeError::ReservedBitSet {
                id: id.to_raw(),
            }));
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParsedId;
    use serde_json::json;

    #[derive(PartialEq, Eq, Debug, Serialize, Deserialize)]
    struct Row {
        event_id: SnowflakeId,
    }

    #[test]
    fn native_roundtrip() {
        let row = Row {
            event_id: SnowflakeId::from_components(1000, 5, 1),
        };

        let json = serde_json::to_string(&row).expect("serialize");
        assert_eq!(json, r#"{"event_id":4194324481}"#);
        let back: Row = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, row);
    }

    #[test]
    fn reserved_bit_is_rejected() {
        let json = json!({ "event_id": u64::MAX });
        let err = serde_json::from_value::<Row>(json).expect_err("should fail");
        assert_eq!(
            err.to_string(),
            SerdeError::ReservedBitSet { id: u64::MAX }.to_string()
        );
    }

    #[test]
    fn parsed_id_serializes_as_named_fields() {
        let parsed = ParsedId::decode(SnowflakeId::from_components(1000, 5, 0).to_raw(), 0);
        assert_eq!(
            serde_json::to_value(parsed).unwrap(),
            json!({ "timestamp_millis": 1000, "node_id": 5, "sequence": 0 })
        );
    }
}
