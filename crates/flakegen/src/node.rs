//! Best-effort node id derivation.
//!
//! Nothing here coordinates with other nodes. Two machines can derive the same
//! node id, and a machine whose interfaces change can derive a different one.
//! Fleets that need guaranteed uniqueness must assign node ids externally and
//! pass them to the generator constructors.

use mac_address::MacAddressIterator;
use rand::{Rng, rng};
use sha2::{Digest, Sha256};
#[cfg(feature = "tracing")]
use tracing::debug;

use crate::MAX_NODE_ID;

/// Where a derived node id came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeIdSource {
    /// Hash of the host's network hardware addresses.
    Hardware,
    /// Cryptographically secure random fallback.
    Random,
}

/// A node id produced by [`derive_node_id`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DerivedNodeId {
    /// Node id, already masked to [`MAX_NODE_ID`].
    pub node_id: u64,
    /// The path that produced it.
    pub source: NodeIdSource,
}

/// Derives a node id for this host.
///
/// Hashes the MAC addresses of all network interfaces when any are found,
/// and otherwise draws from the thread-local CSPRNG. Either way the value is
/// masked down to the node-id field, which makes collisions between hosts
/// more likely than the raw seed would suggest.
pub fn derive_node_id() -> DerivedNodeId {
    let derived = match hardware_fingerprint()
        .as_deref()
        .and_then(node_id_from_fingerprint)
    {
        Some(node_id) => DerivedNodeId {
            node_id,
            source: NodeIdSource::Hardware,
        },
        None => DerivedNodeId {
            node_id: random_node_id(),
            source: NodeIdSource::Random,
        },
    };

    #[cfg(feature = "tracing")]
    debug!(node_id = derived.node_id, source = ?derived.source, "derived node id");

    derived
}

/// Hashes a hardware fingerprint down to a node id.
///
/// Returns `None` for an empty fingerprint so the caller can take the random
/// path.
pub fn node_id_from_fingerprint(fingerprint: &[u8]) -> Option<u64> {
    if fingerprint.is_empty() {
        return None;
    }
    let digest = Sha256::digest(fingerprint);
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&digest[..8]);
    Some(u64::from_be_bytes(seed) & MAX_NODE_ID)
}

/// Draws a random node id from the thread-local CSPRNG.
pub fn random_node_id() -> u64 {
    rng().random::<u64>() & MAX_NODE_ID
}

/// Concatenated MAC addresses of all interfaces, sorted so the result does
/// not depend on enumeration order. Loopback-style all-zero addresses are
/// skipped.
fn hardware_fingerprint() -> Option<Vec<u8>> {
    let mut addresses: Vec<[u8; 6]> = MacAddressIterator::new()
        .ok()?
        .map(|address| address.bytes())
        .filter(|bytes| bytes.iter().any(|&b| b != 0))
        .collect();

    if addresses.is_empty() {
        return None;
    }

    addresses.sort_unstable();
    addresses.dedup();
    Some(addresses.concat())
}
