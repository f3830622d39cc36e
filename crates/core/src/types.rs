//! Common types and reserved constants

use std::fmt;

use serde::{
    de::{self, SeqAccess, Visitor},
    Deserialize, Deserializer, Serialize, Serializer,
};

pub use plasma_merkle::{Hash, NULL_HASH};

/// 20-byte account address
pub type Address = [u8; 20];

/// Value carried by an output
pub type Amount = u128;

/// Block number type
pub type BlockNumber = u64;

/// Transaction index within a block
pub type TxIndex = u32;

/// Output index within a transaction
pub type OutputIndex = u32;

/// Packed (blknum, txindex, oindex) reference to a transaction output
pub type UtxoPosition = u64;

/// Number of inputs and of outputs in every transaction
pub const NUM_TXOS: usize = 2;

/// Depth of the per-block transaction tree
pub const BLOCK_MERKLE_DEPTH: usize = 10;

/// Maximum number of transactions a block can commit to
pub const BLOCK_CAPACITY: usize = 1 << BLOCK_MERKLE_DEPTH;

/// Reserved block number marking deposit-origin inputs; never stored
pub const DEPOSIT_BLOCK_NUMBER: BlockNumber = 0;

/// All-zero address
pub const NULL_ADDRESS: Address = [0u8; 20];

/// Length of an encoded signature (`r ‖ s ‖ v`)
pub const SIGNATURE_LENGTH: usize = 65;

/// All-zero signature marking an empty slot
pub const NULL_SIGNATURE: Signature = Signature([0u8; SIGNATURE_LENGTH]);

/// Recoverable secp256k1 signature encoded as `r ‖ s ‖ v`
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; SIGNATURE_LENGTH]);

impl Signature {
    /// Whether this is the empty slot marker
    pub fn is_null(&self) -> bool {
        *self == NULL_SIGNATURE
    }

    /// Raw signature bytes
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }

    /// Parse from a 65-byte slice
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; SIGNATURE_LENGTH]>::try_from(bytes).ok().map(Self)
    }
}

impl Default for Signature {
    fn default() -> Self {
        NULL_SIGNATURE
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature(0x{})", hex::encode(self.0))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

// Written as a length-prefixed byte string; serde has no derive for 65-byte arrays.
impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_bytes(SignatureVisitor)
    }
}

struct SignatureVisitor;

impl<'de> Visitor<'de> for SignatureVisitor {
    type Value = Signature;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SIGNATURE_LENGTH} signature bytes")
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
        Signature::from_slice(v).ok_or_else(|| E::invalid_length(v.len(), &self))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut bytes = [0u8; SIGNATURE_LENGTH];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = seq.next_element()?.ok_or_else(|| de::Error::invalid_length(i, &self))?;
        }
        if seq.next_element::<u8>()?.is_some() {
            return Err(de::Error::invalid_length(SIGNATURE_LENGTH + 1, &self));
        }
        Ok(Signature(bytes))
    }
}

/// Format a byte string as `0x`-prefixed hex
pub fn to_hex(bytes: impl AsRef<[u8]>) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Parse a 20-byte address from hex, with or without `0x`
pub fn parse_address(s: &str) -> Option<Address> {
    let bytes = hex::decode(s.trim_start_matches("0x")).ok()?;
    Address::try_from(bytes.as_slice()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_signature_default() {
        assert!(Signature::default().is_null());
        assert!(!Signature([1u8; SIGNATURE_LENGTH]).is_null());
    }

    #[test]
    fn test_signature_from_slice_length() {
        assert!(Signature::from_slice(&[0u8; 64]).is_none());
        assert_eq!(Signature::from_slice(&[3u8; 65]), Some(Signature([3u8; 65])));
    }

    #[test]
    fn test_parse_address() {
        let addr = parse_address("0x00000000000000000000000000000000000000ff").unwrap();
        assert_eq!(addr[19], 0xff);
        assert_eq!(parse_address("00000000000000000000000000000000000000ff"), Some(addr));
        assert!(parse_address("0x1234").is_none());
        assert!(parse_address("zz").is_none());
    }

    #[test]
    fn test_block_capacity() {
        assert_eq!(BLOCK_CAPACITY, 1024);
    }
}
