//! Keccak256 hasher shared by the tree, the proofs and the ledger

use tiny_keccak::{Hasher, Keccak};

use crate::Hash;

/// Keccak256 hasher
#[derive(Debug, Clone, Copy)]
pub struct Keccak256Hasher;

impl Keccak256Hasher {
    /// Hash arbitrary bytes
    pub fn hash(data: &[u8]) -> Hash {
        let mut hasher = Keccak::v256();
        hasher.update(data);
        let mut output = [0u8; 32];
        hasher.finalize(&mut output);
        output
    }

    /// Hash the concatenation `left ‖ right`
    ///
    /// Used both for combining sibling nodes and for folding a proof segment
    /// into the running path hash, so the byte order is significant.
    pub fn hash_pair(left: &[u8], right: &[u8]) -> Hash {
        let mut hasher = Keccak::v256();
        hasher.update(left);
        hasher.update(right);
        let mut output = [0u8; 32];
        hasher.finalize(&mut output);
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_empty_input() {
        let expected =
            hex::decode("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470").unwrap();
        assert_eq!(Keccak256Hasher::hash(&[]).to_vec(), expected);
    }

    #[test]
    fn test_hash_pair_is_order_sensitive() {
        let left = [1u8; 32];
        let right = [2u8; 32];
        assert_ne!(
            Keccak256Hasher::hash_pair(&left, &right),
            Keccak256Hasher::hash_pair(&right, &left)
        );
    }

    #[test]
    fn test_hash_pair_matches_concatenation() {
        let left = [7u8; 32];
        let right = [9u8; 32];
        let mut joined = left.to_vec();
        joined.extend_from_slice(&right);
        assert_eq!(Keccak256Hasher::hash_pair(&left, &right), Keccak256Hasher::hash(&joined));
    }
}
