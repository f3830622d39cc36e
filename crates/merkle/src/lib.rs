//! Fixed-depth Merkle tree for Plasma block commitments
//!
//! Every tree is padded to exactly `2^depth` leaves so that proof size and
//! verification cost are independent of how many leaves are actually used.
//! The verification routine in [`verify_membership`] is the one the root-ledger
//! contract re-implements, so hash order and segment layout are fixed:
//! - leaves are `keccak256(data)`, padding leaves are `keccak256(NULL_HASH)`
//! - parents are `keccak256(left ‖ right)`
//! - proofs are the concatenated sibling hashes from the leaves up

mod hasher;
mod proof;
mod tree;

use thiserror::Error;

pub use hasher::Keccak256Hasher;
pub use proof::{verify_membership, MerkleProof};
pub use tree::FixedMerkleTree;

/// 32-byte hash type
pub type Hash = [u8; 32];

/// Size in bytes of a single hash, and of a single proof segment
pub const HASH_SIZE: usize = 32;

/// All-zero hash
pub const NULL_HASH: Hash = [0u8; 32];

/// Padding leaf hash: keccak256 of [`NULL_HASH`]
pub const EMPTY_LEAF_HASH: Hash = [
    0x29, 0x0d, 0xec, 0xd9, 0x54, 0x8b, 0x62, 0xa8,
    0xd6, 0x03, 0x45, 0xa9, 0x88, 0x38, 0x6f, 0xc8,
    0x4b, 0xa6, 0xbc, 0x95, 0x48, 0x40, 0x08, 0xf6,
    0x36, 0x2f, 0x93, 0x16, 0x0e, 0xf3, 0xe5, 0x63,
];

/// Merkle tree errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MerkleError {
    /// Depth is zero, or there are more leaves than the depth allows
    #[error("invalid tree size: {leaves} leaves for depth {depth}")]
    InvalidTreeSize { depth: usize, leaves: usize },
    /// Proof requested for a leaf that is not in the tree
    #[error("leaf is not in the merkle tree")]
    NonexistentMember,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_leaf_hash() {
        assert_eq!(Keccak256Hasher::hash(&NULL_HASH), EMPTY_LEAF_HASH);
    }

    #[test]
    fn test_build_and_prove() {
        let leaves: Vec<Vec<u8>> = (0u8..5).map(|i| vec![i; 40]).collect();
        let tree = FixedMerkleTree::new(3, &leaves).unwrap();

        for (index, leaf) in leaves.iter().enumerate() {
            let proof = tree.membership_proof(leaf).unwrap();
            assert_eq!(proof.index, index as u64);
            assert!(tree.check_membership(leaf, proof.index, proof.as_bytes()));
        }
    }
}
