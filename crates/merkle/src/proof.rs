//! Merkle membership proof generation and verification

use serde::{Deserialize, Serialize};

use crate::{hasher::Keccak256Hasher, Hash, HASH_SIZE};

/// Membership proof for a single leaf
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// Position of the leaf in the padded leaf list
    pub index: u64,
    /// Sibling hashes from leaf to root, concatenated (`depth * 32` bytes)
    path: Vec<u8>,
}

impl MerkleProof {
    pub(crate) fn new(index: u64, path: Vec<u8>) -> Self {
        Self { index, path }
    }

    /// Raw proof bytes, as submitted to the root ledger
    pub fn as_bytes(&self) -> &[u8] {
        &self.path
    }

    /// Consume the proof, returning the raw bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.path
    }

    /// Number of levels covered by this proof
    pub fn depth(&self) -> usize {
        self.path.len() / HASH_SIZE
    }

    /// Verify this proof for `leaf` against `root`
    pub fn verify(&self, root: &Hash, leaf: &[u8]) -> bool {
        verify_membership(root, self.depth(), leaf, self.index, &self.path)
    }
}

/// Recompute the root from a leaf, its index and a proof and compare it to `root`
///
/// At each of the `depth` steps the next 32-byte segment is folded in on the
/// side given by the parity of `index` (even: `H(current ‖ segment)`, odd:
/// `H(segment ‖ current)`), then `index` is halved. A proof whose length is not
/// exactly `depth * 32` never verifies.
pub fn verify_membership(root: &Hash, depth: usize, leaf: &[u8], index: u64, proof: &[u8]) -> bool {
    if !depth.checked_mul(HASH_SIZE).is_some_and(|len| len == proof.len()) {
        return false;
    }

    let mut index = index;
    let mut computed = Keccak256Hasher::hash(leaf);
    for segment in proof.chunks_exact(HASH_SIZE) {
        computed = if index % 2 == 0 {
            Keccak256Hasher::hash_pair(&computed, segment)
        } else {
            Keccak256Hasher::hash_pair(segment, &computed)
        };
        index /= 2;
    }

    computed == *root
}
