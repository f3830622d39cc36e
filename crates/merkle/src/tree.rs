//! Fixed-depth Merkle tree implementation

use crate::{
    hasher::Keccak256Hasher, proof::MerkleProof, verify_membership, Hash, MerkleError,
    EMPTY_LEAF_HASH, HASH_SIZE,
};

/// Complete binary Merkle tree of fixed depth
///
/// Immutable once built. `levels[0]` holds the hashed, padded leaves and the
/// last level holds the single root node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FixedMerkleTree {
    depth: usize,
    levels: Vec<Vec<Hash>>,
}

impl FixedMerkleTree {
    /// Build a tree of `depth` over raw `leaves`
    ///
    /// Each leaf is hashed, the hashed list is right-padded with
    /// [`EMPTY_LEAF_HASH`] up to `2^depth` entries, and adjacent pairs are
    /// combined level by level until one node remains.
    pub fn new<L: AsRef<[u8]>>(depth: usize, leaves: &[L]) -> Result<Self, MerkleError> {
        let invalid = MerkleError::InvalidTreeSize { depth, leaves: leaves.len() };
        if depth < 1 {
            return Err(invalid);
        }
        let leaf_count = u32::try_from(depth)
            .ok()
            .and_then(|d| 1usize.checked_shl(d))
            .ok_or_else(|| invalid.clone())?;
        if leaves.len() > leaf_count {
            return Err(invalid);
        }

        let mut hashed: Vec<Hash> = Vec::with_capacity(leaf_count);
        hashed.extend(leaves.iter().map(|leaf| Keccak256Hasher::hash(leaf.as_ref())));
        hashed.resize(leaf_count, EMPTY_LEAF_HASH);

        let mut levels = Vec::with_capacity(depth + 1);
        levels.push(hashed);
        while let Some(current) = levels.last().filter(|level| level.len() > 1) {
            let next: Vec<Hash> = current
                .chunks_exact(2)
                .map(|pair| Keccak256Hasher::hash_pair(&pair[0], &pair[1]))
                .collect();
            levels.push(next);
        }

        Ok(Self { depth, levels })
    }

    /// Tree depth
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Root hash
    pub fn root(&self) -> Hash {
        self.levels[self.depth][0]
    }

    /// Hashed and padded leaves, `2^depth` entries
    pub fn leaves(&self) -> &[Hash] {
        &self.levels[0]
    }

    /// Index of the first leaf whose hash equals `keccak256(leaf)`
    pub fn index_of(&self, leaf: &[u8]) -> Option<usize> {
        let hashed = Keccak256Hasher::hash(leaf);
        self.leaves().iter().position(|candidate| *candidate == hashed)
    }

    /// Create a membership proof for a raw leaf
    pub fn membership_proof(&self, leaf: &[u8]) -> Result<MerkleProof, MerkleError> {
        let leaf_index = self.index_of(leaf).ok_or(MerkleError::NonexistentMember)?;
        self.proof_at(leaf_index)
    }

    /// Create a membership proof for the leaf stored at `leaf_index`
    pub fn proof_at(&self, leaf_index: usize) -> Result<MerkleProof, MerkleError> {
        if leaf_index >= self.leaves().len() {
            return Err(MerkleError::NonexistentMember);
        }

        let mut path = Vec::with_capacity(self.depth * HASH_SIZE);
        let mut index = leaf_index;
        for level in &self.levels[..self.depth] {
            path.extend_from_slice(&level[index ^ 1]);
            index /= 2;
        }

        Ok(MerkleProof::new(leaf_index as u64, path))
    }

    /// Check a proof for `leaf` at `index` against this tree's root
    ///
    /// Never fails: malformed proofs simply do not verify.
    pub fn check_membership(&self, leaf: &[u8], index: u64, proof: &[u8]) -> bool {
        verify_membership(&self.root(), self.depth, leaf, index, proof)
    }
}
