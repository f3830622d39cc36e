//! Exit and challenge proof bundles

use plasma_merkle::verify_membership;

use crate::types::{Hash, UtxoPosition, BLOCK_MERKLE_DEPTH};
use crate::utxo::decode_utxo_position;

/// Everything the root ledger needs to check that a transaction was included
///
/// An exit proof references the exiting output. A challenge proof references
/// the spending transaction and carries its confirmations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InclusionProof {
    /// Position of the referenced output (exit) or spending transaction (challenge)
    pub position: UtxoPosition,
    /// Unsigned transaction encoding, i.e. the committed leaf
    pub encoded_transaction: Vec<u8>,
    /// Sibling path from leaf to root
    pub merkle_proof: Vec<u8>,
    /// Input signatures, joined
    pub signatures: Vec<u8>,
    /// Input confirmations, joined
    pub confirmations: Vec<u8>,
}

impl InclusionProof {
    /// Check the transaction against a block root
    pub fn verify(&self, root: &Hash) -> bool {
        let (_, txindex, _) = decode_utxo_position(self.position);
        verify_membership(
            root,
            BLOCK_MERKLE_DEPTH,
            &self.encoded_transaction,
            u64::from(txindex),
            &self.merkle_proof,
        )
    }
}
