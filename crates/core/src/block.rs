//! Block structure

use plasma_merkle::{FixedMerkleTree, MerkleProof};
use secp256k1::SecretKey;
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::crypto::{keccak256, recover_signer, sign};
use crate::error::Result;
use crate::tx::Transaction;
use crate::types::{Address, BlockNumber, Hash, Signature, TxIndex, BLOCK_MERKLE_DEPTH};

/// Ordered transactions signed by the operator
///
/// Transaction order fixes each transaction's `txindex` and its leaf in the
/// block's Merkle tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Transactions in this block
    pub transactions: Vec<Transaction>,
    /// Block number
    pub number: BlockNumber,
    /// Operator signature over [`Block::hash`]
    pub signature: Signature,
}

#[derive(Serialize)]
struct UnsignedBlock<'a> {
    transactions: &'a [Transaction],
    number: BlockNumber,
}

impl Block {
    /// Create an unsigned block
    pub fn new(transactions: Vec<Transaction>, number: BlockNumber) -> Self {
        Self { transactions, number, signature: Signature::default() }
    }

    /// Single-transaction block carrying a root-ledger deposit
    pub fn deposit(transaction: Transaction, number: BlockNumber) -> Self {
        Self::new(vec![transaction], number)
    }

    /// Encoding without the block signature
    pub fn encoded(&self) -> Vec<u8> {
        codec::encode(&UnsignedBlock { transactions: &self.transactions, number: self.number })
    }

    /// Full encoding including the block signature
    pub fn signed_encoded(&self) -> Vec<u8> {
        codec::encode(self)
    }

    /// Decode from the full encoding
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        codec::decode(bytes)
    }

    /// Compute block hash
    pub fn hash(&self) -> Hash {
        keccak256(&self.encoded())
    }

    /// Sign the block as operator
    pub fn sign(&mut self, key: &SecretKey) {
        self.signature = sign(&self.hash(), key);
    }

    /// Address claimed by the block signature
    pub fn signer(&self) -> Result<Address> {
        recover_signer(&self.hash(), &self.signature)
    }

    /// Whether this is a single-transaction deposit block
    pub fn is_deposit_block(&self) -> bool {
        matches!(self.transactions.as_slice(), [tx] if tx.is_deposit())
    }

    /// Merkle tree over the unsigned transaction encodings
    pub fn merkle(&self) -> Result<FixedMerkleTree> {
        let leaves: Vec<Vec<u8>> = self.transactions.iter().map(Transaction::encoded).collect();
        Ok(FixedMerkleTree::new(BLOCK_MERKLE_DEPTH, &leaves)?)
    }

    /// Merkle root committed to the root ledger
    pub fn root(&self) -> Result<Hash> {
        Ok(self.merkle()?.root())
    }

    /// Inclusion proof for the transaction at `txindex`
    pub fn membership_proof(&self, txindex: TxIndex) -> Result<Option<MerkleProof>> {
        if txindex as usize >= self.transactions.len() {
            return Ok(None);
        }
        Ok(Some(self.merkle()?.proof_at(txindex as usize)?))
    }

    /// Get transaction count
    pub fn tx_count(&self) -> u32 {
        self.transactions.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::address_of;
    use crate::tx::{TransactionInput, TransactionOutput};
    use plasma_merkle::{Keccak256Hasher, EMPTY_LEAF_HASH};

    fn key(byte: u8) -> SecretKey {
        SecretKey::from_slice(&[byte; 32]).unwrap()
    }

    fn transfer(owner: u8, amount: u128) -> Transaction {
        let mut tx = Transaction::new(
            &[TransactionInput::new(1, 0, 0)],
            &[TransactionOutput::new([owner; 20], amount)],
        )
        .unwrap();
        tx.sign(0, &key(owner)).unwrap();
        tx
    }

    #[test]
    fn test_sign_and_signer() {
        let mut block = Block::new(vec![transfer(1, 10)], 2);
        let hash = block.hash();
        block.sign(&key(0x99));
        assert_eq!(block.hash(), hash);
        assert_eq!(block.signer().unwrap(), address_of(&key(0x99)));
    }

    #[test]
    fn test_block_hash_covers_tx_signatures() {
        let unsigned = Block::new(
            vec![Transaction::new(&[TransactionInput::new(1, 0, 0)], &[]).unwrap()],
            2,
        );
        let mut signed = unsigned.clone();
        signed.transactions[0].sign(0, &key(3)).unwrap();
        assert_ne!(unsigned.hash(), signed.hash());
        // but the committed leaves are the same
        assert_eq!(unsigned.root().unwrap(), signed.root().unwrap());
    }

    #[test]
    fn test_is_deposit_block() {
        assert!(Block::deposit(Transaction::deposit([1; 20], 10), 1).is_deposit_block());
        assert!(!Block::new(vec![transfer(1, 10)], 1).is_deposit_block());
        assert!(!Block::new(
            vec![Transaction::deposit([1; 20], 10), Transaction::deposit([2; 20], 10)],
            1
        )
        .is_deposit_block());
        assert!(!Block::new(vec![], 1).is_deposit_block());
    }

    #[test]
    fn test_root_single_transaction() {
        let tx = transfer(4, 10);
        let block = Block::new(vec![tx.clone()], 3);
        let tree = block.merkle().unwrap();
        assert_eq!(tree.depth(), BLOCK_MERKLE_DEPTH);
        assert_eq!(tree.leaves()[0], Keccak256Hasher::hash(&tx.encoded()));
        assert_eq!(tree.leaves()[0], tx.hash());
        assert_eq!(tree.leaves()[1], EMPTY_LEAF_HASH);
    }

    #[test]
    fn test_membership_proof() {
        let block = Block::new(vec![transfer(1, 10), transfer(2, 20), transfer(3, 30)], 5);
        let root = block.root().unwrap();

        let proof = block.membership_proof(2).unwrap().unwrap();
        assert_eq!(proof.index, 2);
        assert_eq!(proof.as_bytes().len(), BLOCK_MERKLE_DEPTH * 32);
        assert!(proof.verify(&root, &block.transactions[2].encoded()));
        assert!(block.membership_proof(3).unwrap().is_none());
    }

    #[test]
    fn test_encoding_round_trip() {
        let mut block = Block::new(vec![transfer(1, 10), transfer(2, 20)], 7);
        block.sign(&key(0x99));
        let decoded = Block::decode(&block.signed_encoded()).unwrap();
        assert_eq!(decoded, block);
        assert_eq!(decoded.signer().unwrap(), address_of(&key(0x99)));
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(Block::decode(&[1, 2, 3]).is_err());
    }
}
