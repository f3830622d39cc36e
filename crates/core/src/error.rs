//! Ledger error types

use plasma_merkle::MerkleError;
use thiserror::Error;

use crate::types::{Address, Amount, BlockNumber, UtxoPosition};

/// Errors raised while building, validating or querying the child chain
///
/// Validation errors carry the input slot and UTXO position that triggered
/// them. A validation error never leaves the ledger partially updated.
#[derive(Debug, Error)]
pub enum PlasmaError {
    /// Merkle tree construction or proof failure
    #[error(transparent)]
    Merkle(#[from] MerkleError),

    /// No applied block with this number
    #[error("block {0} not found")]
    BlockNotFound(BlockNumber),

    /// Block exists but has no transaction at the referenced index
    #[error("transaction for position {0} not found")]
    TransactionNotFound(UtxoPosition),

    /// Transaction exists but has no output at the referenced index
    #[error("output at position {0} not found")]
    OutputNotFound(UtxoPosition),

    /// Input signature missing or not made by the owner of the spent output
    #[error(
        "invalid signature for input {input} spending {position}: expected 0x{}, recovered 0x{}",
        hex::encode(.expected),
        hex::encode(.recovered)
    )]
    InvalidSignature {
        position: UtxoPosition,
        input: usize,
        expected: Address,
        recovered: Address,
    },

    /// Block signature missing or not made by the operator
    #[error("invalid signature on block {number}: signer 0x{}", hex::encode(.signer))]
    InvalidBlockSignature { number: BlockNumber, signer: Address },

    /// Output already consumed by an applied transaction, an earlier
    /// transaction in the same block, or an exit
    #[error("input {input} spends {position}, which is already spent")]
    AlreadySpent { position: UtxoPosition, input: usize },

    /// Outputs exceed inputs for a non-deposit transaction
    #[error("outputs total {output_amount} exceeds inputs total {input_amount}")]
    AmountMismatch { input_amount: Amount, output_amount: Amount },

    /// Deposit delivered ahead of the chain head
    #[error("expected block {expected}, got {actual}")]
    UnexpectedBlockNumber { expected: BlockNumber, actual: BlockNumber },

    /// Challenge references a transaction that does not spend the exiting output
    #[error("transaction at {spending} does not spend {exiting}")]
    NotSpentBy { exiting: UtxoPosition, spending: UtxoPosition },

    /// Input or output slot beyond the fixed transaction arity
    #[error("slot index {0} out of range")]
    InputIndexOutOfRange(usize),

    /// More inputs or outputs than the fixed transaction arity
    #[error("too many entries: at most {max}, got {actual}")]
    TooManyEntries { max: usize, actual: usize },

    /// Signature bytes could not be turned into a public key
    #[error("signature recovery failed: {0}")]
    SignatureRecovery(#[from] secp256k1::Error),

    /// Canonical encoding or decoding failed
    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),
}

impl PlasmaError {
    /// Whether this error means a referenced block, transaction or output is absent
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::BlockNotFound(_) | Self::TransactionNotFound(_) | Self::OutputNotFound(_)
        )
    }
}

/// Result alias for ledger operations
pub type Result<T, E = PlasmaError> = std::result::Result<T, E>;
