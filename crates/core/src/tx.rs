//! Fixed-arity UTXO transaction

use secp256k1::SecretKey;
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::crypto::{keccak256, recover_signer, sign};
use crate::error::{PlasmaError, Result};
use crate::types::{
    Address, Amount, BlockNumber, Hash, OutputIndex, Signature, TxIndex, UtxoPosition,
    DEPOSIT_BLOCK_NUMBER, NULL_ADDRESS, NUM_TXOS,
};
use crate::utxo::{decode_utxo_position, encode_utxo_position};

/// Reference to a previously created output
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    /// Block holding the transaction that created the output
    pub blknum: BlockNumber,
    /// Index of that transaction within its block
    pub txindex: TxIndex,
    /// Index of the output within that transaction
    pub oindex: OutputIndex,
}

impl TransactionInput {
    /// Create an input
    pub const fn new(blknum: BlockNumber, txindex: TxIndex, oindex: OutputIndex) -> Self {
        Self { blknum, txindex, oindex }
    }

    /// Create an input from a packed position
    pub const fn from_position(position: UtxoPosition) -> Self {
        let (blknum, txindex, oindex) = decode_utxo_position(position);
        Self { blknum, txindex, oindex }
    }

    /// Packed position of the referenced output, saturating on overflow
    pub const fn position(&self) -> UtxoPosition {
        encode_utxo_position(self.blknum, self.txindex, self.oindex)
    }

    /// Whether this input originates from a root-ledger deposit
    pub const fn is_deposit(&self) -> bool {
        self.blknum == DEPOSIT_BLOCK_NUMBER
    }
}

/// Value assigned to an owner
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    /// Owner address
    pub owner: Address,
    /// Amount
    pub amount: Amount,
}

impl TransactionOutput {
    /// Create an output
    pub const fn new(owner: Address, amount: Amount) -> Self {
        Self { owner, amount }
    }
}

/// Plasma transaction with exactly [`NUM_TXOS`] inputs and outputs
///
/// Only inputs, outputs and signatures are encoded. Confirmations are spend
/// acknowledgements collected after inclusion, and `spent` is ledger-side
/// state owned by the chain that applied the transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Inputs, right-padded with the zero input
    pub inputs: [TransactionInput; NUM_TXOS],
    /// Outputs, right-padded with the zero output
    pub outputs: [TransactionOutput; NUM_TXOS],
    /// One signature per input over [`Transaction::hash`]
    pub signatures: [Signature; NUM_TXOS],
    /// One confirmation per input over [`Transaction::confirmation_hash`]
    #[serde(skip)]
    pub confirmations: [Signature; NUM_TXOS],
    /// Per-output spent flags; only meaningful once applied
    #[serde(skip)]
    pub spent: [bool; NUM_TXOS],
}

#[derive(Serialize)]
struct UnsignedTransaction<'a> {
    inputs: &'a [TransactionInput; NUM_TXOS],
    outputs: &'a [TransactionOutput; NUM_TXOS],
}

impl Transaction {
    /// Create an unsigned transaction, padding inputs and outputs to [`NUM_TXOS`]
    pub fn new(inputs: &[TransactionInput], outputs: &[TransactionOutput]) -> Result<Self> {
        Ok(Self {
            inputs: pad(inputs)?,
            outputs: pad(outputs)?,
            signatures: Default::default(),
            confirmations: Default::default(),
            spent: [false; NUM_TXOS],
        })
    }

    /// Create a deposit transaction paying `amount` to `owner`
    pub fn deposit(owner: Address, amount: Amount) -> Self {
        let mut outputs = [TransactionOutput::default(); NUM_TXOS];
        outputs[0] = TransactionOutput::new(owner, amount);
        Self {
            inputs: [TransactionInput::default(); NUM_TXOS],
            outputs,
            signatures: Default::default(),
            confirmations: Default::default(),
            spent: [false; NUM_TXOS],
        }
    }

    /// Unsigned encoding; this is what gets hashed and committed as a Merkle leaf
    pub fn encoded(&self) -> Vec<u8> {
        codec::encode(&UnsignedTransaction { inputs: &self.inputs, outputs: &self.outputs })
    }

    /// Full encoding including signatures
    pub fn signed_encoded(&self) -> Vec<u8> {
        codec::encode(self)
    }

    /// Decode from the full encoding
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        codec::decode(bytes)
    }

    /// Transaction hash
    pub fn hash(&self) -> Hash {
        keccak256(&self.encoded())
    }

    /// Hash signed by confirmations: `H(hash)`
    pub fn confirmation_hash(&self) -> Hash {
        keccak256(&self.hash())
    }

    /// Whether every input originates from a deposit
    pub fn is_deposit(&self) -> bool {
        self.inputs.iter().all(TransactionInput::is_deposit)
    }

    /// Sign the transaction for input `index`
    pub fn sign(&mut self, index: usize, key: &SecretKey) -> Result<()> {
        let hash = self.hash();
        *slot(&mut self.signatures, index)? = sign(&hash, key);
        Ok(())
    }

    /// Add a confirmation signature for input `index`
    pub fn confirm(&mut self, index: usize, key: &SecretKey) -> Result<()> {
        let hash = self.confirmation_hash();
        *slot(&mut self.confirmations, index)? = sign(&hash, key);
        Ok(())
    }

    /// Address that signed input `index`, or [`NULL_ADDRESS`] for an empty slot
    pub fn signer(&self, index: usize) -> Result<Address> {
        let signature = self.signatures.get(index).ok_or(PlasmaError::InputIndexOutOfRange(index))?;
        if signature.is_null() {
            return Ok(NULL_ADDRESS);
        }
        recover_signer(&self.hash(), signature)
    }

    /// Signer per input; empty or unrecoverable slots yield [`NULL_ADDRESS`]
    pub fn signers(&self) -> [Address; NUM_TXOS] {
        let mut signers = [NULL_ADDRESS; NUM_TXOS];
        for (index, signer) in signers.iter_mut().enumerate() {
            *signer = self.signer(index).unwrap_or(NULL_ADDRESS);
        }
        signers
    }

    /// Output at `oindex`
    pub fn output(&self, oindex: OutputIndex) -> Option<&TransactionOutput> {
        self.outputs.get(oindex as usize)
    }

    /// Sum of output amounts, `None` on overflow
    pub fn output_total(&self) -> Option<Amount> {
        self.outputs.iter().try_fold(0, |total: Amount, output| total.checked_add(output.amount))
    }

    /// Signatures concatenated in input order
    pub fn joined_signatures(&self) -> Vec<u8> {
        self.signatures.iter().flat_map(|s| s.0).collect()
    }

    /// Confirmations concatenated in input order
    pub fn joined_confirmations(&self) -> Vec<u8> {
        self.confirmations.iter().flat_map(|s| s.0).collect()
    }
}

fn pad<T: Copy + Default>(entries: &[T]) -> Result<[T; NUM_TXOS]> {
    if entries.len() > NUM_TXOS {
        return Err(PlasmaError::TooManyEntries { max: NUM_TXOS, actual: entries.len() });
    }
    let mut padded = [T::default(); NUM_TXOS];
    padded[..entries.len()].copy_from_slice(entries);
    Ok(padded)
}

fn slot(slots: &mut [Signature; NUM_TXOS], index: usize) -> Result<&mut Signature> {
    slots.get_mut(index).ok_or(PlasmaError::InputIndexOutOfRange(index))
}
