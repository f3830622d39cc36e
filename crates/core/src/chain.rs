//! Child chain state machine
//!
//! Blocks are applied strictly in number order. A block that arrives ahead of
//! the head is parked under its parent's number and drained as soon as the
//! parent applies.

use std::collections::{HashMap, HashSet};

use plasma_merkle::MerkleError;
use tracing::{debug, info, warn};

use crate::block::Block;
use crate::crypto::recover_signer;
use crate::error::{PlasmaError, Result};
use crate::proof::InclusionProof;
use crate::tx::{Transaction, TransactionInput, TransactionOutput};
use crate::types::{
    to_hex, Address, Amount, BlockNumber, Signature, UtxoPosition, BLOCK_CAPACITY,
    BLOCK_MERKLE_DEPTH, NULL_ADDRESS, NUM_TXOS,
};
use crate::utxo::decode_utxo_position;

const LOG_TARGET: &str = "plasma::chain";

/// What happened to a submitted block
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Validated, stored and the head advanced
    Applied,
    /// Parked until its parent applies
    Queued,
    /// Already at or below the applied head; ignored
    Duplicate,
}

impl SubmitOutcome {
    /// Lowercase name used on the wire
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Queued => "queued",
            Self::Duplicate => "duplicate",
        }
    }
}

/// Validating ledger of applied blocks
#[derive(Clone, Debug)]
pub struct ChildChain {
    /// Address that must sign every non-deposit block
    operator: Address,
    /// Applied blocks by number
    blocks: HashMap<BlockNumber, Block>,
    /// Early blocks keyed by the number of the block they wait for
    parent_queue: HashMap<BlockNumber, Vec<Block>>,
    /// Next block number expected
    head: BlockNumber,
}

impl ChildChain {
    /// Create an empty chain expecting block 1
    pub fn new(operator: Address) -> Self {
        Self { operator, blocks: HashMap::new(), parent_queue: HashMap::new(), head: 1 }
    }

    /// Submit an operator block
    ///
    /// On error nothing is stored. Queued descendants drained after a
    /// successful apply are validated individually; failures among them are
    /// logged and dropped.
    pub fn submit_block(&mut self, block: Block) -> Result<SubmitOutcome> {
        if block.number < self.head {
            debug!(target: LOG_TARGET, number = block.number, head = self.head, "duplicate block ignored");
            return Ok(SubmitOutcome::Duplicate);
        }
        if block.number > self.head {
            debug!(target: LOG_TARGET, number = block.number, head = self.head, "block queued");
            self.parent_queue.entry(block.number - 1).or_default().push(block);
            return Ok(SubmitOutcome::Queued);
        }

        self.validate_block(&block)?;
        self.apply_and_drain(block);
        Ok(SubmitOutcome::Applied)
    }

    /// Record a deposit observed on the root ledger
    ///
    /// Deposits are trusted and skip signature checks, but must arrive exactly
    /// at the head.
    pub fn apply_deposit(
        &mut self,
        blknum: BlockNumber,
        owner: Address,
        amount: Amount,
    ) -> Result<SubmitOutcome> {
        if blknum < self.head {
            debug!(target: LOG_TARGET, blknum, head = self.head, "duplicate deposit ignored");
            return Ok(SubmitOutcome::Duplicate);
        }
        if blknum > self.head {
            return Err(PlasmaError::UnexpectedBlockNumber { expected: self.head, actual: blknum });
        }

        info!(target: LOG_TARGET, blknum, owner = %to_hex(owner), %amount, "deposit");
        self.apply_and_drain(Block::deposit(Transaction::deposit(owner, amount), blknum));
        Ok(SubmitOutcome::Applied)
    }

    /// Mark an output as exited so it can no longer be spent
    pub fn apply_exit(&mut self, position: UtxoPosition) -> Result<()> {
        let (tx, oindex) = self.output_slot_mut(TransactionInput::from_position(position))?;
        tx.spent[oindex] = true;
        info!(target: LOG_TARGET, position, "exit started");
        Ok(())
    }

    /// Check a block against the applied state without changing it
    pub fn validate_block(&self, block: &Block) -> Result<()> {
        if !block.is_deposit_block() {
            let signer = block.signer().unwrap_or(NULL_ADDRESS);
            if block.signature.is_null() || signer != self.operator {
                return Err(PlasmaError::InvalidBlockSignature { number: block.number, signer });
            }
        }

        if block.transactions.len() > BLOCK_CAPACITY {
            return Err(MerkleError::InvalidTreeSize {
                depth: BLOCK_MERKLE_DEPTH,
                leaves: block.transactions.len(),
            }
            .into());
        }

        let mut spent = HashSet::new();
        for tx in &block.transactions {
            self.validate_transaction(tx, &mut spent)?;
        }
        Ok(())
    }

    /// Check one transaction's inputs, signatures and amounts
    ///
    /// `extra_spent` holds positions consumed earlier in the same block; every
    /// input checked here is added to it.
    pub fn validate_transaction(
        &self,
        tx: &Transaction,
        extra_spent: &mut HashSet<UtxoPosition>,
    ) -> Result<()> {
        let mut input_amount: Amount = 0;

        for (index, input) in tx.inputs.iter().enumerate() {
            if input.is_deposit() {
                continue;
            }
            let (source, oindex) = self.resolve(input)?;
            let position = input.position();
            let output = &source.outputs[oindex];
            input_amount = input_amount.saturating_add(output.amount);

            let recovered = tx.signer(index).unwrap_or(NULL_ADDRESS);
            if tx.signatures[index].is_null() || recovered != output.owner {
                return Err(PlasmaError::InvalidSignature {
                    position,
                    input: index,
                    expected: output.owner,
                    recovered,
                });
            }

            if source.spent[oindex] || !extra_spent.insert(position) {
                return Err(PlasmaError::AlreadySpent { position, input: index });
            }
        }

        if !tx.is_deposit() {
            match tx.output_total() {
                Some(output_amount) if output_amount <= input_amount => {}
                output_amount => {
                    return Err(PlasmaError::AmountMismatch {
                        input_amount,
                        output_amount: output_amount.unwrap_or(Amount::MAX),
                    })
                }
            }
        }
        Ok(())
    }

    /// Attach a spend confirmation to input `input` of the transaction at `position`
    pub fn add_confirmation(
        &mut self,
        position: UtxoPosition,
        input: usize,
        signature: Signature,
    ) -> Result<()> {
        let tx = self.get_transaction(position)?;
        let spent_input = *tx.inputs.get(input).ok_or(PlasmaError::InputIndexOutOfRange(input))?;
        let expected = if spent_input.is_deposit() {
            NULL_ADDRESS
        } else {
            let (source, oindex) = self.resolve(&spent_input)?;
            source.outputs[oindex].owner
        };
        let recovered = recover_signer(&tx.confirmation_hash(), &signature).unwrap_or(NULL_ADDRESS);

        if spent_input.is_deposit() || signature.is_null() || recovered != expected {
            return Err(PlasmaError::InvalidSignature {
                position: spent_input.position(),
                input,
                expected,
                recovered,
            });
        }

        self.transaction_mut(position)?.confirmations[input] = signature;
        debug!(target: LOG_TARGET, position, input, "confirmation stored");
        Ok(())
    }

    /// Inclusion proof for the transaction creating the output at `position`
    pub fn exit_proof(&self, position: UtxoPosition) -> Result<InclusionProof> {
        self.get_output(position)?;
        self.inclusion_proof(position)
    }

    /// Inclusion proof for the transaction at `spending` that consumes `exiting`
    pub fn challenge_proof(
        &self,
        exiting: UtxoPosition,
        spending: UtxoPosition,
    ) -> Result<InclusionProof> {
        let tx = self.get_transaction(spending)?;
        let exiting_input = TransactionInput::from_position(exiting);
        let spends = tx.inputs.iter().any(|input| !input.is_deposit() && *input == exiting_input);
        if !spends {
            return Err(PlasmaError::NotSpentBy { exiting, spending });
        }
        self.inclusion_proof(spending)
    }

    /// Get an applied block
    pub fn get_block(&self, number: BlockNumber) -> Result<&Block> {
        self.blocks.get(&number).ok_or(PlasmaError::BlockNotFound(number))
    }

    /// Get the transaction at `position`; the output index is ignored
    pub fn get_transaction(&self, position: UtxoPosition) -> Result<&Transaction> {
        let (blknum, txindex, _) = decode_utxo_position(position);
        self.get_block(blknum)?
            .transactions
            .get(txindex as usize)
            .ok_or(PlasmaError::TransactionNotFound(position))
    }

    /// Get the output at `position`
    pub fn get_output(&self, position: UtxoPosition) -> Result<&TransactionOutput> {
        let (source, oindex) = self.resolve(&TransactionInput::from_position(position))?;
        Ok(&source.outputs[oindex])
    }

    /// Whether the output at `position` has been spent or exited
    pub fn is_spent(&self, position: UtxoPosition) -> Result<bool> {
        let (source, oindex) = self.resolve(&TransactionInput::from_position(position))?;
        Ok(source.spent[oindex])
    }

    /// Next block number expected
    pub fn head(&self) -> BlockNumber {
        self.head
    }

    /// Operator address
    pub fn operator(&self) -> Address {
        self.operator
    }

    /// Number of blocks waiting for a parent
    pub fn queued_block_count(&self) -> usize {
        self.parent_queue.values().map(Vec::len).sum()
    }

    /// Apply a validated block, then every queued descendant that validates
    fn apply_and_drain(&mut self, block: Block) {
        let number = block.number;
        self.apply_block(block);

        let mut pending = self.take_children(number);
        while let Some(child) = pending.pop() {
            if child.number != self.head {
                debug!(target: LOG_TARGET, number = child.number, head = self.head, "duplicate block ignored");
                continue;
            }
            if let Err(err) = self.validate_block(&child) {
                warn!(target: LOG_TARGET, number = child.number, %err, "queued block rejected");
                continue;
            }
            let number = child.number;
            self.apply_block(child);
            pending.extend(self.take_children(number));
        }
    }

    /// Queued children of `number`, reversed so that popping yields arrival order
    fn take_children(&mut self, number: BlockNumber) -> Vec<Block> {
        let mut children = self.parent_queue.remove(&number).unwrap_or_default();
        children.reverse();
        children
    }

    fn apply_block(&mut self, mut block: Block) {
        for tx in &mut block.transactions {
            tx.spent = [false; NUM_TXOS];
        }
        for tx in &block.transactions {
            for input in tx.inputs.iter().filter(|input| !input.is_deposit()) {
                if let Ok((source, oindex)) = self.output_slot_mut(*input) {
                    source.spent[oindex] = true;
                }
            }
        }

        let number = block.number;
        info!(
            target: LOG_TARGET,
            number,
            transactions = block.transactions.len(),
            hash = %to_hex(block.hash()),
            "block applied"
        );
        self.blocks.insert(number, block);
        self.head = number + 1;
    }

    fn inclusion_proof(&self, position: UtxoPosition) -> Result<InclusionProof> {
        let (blknum, txindex, _) = decode_utxo_position(position);
        let block = self.get_block(blknum)?;
        let tx = block
            .transactions
            .get(txindex as usize)
            .ok_or(PlasmaError::TransactionNotFound(position))?;
        let proof = block
            .membership_proof(txindex)?
            .ok_or(PlasmaError::TransactionNotFound(position))?;

        Ok(InclusionProof {
            position,
            encoded_transaction: tx.encoded(),
            merkle_proof: proof.into_bytes(),
            signatures: tx.joined_signatures(),
            confirmations: tx.joined_confirmations(),
        })
    }

    /// Transaction and output slot referenced by `input`
    ///
    /// Looks up by the `(blknum, txindex, oindex)` triple; the packed position
    /// is only built for error payloads.
    fn resolve(&self, input: &TransactionInput) -> Result<(&Transaction, usize)> {
        let tx = self
            .get_block(input.blknum)?
            .transactions
            .get(input.txindex as usize)
            .ok_or_else(|| PlasmaError::TransactionNotFound(input.position()))?;
        let oindex = input.oindex as usize;
        if oindex >= NUM_TXOS {
            return Err(PlasmaError::OutputNotFound(input.position()));
        }
        Ok((tx, oindex))
    }

    fn output_slot_mut(&mut self, input: TransactionInput) -> Result<(&mut Transaction, usize)> {
        let oindex = input.oindex as usize;
        let tx = self
            .blocks
            .get_mut(&input.blknum)
            .ok_or(PlasmaError::BlockNotFound(input.blknum))?
            .transactions
            .get_mut(input.txindex as usize)
            .ok_or_else(|| PlasmaError::TransactionNotFound(input.position()))?;
        if oindex >= NUM_TXOS {
            return Err(PlasmaError::OutputNotFound(input.position()));
        }
        Ok((tx, oindex))
    }

    fn transaction_mut(&mut self, position: UtxoPosition) -> Result<&mut Transaction> {
        let (tx, _) = self.output_slot_mut(TransactionInput::from_position(position))?;
        Ok(tx)
    }
}
