//! UTXO position codec
//!
//! A position packs `(blknum, txindex, oindex)` into one integer:
//! `blknum * 10^9 + txindex * 10^4 + oindex`. Round-tripping holds for
//! `txindex < 10^5` and `oindex < 10^4`.

use crate::types::{BlockNumber, OutputIndex, TxIndex, UtxoPosition};

/// Multiplier for the block number
pub const BLKNUM_OFFSET: u64 = 1_000_000_000;

/// Multiplier for the transaction index
pub const TXINDEX_OFFSET: u64 = 10_000;

/// Pack a block number, transaction index and output index
///
/// Saturates at `UtxoPosition::MAX` when `blknum` is too large to pack.
pub const fn encode_utxo_position(
    blknum: BlockNumber,
    txindex: TxIndex,
    oindex: OutputIndex,
) -> UtxoPosition {
    match checked_encode_utxo_position(blknum, txindex, oindex) {
        Some(position) => position,
        None => UtxoPosition::MAX,
    }
}

/// Pack a position, `None` on overflow
pub const fn checked_encode_utxo_position(
    blknum: BlockNumber,
    txindex: TxIndex,
    oindex: OutputIndex,
) -> Option<UtxoPosition> {
    let Some(base) = blknum.checked_mul(BLKNUM_OFFSET) else {
        return None;
    };
    // txindex * 10^4 + oindex fits in u64 for any u32 pair
    base.checked_add(txindex as u64 * TXINDEX_OFFSET + oindex as u64)
}

/// Unpack a position into block number, transaction index and output index
pub const fn decode_utxo_position(position: UtxoPosition) -> (BlockNumber, TxIndex, OutputIndex) {
    let blknum = position / BLKNUM_OFFSET;
    let txindex = (position % BLKNUM_OFFSET) / TXINDEX_OFFSET;
    let oindex = position % TXINDEX_OFFSET;
    (blknum, txindex as TxIndex, oindex as OutputIndex)
}
