//! Plasma child-chain ledger core
//!
//! UTXO transactions with two inputs and two outputs, operator-signed blocks
//! committed through a fixed-depth Merkle tree, and the [`ChildChain`] state
//! machine that validates and applies them in order.

pub mod block;
pub mod chain;
pub mod codec;
pub mod crypto;
pub mod error;
pub mod proof;
pub mod tx;
pub mod types;
pub mod utxo;

pub use block::Block;
pub use chain::{ChildChain, SubmitOutcome};
pub use crypto::{address_of, keccak256, recover_signer, sign};
pub use error::{PlasmaError, Result};
pub use proof::InclusionProof;
pub use tx::{Transaction, TransactionInput, TransactionOutput};
pub use types::*;
pub use utxo::{checked_encode_utxo_position, decode_utxo_position, encode_utxo_position};

pub use secp256k1::SecretKey;
