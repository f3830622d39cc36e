//! Canonical encoding
//!
//! Fields are written in declared order, integers as fixed-width big-endian,
//! fixed arrays without a length and sequences or byte strings behind a u64
//! length prefix. Decoding rejects trailing bytes.

use bincode::Options;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_big_endian()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

/// Encode a value into its canonical byte form
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Vec<u8> {
    // Serializing ledger types into memory only fails on size limits, and no
    // limit is configured.
    options().serialize(value).expect("in-memory canonical encoding is infallible")
}

/// Decode a value from its canonical byte form
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(options().deserialize(bytes)?)
}
