//! Hashing and recoverable secp256k1 signatures

use plasma_merkle::Keccak256Hasher;
use secp256k1::{
    ecdsa::{RecoverableSignature, RecoveryId},
    Message, PublicKey, SecretKey, SECP256K1,
};

use crate::error::Result;
use crate::types::{Address, Hash, Signature, SIGNATURE_LENGTH};

/// Offset added to the recovery id in the trailing `v` byte
const RECOVERY_ID_OFFSET: u8 = 27;

/// Compute keccak256
pub fn keccak256(data: &[u8]) -> Hash {
    Keccak256Hasher::hash(data)
}

/// Sign a 32-byte hash, producing `r ‖ s ‖ v` with `v = 27 + recovery_id`
pub fn sign(hash: &Hash, key: &SecretKey) -> Signature {
    let message = Message::from_digest(*hash);
    let (recovery_id, compact) = SECP256K1.sign_ecdsa_recoverable(&message, key).serialize_compact();

    let mut bytes = [0u8; SIGNATURE_LENGTH];
    bytes[..64].copy_from_slice(&compact);
    // recovery ids are 0..=3
    bytes[64] = recovery_id.to_i32() as u8 + RECOVERY_ID_OFFSET;
    Signature(bytes)
}

/// Recover the address that produced `signature` over `hash`
///
/// Accepts both `v ∈ {27, 28}` and raw recovery ids `v ∈ {0, 1}`.
pub fn recover_signer(hash: &Hash, signature: &Signature) -> Result<Address> {
    let bytes = signature.as_bytes();
    let v = bytes[64];
    let recovery_id = RecoveryId::from_i32(i32::from(v.checked_sub(RECOVERY_ID_OFFSET).unwrap_or(v)))?;
    let recoverable = RecoverableSignature::from_compact(&bytes[..64], recovery_id)?;

    let public_key = SECP256K1.recover_ecdsa(&Message::from_digest(*hash), &recoverable)?;
    Ok(public_key_to_address(&public_key))
}

/// Address controlled by a secret key
pub fn address_of(key: &SecretKey) -> Address {
    public_key_to_address(&PublicKey::from_secret_key_global(key))
}

/// Last 20 bytes of keccak256 over the uncompressed key without its prefix byte
fn public_key_to_address(public_key: &PublicKey) -> Address {
    let uncompressed = public_key.serialize_uncompressed();
    let digest = keccak256(&uncompressed[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&digest[12..]);
    address
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> SecretKey {
        SecretKey::from_slice(&[byte; 32]).unwrap()
    }

    #[test]
    fn test_known_address() {
        // Private key 0x...01 controls the well-known generator address.
        let mut raw = [0u8; 32];
        raw[31] = 1;
        let key = SecretKey::from_slice(&raw).unwrap();
        assert_eq!(
            hex::encode(address_of(&key)),
            "7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn test_sign_and_recover() {
        let hash = keccak256(b"plasma");
        let signature = sign(&hash, &key(0x11));

        assert!(signature.as_bytes()[64] == 27 || signature.as_bytes()[64] == 28);
        assert_eq!(recover_signer(&hash, &signature).unwrap(), address_of(&key(0x11)));
    }

    #[test]
    fn test_raw_recovery_id_accepted() {
        let hash = keccak256(b"raw v");
        let mut signature = sign(&hash, &key(0x22));
        signature.0[64] -= RECOVERY_ID_OFFSET;
        assert_eq!(recover_signer(&hash, &signature).unwrap(), address_of(&key(0x22)));
    }

    #[test]
    fn test_recover_over_other_hash_yields_other_address() {
        let signature = sign(&keccak256(b"one"), &key(0x33));
        let recovered = recover_signer(&keccak256(b"two"), &signature);
        assert!(recovered.map_or(true, |addr| addr != address_of(&key(0x33))));
    }

    #[test]
    fn test_null_signature_does_not_recover() {
        let hash = keccak256(b"null");
        assert!(recover_signer(&hash, &Signature::default()).is_err());
    }

    #[test]
    fn test_bad_recovery_byte_rejected() {
        let hash = keccak256(b"bad v");
        let mut signature = sign(&hash, &key(0x44));
        signature.0[64] = 99;
        assert!(recover_signer(&hash, &signature).is_err());
    }
}
