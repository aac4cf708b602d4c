use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use sha3::{Digest, Keccak256};
use tweedentity_types::Address;

use crate::convert::uint_to_string;
use crate::error::CryptoError;

/// `r ‖ s ‖ v`.
pub const SIGNATURE_LEN: usize = 65;

const SIGNED_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// The exact string signed off-chain: `"{namespace}/{uid}@tweedentity"`.
pub fn canonical_message(namespace: &str, uid: &str) -> String {
    format!("{}/{}@tweedentity", namespace, uid)
}

/// keccak256 of the domain prefix, the decimal message length, and the message.
pub fn ethereum_signed_message_hash(message: &str) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(SIGNED_MESSAGE_PREFIX.as_bytes());
    hasher.update(uint_to_string(message.len() as u128).as_bytes());
    hasher.update(message.as_bytes());
    hasher.finalize().into()
}

/// Ledger address of a public key: last 20 bytes of keccak256 of the
/// uncompressed point without its tag byte.
pub fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let digest = Keccak256::digest(&point.as_bytes()[1..]);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&digest[12..]);
    Address::new(bytes)
}

/// Recover the address that produced `signature` over `message`.
///
/// `v` may be `0`/`1` or `27`/`28`. High-s signatures are normalized first,
/// matching what the host's recovery precompile accepts.
pub fn recover_signer(message: &str, signature: &[u8]) -> Result<Address, CryptoError> {
    if signature.len() != SIGNATURE_LEN {
        return Err(CryptoError::InvalidSignature(format!(
            "expected {} bytes, got {}",
            SIGNATURE_LEN,
            signature.len()
        )));
    }

    let recovery_byte = match signature[64] {
        v @ (0 | 1) => v,
        v @ (27 | 28) => v - 27,
        v => {
            return Err(CryptoError::InvalidSignature(format!(
                "unsupported recovery byte {}",
                v
            )))
        }
    };

    let mut sig = Signature::from_slice(&signature[..64])
        .map_err(|_| CryptoError::InvalidSignature("malformed r or s".into()))?;
    let mut recovery_id = RecoveryId::from_byte(recovery_byte)
        .ok_or_else(|| CryptoError::InvalidSignature("bad recovery id".into()))?;

    if let Some(normalized) = sig.normalize_s() {
        sig = normalized;
        recovery_id = RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced());
    }

    let digest = ethereum_signed_message_hash(message);
    let key = VerifyingKey::recover_from_prehash(&digest, &sig, recovery_id)
        .map_err(|_| CryptoError::RecoveryFailed)?;

    Ok(address_of(&key))
}

/// Whether `signature` over `message` recovers to `claimed_signer`.
pub fn is_signed_by(message: &str, signature: &[u8], claimed_signer: &Address) -> bool {
    match recover_signer(message, signature) {
        Ok(signer) => signer == *claimed_signer,
        Err(_) => false,
    }
}

/// Produce the signature a wallet would embed in a post (`v` in `27`/`28` form).
pub fn sign_message(key: &SigningKey, message: &str) -> Result<[u8; SIGNATURE_LEN], CryptoError> {
    let digest = ethereum_signed_message_hash(message);
    let (sig, recovery_id) = key
        .sign_prehash_recoverable(&digest)
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;

    let mut out = [0u8; SIGNATURE_LEN];
    out[..64].copy_from_slice(&sig.to_bytes());
    out[64] = 27 + recovery_id.to_byte();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hexstr::parse_signature_token;
    use proptest::prelude::*;

    const FIXTURE_SIGNER: &str = "0x185f86b29bce5b40e54600959c710f1314fa5f45";
    const FIXTURE_MESSAGE: &str = "twitter/137042753@tweedentity";
    const FIXTURE_SIG: &str = "0xabb708bb366a13dd7990883a696f1502d64db4a1de45bfb6de1c8f1e37cb8ebc7c9190a5051615bd7623f7e4e3cec33f603ba363d111aa50787e43a82d75db391c";

    fn key(seed: u8) -> SigningKey {
        SigningKey::from_slice(&[seed; 32]).unwrap()
    }

    #[test]
    fn builds_canonical_message() {
        assert_eq!(canonical_message("twitter", "137042753"), FIXTURE_MESSAGE);
    }

    #[test]
    fn recovers_wallet_signature_fixture() {
        let sig = parse_signature_token(FIXTURE_SIG).unwrap();
        let signer = Address::parse(FIXTURE_SIGNER).unwrap();

        assert_eq!(recover_signer(FIXTURE_MESSAGE, &sig).unwrap(), signer);
        assert!(is_signed_by(FIXTURE_MESSAGE, &sig, &signer));
        assert!(!is_signed_by("twitter/137042754@tweedentity", &sig, &signer));
    }

    #[test]
    fn sign_then_recover() {
        let signing = key(7);
        let expected = address_of(signing.verifying_key());
        let sig = sign_message(&signing, FIXTURE_MESSAGE).unwrap();

        assert!(sig[64] == 27 || sig[64] == 28);
        assert!(is_signed_by(FIXTURE_MESSAGE, &sig, &expected));
        assert!(!is_signed_by(FIXTURE_MESSAGE, &sig, &address_of(key(8).verifying_key())));
    }

    #[test]
    fn accepts_zero_based_recovery_byte() {
        let signing = key(3);
        let expected = address_of(signing.verifying_key());
        let mut sig = sign_message(&signing, "github/42@tweedentity").unwrap();
        sig[64] -= 27;
        assert_eq!(recover_signer("github/42@tweedentity", &sig).unwrap(), expected);
    }

    #[test]
    fn rejects_bad_shapes() {
        assert!(matches!(
            recover_signer(FIXTURE_MESSAGE, &[0u8; 64]),
            Err(CryptoError::InvalidSignature(_))
        ));
        let mut sig = parse_signature_token(FIXTURE_SIG).unwrap();
        sig[64] = 29;
        assert!(recover_signer(FIXTURE_MESSAGE, &sig).is_err());
        assert!(recover_signer(FIXTURE_MESSAGE, &[0u8; 65]).is_err());
    }

    #[test]
    fn flipping_any_bit_breaks_the_signature() {
        let signing = key(11);
        let signer = address_of(signing.verifying_key());
        let sig = sign_message(&signing, FIXTURE_MESSAGE).unwrap();

        for byte in 0..SIGNATURE_LEN {
            for bit in 0..8 {
                let mut tampered = sig;
                tampered[byte] ^= 1 << bit;
                assert!(
                    !is_signed_by(FIXTURE_MESSAGE, &tampered, &signer),
                    "bit {} of byte {} still verified",
                    bit,
                    byte
                );
            }
        }
    }

    #[test]
    fn signed_message_hash_includes_length_prefix() {
        let a = ethereum_signed_message_hash("ab");
        let b = ethereum_signed_message_hash("ab ");
        assert_ne!(a, b);

        let mut hasher = Keccak256::new();
        hasher.update(b"\x19Ethereum Signed Message:\n2ab");
        let expected: [u8; 32] = hasher.finalize().into();
        assert_eq!(a, expected);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn recovery_matches_signer(seed in any::<[u8; 32]>(), uid in "[0-9]{1,20}") {
            let signing = match SigningKey::from_slice(&seed) {
                Ok(k) => k,
                Err(_) => return Ok(()),
            };
            let message = canonical_message("twitter", &uid);
            let sig = sign_message(&signing, &message).unwrap();
            prop_assert_eq!(
                recover_signer(&message, &sig).unwrap(),
                address_of(signing.verifying_key())
            );
        }
    }
}
