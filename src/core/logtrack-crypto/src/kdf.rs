//! Key derivation functions.
//!
//! - HKDF-SHA256 (RFC 5869) for deriving keys from high-entropy secrets.
//! - PBKDF2-HMAC-SHA256 (RFC 8018) for deriving keys from passwords.

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::aead::KEY_SIZE;
use crate::error::CryptoError;
use crate::keys::SymmetricKey;

/// Default PBKDF2 iteration count for password-derived keys.
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 600_000;

/// Maximum HKDF-SHA256 output length (255 blocks of 32 bytes).
const HKDF_MAX_LEN: usize = 255 * 32;

/// Derives a key using HKDF-SHA256.
///
/// # Arguments
///
/// * `ikm` - Input key material (the secret to derive from)
/// * `salt` - Optional salt value
/// * `info` - Context and application-specific information
/// * `length` - Desired output key length in bytes
///
/// # Returns
///
/// Derived key wrapped in `Zeroizing` for automatic memory cleanup.
pub fn derive_key(
    ikm: &[u8],
    salt: Option<&[u8]>,
    info: &[u8],
    length: usize,
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    if length == 0 {
        return Err(CryptoError::InvalidInput(
            "output length must be > 0".to_string(),
        ));
    }

    if length > HKDF_MAX_LEN {
        return Err(CryptoError::InvalidInput(
            "output length too large for HKDF-SHA256".to_string(),
        ));
    }

    let hkdf = Hkdf::<Sha256>::new(salt, ikm);

    let mut okm = Zeroizing::new(vec![0u8; length]);
    hkdf.expand(info, &mut okm)
        .map_err(|_| CryptoError::InvalidInput("HKDF expansion failed".to_string()))?;

    Ok(okm)
}

/// Derives an AES-256 key from a master secret using HKDF-SHA256.
///
/// `context` separates keys derived from the same master for different purposes.
pub fn derive_encryption_key(master: &[u8], context: &[u8]) -> Result<SymmetricKey, CryptoError> {
    let derived = derive_key(master, None, context, KEY_SIZE)?;
    SymmetricKey::from_bytes(&derived)
}

/// Derives an AES-256 key from a password using PBKDF2-HMAC-SHA256.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidInput`] for an empty salt or zero iterations.
pub fn derive_key_from_password(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
) -> Result<SymmetricKey, CryptoError> {
    if salt.is_empty() {
        return Err(CryptoError::InvalidInput("salt must not be empty".to_string()));
    }
    if iterations == 0 {
        return Err(CryptoError::InvalidInput(
            "iterations must be > 0".to_string(),
        ));
    }

    let mut okm = Zeroizing::new([0u8; KEY_SIZE]);
    pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut *okm);

    SymmetricKey::from_bytes(&*okm)
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_key_deterministic() {
        let key1 = derive_key(b"input key material", None, b"context", 32).unwrap();
        let key2 = derive_key(b"input key material", None, b"context", 32).unwrap();

        assert_eq!(*key1, *key2);
    }

    #[test]
    fn test_derive_key_different_info_different_keys() {
        let ikm = b"input key material";

        let key1 = derive_key(ikm, None, b"context1", 32).unwrap();
        let key2 = derive_key(ikm, None, b"context2", 32).unwrap();

        assert_ne!(*key1, *key2);
    }

    #[test]
    fn test_derive_key_length_bounds() {
        assert!(derive_key(b"ikm", None, b"info", 0).is_err());
        assert!(derive_key(b"ikm", None, b"info", HKDF_MAX_LEN + 1).is_err());
        assert_eq!(
            derive_key(b"ikm", None, b"info", HKDF_MAX_LEN).unwrap().len(),
            HKDF_MAX_LEN
        );
    }

    #[test]
    fn test_hkdf_rfc5869_test_vector() {
        let ikm = hex::decode("0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b").unwrap();
        let salt = hex::decode("000102030405060708090a0b0c").unwrap();
        let info = hex::decode("f0f1f2f3f4f5f6f7f8f9").unwrap();

        let okm = derive_key(&ikm, Some(&salt), &info, 42).unwrap();

        let expected = hex::decode(
            "3cb25f25faacd57a90434f64d0362f2a2d2d0a90cf1a5a4c5db02d56ecc4c5bf34007208d5b887185865",
        )
        .unwrap();

        assert_eq!(&*okm, &expected);
    }

    #[test]
    fn test_derive_encryption_key_contexts() {
        let a = derive_encryption_key(b"master secret", b"log-archive").unwrap();
        let b = derive_encryption_key(b"master secret", b"beacon-cookie").unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_pbkdf2_sha256_vector() {
        let key = derive_key_from_password(b"password", b"salt", 1).unwrap();
        assert_eq!(
            hex::encode(key.as_bytes()),
            "120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b"
        );
    }

    #[test]
    fn test_pbkdf2_iterations_matter() {
        let one = derive_key_from_password(b"password", b"salt", 1).unwrap();
        let two = derive_key_from_password(b"password", b"salt", 2).unwrap();
        assert_ne!(one.as_bytes(), two.as_bytes());
    }

    #[test]
    fn test_pbkdf2_rejects_bad_input() {
        assert!(matches!(
            derive_key_from_password(b"password", b"", 1000),
            Err(CryptoError::InvalidInput(_))
        ));
        assert!(matches!(
            derive_key_from_password(b"password", b"salt", 0),
            Err(CryptoError::InvalidInput(_))
        ));
    }
}
