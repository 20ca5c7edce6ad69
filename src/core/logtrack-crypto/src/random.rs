//! Cryptographically secure random generation.
//!
//! Uses the operating system's CSPRNG for all random number generation.
//! Entropy failures are reported as [`CryptoError::EntropyFailure`] and are
//! never retried.

use rand::{rngs::OsRng, RngCore};
use zeroize::Zeroizing;

use crate::aead::{KEY_SIZE, NONCE_SIZE};
use crate::error::CryptoError;

/// Alphabet used by [`random_string`].
pub const ALPHANUMERIC: &[u8; 62] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Default salt size in bytes.
pub const SALT_SIZE: usize = 16;

/// Largest multiple of the alphabet size that fits in a byte (62 * 4).
/// Bytes at or above this value are rejected to keep the mapping uniform.
const REJECTION_LIMIT: u8 = 248;

fn fill(buf: &mut [u8]) -> Result<(), CryptoError> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| CryptoError::EntropyFailure(e.to_string()))
}

fn ensure_len(len: usize) -> Result<(), CryptoError> {
    if len == 0 {
        return Err(CryptoError::InvalidInput("length must be > 0".to_string()));
    }
    Ok(())
}

/// Generates a cryptographically secure random 256-bit key.
///
/// The key is wrapped in `Zeroizing` to ensure it is cleared from memory when dropped.
pub fn generate_key() -> Result<Zeroizing<[u8; KEY_SIZE]>, CryptoError> {
    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    fill(&mut *key)?;
    Ok(key)
}

/// Generates a cryptographically secure random nonce for AES-GCM.
pub fn generate_nonce() -> Result<[u8; NONCE_SIZE], CryptoError> {
    let mut nonce = [0u8; NONCE_SIZE];
    fill(&mut nonce)?;
    Ok(nonce)
}

/// Generates `len` cryptographically secure random bytes.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidInput`] when `len` is zero.
pub fn random_bytes(len: usize) -> Result<Vec<u8>, CryptoError> {
    ensure_len(len)?;
    let mut bytes = vec![0u8; len];
    fill(&mut bytes)?;
    Ok(bytes)
}

/// Generates an alphanumeric string of exactly `len` characters.
///
/// Each character is drawn uniformly from [`ALPHANUMERIC`] using rejection
/// sampling over random bytes.
pub fn random_string(len: usize) -> Result<String, CryptoError> {
    ensure_len(len)?;

    let mut out = String::with_capacity(len);
    let mut buf = Zeroizing::new([0u8; 64]);

    while out.len() < len {
        fill(&mut *buf)?;
        for &byte in buf.iter() {
            if byte >= REJECTION_LIMIT {
                continue;
            }
            out.push(ALPHANUMERIC[(byte as usize) % ALPHANUMERIC.len()] as char);
            if out.len() == len {
                break;
            }
        }
    }

    Ok(out)
}

/// Generates a lowercase hex string of exactly `len` characters.
///
/// Draws `ceil(len / 2)` random bytes; an odd length drops the final nibble.
pub fn random_hex(len: usize) -> Result<String, CryptoError> {
    ensure_len(len)?;
    let bytes = random_bytes(len.div_ceil(2))?;
    let mut hex = hex::encode(bytes);
    hex.truncate(len);
    Ok(hex)
}

/// Generates a random salt of `len` bytes.
pub fn generate_salt(len: usize) -> Result<Vec<u8>, CryptoError> {
    random_bytes(len)
}

/// Generates a cryptographically secure random token as a hex string.
///
/// # Arguments
///
/// * `byte_len` - Number of random bytes (output string will be 2x this length)
pub fn secure_token(byte_len: usize) -> Result<String, CryptoError> {
    let bytes = Zeroizing::new(random_bytes(byte_len)?);
    Ok(hex::encode(&*bytes))
}
