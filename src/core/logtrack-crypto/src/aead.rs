//! AES-256-GCM authenticated encryption.
//!
//! Every call to [`encrypt`] draws a fresh random nonce and prepends it to the
//! output. [`decrypt`] fails closed: no plaintext is returned unless the tag
//! verifies.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::keys::SymmetricKey;
use crate::random::generate_nonce;

/// Size of an AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;

/// Size of a GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;

/// Size of a GCM authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

fn cipher(key: &SymmetricKey) -> Result<Aes256Gcm, CryptoError> {
    Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| CryptoError::InvalidKeyLength {
        expected: KEY_SIZE,
        actual: key.as_bytes().len(),
    })
}

/// Encrypts plaintext using AES-256-GCM.
///
/// The nonce is automatically generated and prepended to the ciphertext.
/// Format: `nonce (12 bytes) || ciphertext || tag (16 bytes)`
///
/// # Arguments
///
/// * `key` - 256-bit encryption key
/// * `plaintext` - Data to encrypt
/// * `associated_data` - Optional additional data to authenticate (not encrypted)
pub fn encrypt(
    key: &SymmetricKey,
    plaintext: &[u8],
    associated_data: Option<&[u8]>,
) -> Result<Vec<u8>, CryptoError> {
    let cipher = cipher(key)?;

    let nonce_bytes = generate_nonce()?;
    let nonce = Nonce::from_slice(&nonce_bytes);

    let payload = Payload {
        msg: plaintext,
        aad: associated_data.unwrap_or_default(),
    };
    let ciphertext = cipher
        .encrypt(nonce, payload)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    result.extend_from_slice(&nonce_bytes);
    result.extend_from_slice(&ciphertext);

    Ok(result)
}

/// Decrypts ciphertext produced by [`encrypt`].
///
/// # Errors
///
/// Returns [`CryptoError::AuthenticationFailed`] when the input is shorter than
/// a nonce plus a tag, or when the tag does not verify under `key` and
/// `associated_data`.
///
/// # Returns
///
/// Decrypted plaintext wrapped in `Zeroizing` for automatic memory cleanup.
pub fn decrypt(
    key: &SymmetricKey,
    ciphertext: &[u8],
    associated_data: Option<&[u8]>,
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    if ciphertext.len() < NONCE_SIZE + TAG_SIZE {
        return Err(CryptoError::AuthenticationFailed);
    }

    let cipher = cipher(key)?;

    let (nonce_bytes, encrypted) = ciphertext.split_at(NONCE_SIZE);
    let nonce = Nonce::from_slice(nonce_bytes);

    let payload = Payload {
        msg: encrypted,
        aad: associated_data.unwrap_or_default(),
    };
    let plaintext = cipher
        .decrypt(nonce, payload)
        .map_err(|_| CryptoError::AuthenticationFailed)?;

    Ok(Zeroizing::new(plaintext))
}

/// Encrypts a string and returns the ciphertext as standard base64.
pub fn encrypt_string(key: &SymmetricKey, plaintext: &str) -> Result<String, CryptoError> {
    let ciphertext = encrypt(key, plaintext.as_bytes(), None)?;
    Ok(BASE64.encode(ciphertext))
}

/// Decrypts a base64 ciphertext produced by [`encrypt_string`].
///
/// # Errors
///
/// Returns [`CryptoError::InvalidInput`] for malformed base64 or a plaintext
/// that is not UTF-8, and [`CryptoError::AuthenticationFailed`] when the tag
/// does not verify.
pub fn decrypt_string(key: &SymmetricKey, encoded: &str) -> Result<String, CryptoError> {
    let ciphertext = BASE64
        .decode(encoded.trim())
        .map_err(|e| CryptoError::InvalidInput(format!("invalid base64 ciphertext: {e}")))?;

    let plaintext = decrypt(key, &ciphertext, None)?;

    String::from_utf8(plaintext.to_vec())
        .map_err(|_| CryptoError::InvalidInput("plaintext is not valid UTF-8".to_string()))
}
