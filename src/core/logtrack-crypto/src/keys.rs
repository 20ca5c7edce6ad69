//! Symmetric key container with automatic memory zeroization.
//!
//! [`SymmetricKey`] implements `Zeroize` and `ZeroizeOnDrop` so key material
//! is erased from memory when it goes out of scope.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::aead::KEY_SIZE;
use crate::error::CryptoError;
use crate::random::generate_key;

/// A 256-bit symmetric encryption key with automatic zeroization.
///
/// The `Debug` implementation never prints the key bytes.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey {
    bytes: [u8; KEY_SIZE],
}

impl SymmetricKey {
    /// Generates a new random symmetric key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::EntropyFailure`] if the OS random source fails.
    pub fn generate() -> Result<Self, CryptoError> {
        let key = generate_key()?;
        Ok(Self { bytes: *key })
    }

    /// Creates a symmetric key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyLength`] if the input is not exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength {
                expected: KEY_SIZE,
                actual: bytes.len(),
            });
        }

        let mut key_bytes = [0u8; KEY_SIZE];
        key_bytes.copy_from_slice(bytes);

        Ok(Self { bytes: key_bytes })
    }

    /// Decodes a key from standard base64.
    pub fn from_base64(encoded: &str) -> Result<Self, CryptoError> {
        let raw = Zeroizing::new(
            BASE64
                .decode(encoded.trim())
                .map_err(|e| CryptoError::InvalidInput(format!("invalid base64 key: {e}")))?,
        );
        Self::from_bytes(&raw)
    }

    /// Encodes the key as standard base64.
    ///
    /// The returned string holds key material; the caller owns its lifetime.
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.bytes)
    }

    /// Returns the raw key bytes.
    ///
    /// Use with caution - the returned slice is not zeroized automatically.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}
