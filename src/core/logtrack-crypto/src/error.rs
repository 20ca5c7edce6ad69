//! Cryptographic error types.

use thiserror::Error;

/// Errors that can occur during cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Invalid input data (bad length, empty required field, malformed encoding).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Key material has the wrong size.
    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength {
        /// Required key size in bytes.
        expected: usize,
        /// Size that was supplied.
        actual: usize,
    },

    /// The requested hash algorithm is not supported.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// AEAD tag did not verify or the ciphertext was truncated.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The operating system entropy source failed.
    #[error("entropy source failure: {0}")]
    EntropyFailure(String),

    /// Password hashing failed.
    #[error("hashing failed: {0}")]
    HashingFailed(String),

    /// Encryption failed.
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),
}
