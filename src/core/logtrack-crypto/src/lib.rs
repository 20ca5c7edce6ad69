//! # Logtrack Crypto
//!
//! Stateless cryptographic helpers used across Logtrack.
//!
//! This crate provides:
//! - Hashing and HMAC (MD5, SHA-1, SHA-256, SHA-512)
//! - Secure random bytes, strings, hex tokens and salts
//! - Password hashing (Argon2id)
//! - Symmetric encryption (AES-256-GCM)
//! - Key derivation (HKDF, PBKDF2)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod aead;
pub mod error;
pub mod hash;
pub mod kdf;
pub mod keys;
pub mod password;
pub mod random;

pub use error::CryptoError;
pub use hash::HashAlgorithm;
pub use keys::SymmetricKey;
pub use password::{hash_password, verify_password, PasswordHasher, WorkFactor};
