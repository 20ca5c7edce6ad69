//! Message digests and HMAC.
//!
//! The supported algorithm set is closed and dispatched through
//! [`HashAlgorithm`]. Digests are rendered as lowercase hex.

use std::fmt;
use std::str::FromStr;

use hmac::{digest::KeyInit, Hmac, Mac};
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};
use subtle::ConstantTimeEq;

use crate::error::CryptoError;

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// MD5 (legacy checksums only).
    Md5,
    /// SHA-1 (legacy checksums only).
    Sha1,
    /// SHA-256.
    Sha256,
    /// SHA-512.
    Sha512,
}

impl HashAlgorithm {
    /// All supported algorithms.
    pub const ALL: [HashAlgorithm; 4] = [Self::Md5, Self::Sha1, Self::Sha256, Self::Sha512];

    /// Digest size in bytes.
    pub fn output_len(self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha1 => 20,
            Self::Sha256 => 32,
            Self::Sha512 => 64,
        }
    }

    /// Canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "md5" => Ok(Self::Md5),
            "sha1" | "sha-1" => Ok(Self::Sha1),
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "sha512" | "sha-512" => Ok(Self::Sha512),
            _ => Err(CryptoError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

/// Computes the raw digest of `data`.
pub fn digest(data: &[u8], algorithm: HashAlgorithm) -> Vec<u8> {
    match algorithm {
        HashAlgorithm::Md5 => Md5::digest(data).to_vec(),
        HashAlgorithm::Sha1 => Sha1::digest(data).to_vec(),
        HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
        HashAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
    }
}

/// Computes the digest of `data` as lowercase hex.
pub fn hash(data: &[u8], algorithm: HashAlgorithm) -> String {
    hex::encode(digest(data, algorithm))
}

/// Like [`hash`], with the algorithm given by name.
///
/// # Errors
///
/// Returns [`CryptoError::UnsupportedAlgorithm`] for unknown names.
pub fn hash_named(data: &[u8], algorithm: &str) -> Result<String, CryptoError> {
    Ok(hash(data, algorithm.parse()?))
}

fn compute_mac<M: Mac + KeyInit>(data: &[u8], key: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut mac = <M as KeyInit>::new_from_slice(key)
        .map_err(|e| CryptoError::InvalidInput(format!("hmac key rejected: {e}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Computes the raw HMAC of `data` under `key`.
pub fn hmac_bytes(
    data: &[u8],
    key: &[u8],
    algorithm: HashAlgorithm,
) -> Result<Vec<u8>, CryptoError> {
    match algorithm {
        HashAlgorithm::Md5 => compute_mac::<Hmac<Md5>>(data, key),
        HashAlgorithm::Sha1 => compute_mac::<Hmac<Sha1>>(data, key),
        HashAlgorithm::Sha256 => compute_mac::<Hmac<Sha256>>(data, key),
        HashAlgorithm::Sha512 => compute_mac::<Hmac<Sha512>>(data, key),
    }
}

/// Computes the HMAC of `data` under `key` as lowercase hex.
pub fn hmac(data: &[u8], key: &[u8], algorithm: HashAlgorithm) -> Result<String, CryptoError> {
    Ok(hex::encode(hmac_bytes(data, key, algorithm)?))
}

/// Like [`hmac`], with the algorithm given by name.
pub fn hmac_named(data: &[u8], key: &[u8], algorithm: &str) -> Result<String, CryptoError> {
    hmac(data, key, algorithm.parse()?)
}

/// Recomputes the digest of `data` and compares it with `expected_hex`.
///
/// Hex case is ignored. Digests are not secrets, so ordinary equality is used.
pub fn verify_hash(data: &[u8], algorithm: HashAlgorithm, expected_hex: &str) -> bool {
    hash(data, algorithm).eq_ignore_ascii_case(expected_hex.trim())
}

/// Recomputes the HMAC of `data` and compares it with `expected_hex` in constant time.
///
/// Malformed hex yields `Ok(false)`.
pub fn verify_hmac(
    data: &[u8],
    key: &[u8],
    algorithm: HashAlgorithm,
    expected_hex: &str,
) -> Result<bool, CryptoError> {
    let computed = hmac_bytes(data, key, algorithm)?;
    let Ok(expected) = hex::decode(expected_hex.trim()) else {
        return Ok(false);
    };
    Ok(constant_time_eq(&computed, &expected))
}

/// Compares two byte slices in constant time.
///
/// Slices of different length compare unequal immediately; length is not secret.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
