//! Token error types.

use std::fmt;

use thiserror::Error;

/// Why a token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    /// Not a well-formed `header.payload.signature` token.
    Malformed,
    /// Header `alg` is not an HMAC algorithm (e.g. `none`, `RS256`).
    AlgorithmMismatch,
    /// Signature does not verify under the configured secret.
    BadSignature,
    /// Current time is past `exp`.
    Expired,
    /// Current time is before `nbf`.
    NotYetValid,
    /// `iss` does not match the configured issuer.
    WrongIssuer,
}

impl fmt::Display for TokenRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Malformed => "malformed token",
            Self::AlgorithmMismatch => "unexpected signing algorithm",
            Self::BadSignature => "bad signature",
            Self::Expired => "token expired",
            Self::NotYetValid => "token not yet valid",
            Self::WrongIssuer => "wrong issuer",
        };
        f.write_str(reason)
    }
}

/// Errors that can occur while issuing or validating tokens.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Invalid configuration or arguments (empty secret, zero TTL, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The token could not be signed.
    #[error("signing failed: {0}")]
    SigningFailed(String),

    /// The token failed validation.
    #[error("invalid token: {reason}")]
    InvalidToken {
        /// Rejection cause.
        reason: TokenRejection,
    },
}

impl TokenError {
    /// Returns the rejection cause for [`TokenError::InvalidToken`].
    pub fn rejection(&self) -> Option<TokenRejection> {
        match self {
            Self::InvalidToken { reason } => Some(*reason),
            _ => None,
        }
    }
}

impl From<TokenRejection> for TokenError {
    fn from(reason: TokenRejection) -> Self {
        Self::InvalidToken { reason }
    }
}
