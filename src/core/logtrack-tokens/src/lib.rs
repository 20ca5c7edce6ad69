//! # Logtrack Tokens
//!
//! Signed, expiring claims tokens for Logtrack.
//!
//! Tokens are JWTs (`header.payload.signature`) signed with an HMAC algorithm
//! (HS256, HS384 or HS512) and a shared secret. Validation pins the algorithm
//! family, the issuer, and the `nbf`/`exp` window.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod claims;
pub mod error;
pub mod manager;

pub use claims::{Claims, TokenClaims};
pub use error::{TokenError, TokenRejection};
pub use jsonwebtoken::Algorithm;
pub use manager::{TokenConfig, TokenManager, DEFAULT_TTL, HMAC_ALGORITHMS};
