//! Token issuance and validation.

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Deserialize;
use tracing::debug;

use crate::{Claims, TokenClaims, TokenError, TokenRejection};

/// Signing algorithms accepted by [`TokenManager::validate`].
pub const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Default token lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Configuration for a [`TokenManager`].
#[derive(Clone)]
pub struct TokenConfig {
    /// Shared HMAC signing secret.
    pub secret: String,
    /// Issuer stamped into and required from every token.
    pub issuer: String,
    /// Algorithm used when signing (must be HS256, HS384 or HS512).
    pub algorithm: Algorithm,
    /// Lifetime used by [`TokenManager::issue_default`].
    pub default_ttl: Duration,
}

impl TokenConfig {
    /// Creates a config with HS256 and a one hour default lifetime.
    pub fn new(secret: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: issuer.into(),
            algorithm: Algorithm::HS256,
            default_ttl: DEFAULT_TTL,
        }
    }
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("algorithm", &self.algorithm)
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

/// Issues and validates HMAC-signed claims tokens.
///
/// Immutable after construction and safe to share between threads.
pub struct TokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    header: Header,
    validation: Validation,
    issuer: String,
    default_ttl: Duration,
}

#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

impl TokenManager {
    /// Creates a new token manager.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidInput`] for an empty secret or issuer, a
    /// non-HMAC algorithm, or a default lifetime that is not a whole number
    /// of seconds of at least one.
    pub fn new(config: TokenConfig) -> Result<Self, TokenError> {
        if config.secret.is_empty() {
            return Err(TokenError::InvalidInput("secret must not be empty".into()));
        }
        if config.issuer.is_empty() {
            return Err(TokenError::InvalidInput("issuer must not be empty".into()));
        }
        if !HMAC_ALGORITHMS.contains(&config.algorithm) {
            return Err(TokenError::InvalidInput(format!(
                "{:?} is not an HMAC algorithm",
                config.algorithm
            )));
        }
        ttl_secs(config.default_ttl)?;

        let mut validation = Validation::new(config.algorithm);
        validation.algorithms = HMAC_ALGORITHMS.to_vec();
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "sub"]);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            header: Header::new(config.algorithm),
            validation,
            issuer: config.issuer,
            default_ttl: config.default_ttl,
        })
    }

    /// Returns the configured issuer.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Signs `claims` into a token valid from now for `ttl`.
    ///
    /// Token timestamps have one second resolution, so `ttl` must be a whole
    /// number of seconds.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidInput`] for an empty subject, a `ttl`
    /// under one second or with a fractional part, and
    /// [`TokenError::SigningFailed`] if encoding fails.
    pub fn issue(&self, claims: &Claims, ttl: Duration) -> Result<String, TokenError> {
        if claims.subject.is_empty() {
            return Err(TokenError::InvalidInput("subject must not be empty".into()));
        }
        let ttl = ttl_secs(ttl)?;

        let now = jsonwebtoken::get_current_timestamp();
        let exp = now
            .checked_add(ttl)
            .ok_or_else(|| TokenError::InvalidInput("ttl out of range".into()))?;

        let token_claims = TokenClaims {
            claims: claims.clone(),
            iss: self.issuer.clone(),
            iat: now,
            nbf: now,
            exp,
        };

        let token = encode(&self.header, &token_claims, &self.encoding_key)
            .map_err(|e| TokenError::SigningFailed(e.to_string()))?;

        debug!(subject = %claims.subject, ttl_secs = ttl, "Token issued");

        Ok(token)
    }

    /// Signs `claims` with the configured default lifetime.
    pub fn issue_default(&self, claims: &Claims) -> Result<String, TokenError> {
        self.issue(claims, self.default_ttl)
    }

    /// Validates a token and returns its claims.
    ///
    /// The header algorithm is checked against the HMAC family before the
    /// signature is looked at, so `none` and asymmetric algorithms are
    /// rejected outright. Temporal checks use zero leeway.
    pub fn validate(&self, token: &str) -> Result<TokenClaims, TokenError> {
        check_algorithm(token)?;

        let data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| TokenError::from(rejection(e.kind())))?;

        Ok(data.claims)
    }

    /// Validates `token` and reissues its identity claims with a fresh validity window.
    pub fn refresh(&self, token: &str, ttl: Duration) -> Result<String, TokenError> {
        let current = self.validate(token)?;
        debug!(subject = %current.claims.subject, "Refreshing token");
        self.issue(&current.claims, ttl)
    }

    /// Validates `token` and returns its subject.
    pub fn extract_subject(&self, token: &str) -> Result<String, TokenError> {
        Ok(self.validate(token)?.claims.subject)
    }

    /// Validates `token` and returns its roles.
    pub fn extract_roles(&self, token: &str) -> Result<BTreeSet<String>, TokenError> {
        Ok(self.validate(token)?.claims.roles)
    }

    /// Validates `token` and checks for `role`.
    pub fn has_role(&self, token: &str, role: &str) -> Result<bool, TokenError> {
        Ok(self.validate(token)?.claims.has_role(role))
    }

    /// Validates `token` and checks for any of `roles`.
    pub fn has_any_role(&self, token: &str, roles: &[&str]) -> Result<bool, TokenError> {
        Ok(self.validate(token)?.claims.has_any_role(roles))
    }
}

fn ttl_secs(ttl: Duration) -> Result<u64, TokenError> {
    if ttl.subsec_nanos() != 0 {
        return Err(TokenError::InvalidInput(format!(
            "ttl must be whole seconds, got {ttl:?}"
        )));
    }
    match ttl.as_secs() {
        0 => Err(TokenError::InvalidInput(
            "ttl must be at least one second".into(),
        )),
        secs => Ok(secs),
    }
}

/// Rejects tokens whose header names anything but an HMAC algorithm.
fn check_algorithm(token: &str) -> Result<(), TokenRejection> {
    let parts: Vec<&str> = token.split('.').collect();
    let [header, _, _] = parts.as_slice() else {
        return Err(TokenRejection::Malformed);
    };

    let raw = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|_| TokenRejection::Malformed)?;
    let header: RawHeader = serde_json::from_slice(&raw).map_err(|_| TokenRejection::Malformed)?;

    match header.alg.parse::<Algorithm>() {
        Ok(alg) if HMAC_ALGORITHMS.contains(&alg) => Ok(()),
        _ => Err(TokenRejection::AlgorithmMismatch),
    }
}

fn rejection(kind: &ErrorKind) -> TokenRejection {
    match kind {
        ErrorKind::ExpiredSignature => TokenRejection::Expired,
        ErrorKind::ImmatureSignature => TokenRejection::NotYetValid,
        ErrorKind::InvalidSignature => TokenRejection::BadSignature,
        ErrorKind::InvalidIssuer => TokenRejection::WrongIssuer,
        ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
            TokenRejection::AlgorithmMismatch
        },
        _ => TokenRejection::Malformed,
    }
}
