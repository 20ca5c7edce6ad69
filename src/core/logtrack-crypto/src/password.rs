//! Password hashing with Argon2id.
//!
//! Hashes are PHC strings (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`) that
//! embed their own salt and cost parameters, so nothing else needs storing.
//! Hashing is deliberately expensive; tune it with [`WorkFactor`].

use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::random::{generate_salt, SALT_SIZE};

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkFactor {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes.
    pub iterations: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl Default for WorkFactor {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl WorkFactor {
    fn params(&self) -> Result<Params, CryptoError> {
        Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| CryptoError::InvalidInput(format!("invalid work factor: {e}")))
    }
}

/// Hashes and verifies passwords with a fixed work factor.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    work_factor: WorkFactor,
    params: Params,
}

impl PasswordHasher {
    /// Creates a hasher for the given work factor.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidInput`] if Argon2 rejects the parameters.
    pub fn new(work_factor: WorkFactor) -> Result<Self, CryptoError> {
        let params = work_factor.params()?;
        Ok(Self {
            work_factor,
            params,
        })
    }

    /// Returns the configured work factor.
    pub fn work_factor(&self) -> WorkFactor {
        self.work_factor
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hashes a password with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<String, CryptoError> {
        let salt_bytes = Zeroizing::new(generate_salt(SALT_SIZE)?);
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| CryptoError::HashingFailed(e.to_string()))?;

        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| CryptoError::HashingFailed(e.to_string()))?;

        debug!(
            m_cost = self.work_factor.memory_kib,
            t_cost = self.work_factor.iterations,
            "Password hashed"
        );

        Ok(hash.to_string())
    }

    /// Verifies a password against an encoded hash.
    ///
    /// A wrong password yields `Ok(false)`. The cost parameters embedded in
    /// `encoded` are used, not this hasher's.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidInput`] if `encoded` is not a valid Argon2 PHC string.
    pub fn verify(&self, password: &str, encoded: &str) -> Result<bool, CryptoError> {
        let parsed = parse(encoded)?;

        match self.argon2().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(CryptoError::InvalidInput(format!(
                "cannot verify password hash: {e}"
            ))),
        }
    }

    /// Returns true when `encoded` was produced with a different algorithm or
    /// work factor than this hasher uses.
    pub fn needs_rehash(&self, encoded: &str) -> Result<bool, CryptoError> {
        let parsed = parse(encoded)?;

        if parsed.algorithm != Algorithm::Argon2id.ident() {
            return Ok(true);
        }

        let params = Params::try_from(&parsed)
            .map_err(|e| CryptoError::InvalidInput(format!("invalid hash parameters: {e}")))?;

        Ok(params.m_cost() != self.params.m_cost()
            || params.t_cost() != self.params.t_cost()
            || params.p_cost() != self.params.p_cost())
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            work_factor: WorkFactor::default(),
            params: Params::default(),
        }
    }
}

fn parse(encoded: &str) -> Result<PasswordHash<'_>, CryptoError> {
    PasswordHash::new(encoded)
        .map_err(|e| CryptoError::InvalidInput(format!("malformed password hash: {e}")))
}

/// Hashes a password with the default work factor.
pub fn hash_password(password: &str) -> Result<String, CryptoError> {
    PasswordHasher::default().hash(password)
}

/// Verifies a password against an encoded hash. See [`PasswordHasher::verify`].
pub fn verify_password(password: &str, encoded: &str) -> Result<bool, CryptoError> {
    PasswordHasher::default().verify(password, encoded)
}
