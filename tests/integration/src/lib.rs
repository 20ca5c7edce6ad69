//! Integration tests for Logtrack.
//!
//! These tests exercise the crypto and token crates together the way an
//! access-log service would: operator login, session tokens, sealed log
//! records and signed beacon parameters.

// Allow unwrap() in tests - panics are acceptable for test assertions
#![allow(clippy::disallowed_methods)]

use std::time::Duration;

use anyhow::{bail, Context, Result};
use logtrack_crypto::{aead, hash, kdf, HashAlgorithm, PasswordHasher, SymmetricKey, WorkFactor};
use logtrack_tokens::{Claims, TokenConfig, TokenManager};

// ============================================================================
// Test Service
// ============================================================================

/// A stored operator account.
pub struct Account {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub roles: Vec<String>,
}

/// Minimal service wiring the libraries together.
pub struct TestService {
    pub hasher: PasswordHasher,
    pub tokens: TokenManager,
    pub archive_key: SymmetricKey,
    pub beacon_secret: Vec<u8>,
}

impl TestService {
    /// Creates a service with cheap password hashing for fast tests.
    pub fn new() -> Result<Self> {
        let hasher = PasswordHasher::new(WorkFactor {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        })?;
        let tokens = TokenManager::new(TokenConfig::new(
            "integration-secret-minimum-32-chars",
            "logtrack-test",
        ))?;
        let archive_key = kdf::derive_encryption_key(b"service master secret", b"log-archive")?;

        Ok(Self {
            hasher,
            tokens,
            archive_key,
            beacon_secret: b"beacon-signing-secret".to_vec(),
        })
    }

    /// Registers an account, storing only the password hash.
    pub fn register(
        &self,
        id: &str,
        email: &str,
        password: &str,
        roles: &[&str],
    ) -> Result<Account> {
        Ok(Account {
            id: id.to_string(),
            email: email.to_string(),
            password_hash: self.hasher.hash(password)?,
            roles: roles.iter().map(|r| r.to_string()).collect(),
        })
    }

    /// Verifies a password and issues a session token.
    pub fn login(&self, account: &Account, password: &str) -> Result<String> {
        if !self.hasher.verify(password, &account.password_hash)? {
            bail!("invalid credentials");
        }

        let mut claims = Claims::new(&account.id).with_email(&account.email);
        for role in &account.roles {
            claims = claims.with_role(role);
        }

        self.tokens
            .issue(&claims, Duration::from_secs(900))
            .context("issue session token")
    }

    /// Encrypts a log line, binding it to the session subject.
    pub fn seal_record(&self, session: &str, line: &str) -> Result<Vec<u8>> {
        let subject = self.tokens.extract_subject(session)?;
        Ok(aead::encrypt(
            &self.archive_key,
            line.as_bytes(),
            Some(subject.as_bytes()),
        )?)
    }

    /// Decrypts a sealed log line for a session holding the `admin` role.
    pub fn open_record(&self, session: &str, owner: &str, sealed: &[u8]) -> Result<String> {
        if !self.tokens.has_role(session, "admin")? {
            bail!("admin role required");
        }
        let plaintext = aead::decrypt(&self.archive_key, sealed, Some(owner.as_bytes()))?;
        Ok(String::from_utf8(plaintext.to_vec())?)
    }

    /// Signs beacon query parameters.
    pub fn sign_beacon(&self, query: &str) -> Result<String> {
        Ok(hash::hmac(query.as_bytes(), &self.beacon_secret, HashAlgorithm::Sha256)?)
    }

    /// Verifies a beacon signature in constant time.
    pub fn verify_beacon(&self, query: &str, signature: &str) -> Result<bool> {
        Ok(hash::verify_hmac(
            query.as_bytes(),
            &self.beacon_secret,
            HashAlgorithm::Sha256,
            signature,
        )?)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    use logtrack_crypto::{random, CryptoError};
    use logtrack_tokens::TokenRejection;

    #[test]
    fn test_login_and_session_roles() {
        let service = TestService::new().unwrap();
        let account = service
            .register("op-1", "op@example.com", "secret123", &["admin", "analyst"])
            .unwrap();

        let session = service.login(&account, "secret123").unwrap();
        assert!(service.tokens.has_any_role(&session, &["viewer", "analyst"]).unwrap());

        assert!(service.login(&account, "wrong").is_err());
    }

    #[test]
    fn test_sealed_record_lifecycle() {
        let service = TestService::new().unwrap();
        let admin = service
            .register("admin-1", "admin@example.com", "pw-admin", &["admin"])
            .unwrap();
        let viewer = service
            .register("viewer-1", "viewer@example.com", "pw-viewer", &["viewer"])
            .unwrap();

        let admin_session = service.login(&admin, "pw-admin").unwrap();
        let viewer_session = service.login(&viewer, "pw-viewer").unwrap();

        let line = r#"203.0.113.7 - - "GET /pixel.gif HTTP/1.1" 200 43"#;
        let sealed = service.seal_record(&viewer_session, line).unwrap();

        // Admins can open; the record is bound to its owner.
        assert_eq!(
            service.open_record(&admin_session, "viewer-1", &sealed).unwrap(),
            line
        );
        assert!(service.open_record(&admin_session, "admin-1", &sealed).is_err());

        // Viewers cannot.
        assert!(service.open_record(&viewer_session, "viewer-1", &sealed).is_err());
    }

    #[test]
    fn test_refreshed_session_keeps_identity() {
        let service = TestService::new().unwrap();
        let account = service
            .register("op-2", "op2@example.com", "pw", &["analyst"])
            .unwrap();
        let session = service.login(&account, "pw").unwrap();

        let refreshed = service.tokens.refresh(&session, Duration::from_secs(60)).unwrap();
        let claims = service.tokens.validate(&refreshed).unwrap();

        assert_eq!(claims.claims.subject, "op-2");
        assert_eq!(claims.claims.email, "op2@example.com");
        assert!(claims.claims.has_role("analyst"));
    }

    #[test]
    fn test_foreign_session_rejected() {
        let service = TestService::new().unwrap();
        let other =
            TokenManager::new(TokenConfig::new("some-other-secret", service.tokens.issuer()))
                .unwrap();
        let forged = other
            .issue(&Claims::new("intruder").with_role("admin"), Duration::from_secs(60))
            .unwrap();

        let err = service.tokens.validate(&forged).unwrap_err();
        assert_eq!(err.rejection(), Some(TokenRejection::BadSignature));
        assert!(service.seal_record(&forged, "x").is_err());
    }

    #[test]
    fn test_beacon_signatures() {
        let service = TestService::new().unwrap();
        let query = "site=42&path=%2Fhome&ref=news";

        let signature = service.sign_beacon(query).unwrap();
        assert!(service.verify_beacon(query, &signature).unwrap());
        assert!(!service.verify_beacon("site=43&path=%2Fhome&ref=news", &signature).unwrap());
    }

    #[test]
    fn test_password_derived_key_roundtrip() {
        let salt = random::generate_salt(random::SALT_SIZE).unwrap();
        let key = kdf::derive_key_from_password(b"export passphrase", &salt, 1_000).unwrap();
        let again = kdf::derive_key_from_password(b"export passphrase", &salt, 1_000).unwrap();

        let sealed = aead::encrypt_string(&key, "daily export").unwrap();
        assert_eq!(aead::decrypt_string(&again, &sealed).unwrap(), "daily export");

        let wrong = kdf::derive_key_from_password(b"other passphrase", &salt, 1_000).unwrap();
        assert!(matches!(
            aead::decrypt_string(&wrong, &sealed),
            Err(CryptoError::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_concurrent_use() {
        let service = Arc::new(TestService::new().unwrap());
        let session = service
            .tokens
            .issue(&Claims::new("worker").with_role("admin"), Duration::from_secs(60))
            .unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let service = Arc::clone(&service);
                let session = session.clone();
                thread::spawn(move || {
                    let line = format!("request {i}");
                    let sealed = service.seal_record(&session, &line).unwrap();
                    let opened = service.open_record(&session, "worker", &sealed).unwrap();
                    assert_eq!(opened, line);
                    random::random_string(24).unwrap()
                })
            })
            .collect();

        let mut seen = std::collections::HashSet::new();
        for handle in handles {
            assert!(seen.insert(handle.join().unwrap()));
        }
    }
}
