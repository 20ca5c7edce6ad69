//! Claim types carried inside tokens.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Identity claims supplied by the caller when issuing a token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    #[serde(rename = "sub")]
    pub subject: String,

    /// Display name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Email address.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,

    /// Granted roles. Order is not significant.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub roles: BTreeSet<String>,

    /// Application-defined string fields.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom: BTreeMap<String, String>,
}

impl Claims {
    /// Creates claims for a subject.
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            ..Self::default()
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the email address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    /// Adds a role.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    /// Adds a custom field, replacing any previous value.
    pub fn with_custom(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom.insert(key.into(), value.into());
        self
    }

    /// Checks if `role` was granted.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// Checks if any of `roles` was granted.
    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        roles.iter().any(|role| self.has_role(role))
    }
}

/// The full claim set of a signed token: identity plus issuer and validity window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Identity claims.
    #[serde(flatten)]
    pub claims: Claims,

    /// Issuer.
    pub iss: String,

    /// Issued at (Unix timestamp).
    pub iat: u64,

    /// Not before (Unix timestamp).
    pub nbf: u64,

    /// Expiration (Unix timestamp).
    pub exp: u64,
}
