//! Values exchanged between the engines, the host application and request handlers.

use serde::Serialize;
use serde_json::Value;

use crate::jwt::{ClaimSet, subject_of};
use crate::registry::SigningKey;

/// Claims projected into a request after successful authorization, one entry per claim.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestClaims(ClaimSet);

impl RequestClaims {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// Subject identifier under `field`, normalized the same way keys are looked up.
    pub fn subject(&self, field: &str) -> Option<String> {
        subject_of(&self.0, field)
    }

    pub fn insert(&mut self, name: &str, value: Value) {
        self.0.insert(name.to_string(), value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &ClaimSet {
        &self.0
    }

    pub fn into_inner(self) -> ClaimSet {
        self.0
    }
}

/// Signature segment of the token that authorized the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSignature(pub String);

/// Authenticated caller as seen by a request handler.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    pub claims: RequestClaims,
    /// Revocation handle for this token.
    pub signature: String,
}

/// Result of a successful credential check.
#[derive(Debug, Clone)]
pub struct LoginGrant {
    /// Claims to embed. Must contain the configured subject field; `iat`/`exp` are overwritten.
    pub claims: ClaimSet,
    /// Key to register for the subject before the token is handed out. `None` signs with
    /// the subject's currently registered key.
    pub key: Option<SigningKey>,
}

impl LoginGrant {
    pub fn new(claims: ClaimSet) -> Self {
        Self { claims, key: None }
    }

    pub fn with_key(mut self, key: SigningKey) -> Self {
        self.key = Some(key);
        self
    }
}

/// A freshly minted token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedToken {
    pub token: String,
    /// Signature segment, present only when the engine is configured to expose it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Expiry timestamp (seconds since epoch), `None` when the token never expires.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
}
