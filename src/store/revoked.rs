//! Revoked token signatures.
//!
//! Logging out revokes a single token by its signature segment, leaving the subject's other
//! sessions alone. Entries are never pruned: an expired token is rejected before this store
//! is consulted, so a stale entry only costs memory.

use std::collections::HashSet;
use std::sync::RwLock;

#[derive(Debug, Default)]
pub struct RevokedSignatures {
    signatures: RwLock<HashSet<String>>,
}

impl RevokedSignatures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the signature was already revoked.
    pub fn revoke(&self, signature: &str) -> bool {
        self.signatures
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(signature.to_string())
    }

    pub fn contains(&self, signature: &str) -> bool {
        self.signatures
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(signature)
    }

    pub fn len(&self) -> usize {
        self.signatures
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
