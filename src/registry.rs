//! Per-subject signing key registry.
//!
//! Every token is signed with the key of the subject it was issued to. The registry is the
//! only shared mutable state of the engine: logins (or admin actions) write to it, every
//! authorization reads from it. Writing a new key for a subject makes all tokens signed with
//! the previous key unverifiable, which is how a subject's sessions are revoked wholesale.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use rand::RngCore;

/// Length in bytes of keys produced by [`SigningKey::generate`].
pub const GENERATED_KEY_LEN: usize = 32;

/// Opaque HMAC key bound to one subject.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey(Arc<[u8]>);

impl SigningKey {
    pub fn new(bytes: impl AsRef<[u8]>) -> Self {
        Self(Arc::from(bytes.as_ref()))
    }

    /// Create a fresh random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; GENERATED_KEY_LEN];
        rand::rng().fill_bytes(&mut bytes);
        Self::new(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningKey(<{} bytes>)", self.0.len())
    }
}

impl From<&str> for SigningKey {
    fn from(value: &str) -> Self {
        Self::new(value.as_bytes())
    }
}

impl From<Vec<u8>> for SigningKey {
    fn from(value: Vec<u8>) -> Self {
        Self(Arc::from(value))
    }
}

/// Mapping from subject identifier to its active signing key.
///
/// Implementations synchronize internally; callers never lock. The last write for a subject
/// wins and no ordering is promised across subjects.
pub trait KeyRegistry: Send + Sync {
    /// Store or overwrite the key for `subject`.
    fn register(&self, subject: &str, key: SigningKey);

    /// Look up the active key for `subject`.
    fn lookup(&self, subject: &str) -> Option<SigningKey>;

    /// Drop the key for `subject`, returning it if one was registered.
    fn remove(&self, subject: &str) -> Option<SigningKey>;
}

/// In-process registry backed by a read/write locked map.
#[derive(Default)]
pub struct MemoryKeyRegistry {
    keys: RwLock<HashMap<String, SigningKey>>,
}

impl MemoryKeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.keys.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// Each write is a single insert/remove, so a poisoned lock still guards a consistent map.
impl KeyRegistry for MemoryKeyRegistry {
    fn register(&self, subject: &str, key: SigningKey) {
        self.keys
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(subject.to_string(), key);
    }

    fn lookup(&self, subject: &str) -> Option<SigningKey> {
        self.keys
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(subject)
            .cloned()
    }

    fn remove(&self, subject: &str) -> Option<SigningKey> {
        self.keys
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(subject)
    }
}

impl<T: KeyRegistry + ?Sized> KeyRegistry for Arc<T> {
    fn register(&self, subject: &str, key: SigningKey) {
        (**self).register(subject, key)
    }

    fn lookup(&self, subject: &str) -> Option<SigningKey> {
        (**self).lookup(subject)
    }

    fn remove(&self, subject: &str) -> Option<SigningKey> {
        (**self).remove(subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_missing_subject() {
        let registry = MemoryKeyRegistry::new();
        assert!(registry.lookup("alice").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = MemoryKeyRegistry::new();
        registry.register("alice", SigningKey::from("alice-key"));

        assert_eq!(registry.lookup("alice"), Some(SigningKey::from("alice-key")));
        assert!(registry.lookup("bob").is_none());
    }

    #[test]
    fn test_last_write_wins() {
        let registry = MemoryKeyRegistry::new();
        registry.register("alice", SigningKey::from("first"));
        registry.register("alice", SigningKey::from("second"));

        assert_eq!(registry.lookup("alice"), Some(SigningKey::from("second")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove() {
        let registry = MemoryKeyRegistry::new();
        registry.register("alice", SigningKey::from("k"));

        assert_eq!(registry.remove("alice"), Some(SigningKey::from("k")));
        assert!(registry.lookup("alice").is_none());
        assert!(registry.remove("alice").is_none());
    }

    #[test]
    fn test_generated_keys_differ() {
        let a = SigningKey::generate();
        let b = SigningKey::generate();

        assert_eq!(a.as_bytes().len(), GENERATED_KEY_LEN);
        assert_ne!(a, b);
    }

    #[test]
    fn test_debug_hides_key_material() {
        let key = SigningKey::from("super-secret");
        let printed = format!("{:?}", key);

        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("12 bytes"));
    }

    #[test]
    fn test_concurrent_readers_and_writers() {
        let registry = MemoryKeyRegistry::new();

        std::thread::scope(|s| {
            for writer in 0..4 {
                let registry = &registry;
                s.spawn(move || {
                    for i in 0..250 {
                        let subject = format!("user-{}", i % 50);
                        registry.register(&subject, SigningKey::new(format!("{writer}-{i}")));
                    }
                });
            }
            for _ in 0..4 {
                let registry = &registry;
                s.spawn(move || {
                    for i in 0..250 {
                        let _ = registry.lookup(&format!("user-{}", i % 50));
                    }
                });
            }
        });

        assert_eq!(registry.len(), 50);
        for i in 0..50 {
            assert!(registry.lookup(&format!("user-{i}")).is_some());
        }
    }

    #[test]
    fn test_shared_through_arc_dyn() {
        let registry: Arc<dyn KeyRegistry> = Arc::new(MemoryKeyRegistry::new());
        let clone = registry.clone();

        clone.register("alice", SigningKey::from("k"));
        assert_eq!(registry.lookup("alice"), Some(SigningKey::from("k")));
    }
}
