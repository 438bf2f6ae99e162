mod revoked;
mod user;

use std::sync::Arc;

pub use revoked::RevokedSignatures;
pub use user::{User, UserFileError, UserRole, UserStore, hash_password};

/// In-memory state of the reference host. Cloning shares the underlying stores.
#[derive(Clone)]
pub struct Store {
    users: Arc<UserStore>,
    revoked: Arc<RevokedSignatures>,
}

impl Store {
    pub fn new(users: UserStore) -> Self {
        Self {
            users: Arc::new(users),
            revoked: Arc::new(RevokedSignatures::new()),
        }
    }

    pub fn users(&self) -> &UserStore {
        &self.users
    }

    pub fn revoked(&self) -> &RevokedSignatures {
        &self.revoked
    }
}
