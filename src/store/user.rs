//! Credential table for the reference host.
//!
//! One user per line, `subject:<bcrypt hash>[:role]`. Blank lines and lines starting with `#`
//! are skipped. Hashes can be produced with `keygate --hash-password <PASSWORD>`.

use std::collections::HashMap;
use std::fmt;

use bcrypt::{BcryptError, DEFAULT_COST, HashParts};

/// User role embedded in issued tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(UserRole::User),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

/// Hash a password for the users file.
pub fn hash_password(password: &str) -> Result<String, BcryptError> {
    bcrypt::hash(password, DEFAULT_COST)
}

#[derive(Debug, Clone)]
pub struct User {
    pub subject: String,
    pub role: UserRole,
    password_hash: String,
}

impl User {
    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    /// A hash that fails to verify counts as a mismatch.
    pub fn verify_password(&self, candidate: &str) -> bool {
        bcrypt::verify(candidate, &self.password_hash).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserStore {
    users: HashMap<String, User>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a user. `password_hash` must be a bcrypt hash.
    pub fn with_user(mut self, subject: &str, password_hash: &str, role: UserRole) -> Self {
        self.users.insert(
            subject.to_string(),
            User {
                subject: subject.to_string(),
                role,
                password_hash: password_hash.to_string(),
            },
        );
        self
    }

    pub fn parse(content: &str) -> Result<Self, UserFileError> {
        let mut store = Self::new();
        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let line_no = index + 1;

            let mut fields = line.splitn(3, ':');
            let subject = fields.next().unwrap_or_default();
            let password_hash = fields
                .next()
                .ok_or(UserFileError::MissingHash { line: line_no })?;
            let role = match fields.next() {
                Some(role) => UserRole::parse(role).ok_or_else(|| UserFileError::UnknownRole {
                    line: line_no,
                    role: role.to_string(),
                })?,
                None => UserRole::User,
            };
            if subject.is_empty() {
                return Err(UserFileError::EmptySubject { line: line_no });
            }
            if password_hash.parse::<HashParts>().is_err() {
                return Err(UserFileError::InvalidHash { line: line_no });
            }

            store = store.with_user(subject, password_hash, role);
        }
        Ok(store)
    }

    pub fn get(&self, subject: &str) -> Option<&User> {
        self.users.get(subject)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserFileError {
    MissingHash { line: usize },
    EmptySubject { line: usize },
    InvalidHash { line: usize },
    UnknownRole { line: usize, role: String },
}

impl fmt::Display for UserFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserFileError::MissingHash { line } => {
                write!(f, "line {}: expected subject:password-hash", line)
            }
            UserFileError::EmptySubject { line } => write!(f, "line {}: empty subject", line),
            UserFileError::InvalidHash { line } => {
                write!(f, "line {}: password is not a bcrypt hash", line)
            }
            UserFileError::UnknownRole { line, role } => {
                write!(f, "line {}: unknown role {:?}", line, role)
            }
        }
    }
}

impl std::error::Error for UserFileError {}
