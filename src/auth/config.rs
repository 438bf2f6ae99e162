//! Engine configuration supplied by the hosting application.

use std::time::Duration;

/// Header carrying the token when none is configured.
pub const DEFAULT_HEADER_NAME: &str = "Authorization";

/// Scheme prefix expected in front of the token.
pub const DEFAULT_SCHEME: &str = "Bearer";

/// Claim identifying the signing-key subject.
pub const DEFAULT_SUBJECT_FIELD: &str = "sub";

/// Token lifetime used by [`AuthConfig::default`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// Request header holding the token.
    pub header_name: String,
    /// Scheme prefix (`Bearer`). Empty means the whole header value is the token.
    pub scheme: String,
    /// Token lifetime. Zero issues tokens without an `exp` claim.
    pub timeout: Duration,
    /// Claim naming the subject whose key signs the token.
    pub subject_field: String,
    /// Hand the signature segment to the login response callback separately.
    pub expose_signature: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            header_name: DEFAULT_HEADER_NAME.to_string(),
            scheme: DEFAULT_SCHEME.to_string(),
            timeout: DEFAULT_TIMEOUT,
            subject_field: DEFAULT_SUBJECT_FIELD.to_string(),
            expose_signature: false,
        }
    }
}

impl AuthConfig {
    pub fn with_header_name(mut self, header_name: impl Into<String>) -> Self {
        self.header_name = header_name.into();
        self
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_subject_field(mut self, subject_field: impl Into<String>) -> Self {
        self.subject_field = subject_field.into();
        self
    }

    pub fn with_expose_signature(mut self, expose: bool) -> Self {
        self.expose_signature = expose;
        self
    }

    /// Lifetime in whole seconds, rounded up. `None` when tokens never expire.
    pub fn timeout_secs(&self) -> Option<u64> {
        if self.timeout.is_zero() {
            return None;
        }
        Some(u64::try_from(self.timeout.as_millis().div_ceil(1000)).unwrap_or(u64::MAX))
    }
}
