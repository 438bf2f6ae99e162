//! Token issuance at login.

use std::sync::Arc;

use serde_json::Value;

use super::config::AuthConfig;
use super::errors::LoginError;
use super::hooks::LoginHooks;
use super::types::{IssuedToken, LoginGrant};
use crate::jwt::{CLAIM_EXPIRES_AT, CLAIM_ISSUED_AT, TokenCodec, signature_of, subject_of, unix_now};
use crate::registry::KeyRegistry;

/// Runs the login flow: credential check, claim assembly, signing, response.
#[derive(Clone)]
pub struct Authenticator {
    config: Arc<AuthConfig>,
    codec: TokenCodec,
    registry: Arc<dyn KeyRegistry>,
}

impl Authenticator {
    pub fn new(config: Arc<AuthConfig>, registry: Arc<dyn KeyRegistry>) -> Self {
        let codec = TokenCodec::new(config.subject_field.clone());
        Self {
            config,
            codec,
            registry,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Log a caller in.
    ///
    /// Exactly one of `on_login_response` / `on_login_error` is invoked. The outcome is also
    /// returned so callers that do not route everything through hooks can act on it.
    pub async fn login<R, H>(&self, request: &mut R, hooks: &H) -> Result<IssuedToken, LoginError>
    where
        R: Send,
        H: LoginHooks<R>,
    {
        let outcome = match hooks.check_credentials(request).await {
            Ok(grant) => self.issue(grant),
            Err(e) => Err(LoginError::Credentials(e)),
        };

        match &outcome {
            Ok(issued) => hooks.on_login_response(request, issued),
            Err(e) => hooks.on_login_error(request, e),
        }
        outcome
    }

    /// Mint a token for claims that have already passed a credential check.
    pub fn issue(&self, grant: LoginGrant) -> Result<IssuedToken, LoginError> {
        let LoginGrant { mut claims, key } = grant;

        let subject =
            subject_of(&claims, &self.config.subject_field).ok_or(LoginError::MissingSubject)?;
        let rotate = key.is_some();
        let key = match key {
            Some(key) => key,
            None => self
                .registry
                .lookup(&subject)
                .ok_or(LoginError::UnknownSubject)?,
        };

        let now = unix_now();
        claims.insert(CLAIM_ISSUED_AT.to_string(), Value::from(now));
        let expires_at = match self.config.timeout_secs() {
            Some(secs) => {
                let exp = now.saturating_add(secs);
                claims.insert(CLAIM_EXPIRES_AT.to_string(), Value::from(exp));
                Some(exp)
            }
            None => {
                claims.remove(CLAIM_EXPIRES_AT);
                None
            }
        };

        let token = self.codec.sign(&claims, &key)?;

        // Register only once signing succeeded so a failed login never rotates a key.
        if rotate {
            self.registry.register(&subject, key);
        }

        let signature = if self.config.expose_signature {
            signature_of(&token).map(str::to_string)
        } else {
            None
        };

        Ok(IssuedToken {
            token,
            signature,
            expires_at,
        })
    }
}
