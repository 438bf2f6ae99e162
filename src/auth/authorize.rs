//! Per-request token verification.

use std::sync::Arc;

use super::config::AuthConfig;
use super::errors::AuthErrorKind;
use super::header::extract_token;
use super::hooks::AuthorizeHooks;
use super::request::AuthRequest;
use crate::jwt::{TokenCodec, VerifiedToken};
use crate::registry::KeyRegistry;

/// Gate for protected requests.
///
/// Pipeline: read header, split scheme, verify the token against the subject's registered
/// key, check expiry, consult the revocation hook, project claims. Every step either passes
/// or ends the request with one [`AuthErrorKind`]; nothing is retried.
#[derive(Clone)]
pub struct Authorizer {
    config: Arc<AuthConfig>,
    codec: TokenCodec,
    registry: Arc<dyn KeyRegistry>,
}

impl Authorizer {
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

    /// Authorize `request`.
    ///
    /// On success every claim is projected into the request and the verified token returned.
    /// On failure `on_authorize_error` is invoked once and nothing is projected.
    pub async fn authorize<R, H>(
        &self,
        request: &mut R,
        hooks: &H,
    ) -> Result<VerifiedToken, AuthErrorKind>
    where
        R: AuthRequest + Send + Sync,
        H: AuthorizeHooks<R>,
    {
        match self.check(request, hooks).await {
            Ok(verified) => {
                for (name, value) in &verified.claims {
                    request.set_request_value(name, value.clone());
                }
                Ok(verified)
            }
            Err(kind) => {
                hooks.on_authorize_error(request, kind);
                Err(kind)
            }
        }
    }

    async fn check<R, H>(&self, request: &R, hooks: &H) -> Result<VerifiedToken, AuthErrorKind>
    where
        R: AuthRequest + Send + Sync,
        H: AuthorizeHooks<R>,
    {
        let token = extract_token(
            request.header_value(&self.config.header_name),
            &self.config.scheme,
        )?;
        let verified = self.verify_token(token)?;

        if hooks.is_revoked(request, &verified.signature).await {
            return Err(AuthErrorKind::RevokedToken);
        }
        Ok(verified)
    }

    /// Verify a bare token string against the registry, without revocation or projection.
    pub fn verify_token(&self, token: &str) -> Result<VerifiedToken, AuthErrorKind> {
        self.codec
            .verify(token, |subject, _| self.registry.lookup(subject))
            .map_err(AuthErrorKind::from)
    }
}
