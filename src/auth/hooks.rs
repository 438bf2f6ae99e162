//! Extension points the hosting application plugs into the engines.
//!
//! Required callbacks are trait methods without a body; optional ones have a default that
//! does nothing, so leaving a callback out is a compile-time choice rather than an unset
//! function pointer.

use std::future::{self, Future};

use super::errors::{AuthErrorKind, BoxError, LoginError};
use super::types::{IssuedToken, LoginGrant};

/// Callbacks driving [`Authenticator::login`](super::Authenticator::login).
pub trait LoginHooks<R>: Send + Sync {
    /// Validate the caller's credentials and return the claims to embed.
    ///
    /// May suspend (database, remote service). Its latency and errors are passed through
    /// unchanged; the engine adds no timeout.
    fn check_credentials(
        &self,
        request: &mut R,
    ) -> impl Future<Output = Result<LoginGrant, BoxError>> + Send;

    /// Deliver the minted token to the caller.
    fn on_login_response(&self, request: &mut R, issued: &IssuedToken);

    /// Report a failed login. Ignored unless overridden.
    fn on_login_error(&self, _request: &mut R, _error: &LoginError) {}
}

/// Callbacks consulted by [`Authorizer::authorize`](super::Authorizer::authorize).
pub trait AuthorizeHooks<R>: Send + Sync {
    /// Whether the token with this signature has been revoked. Only called for tokens whose
    /// signature and expiry already verified. Defaults to "never revoked".
    fn is_revoked(&self, _request: &R, _signature: &str) -> impl Future<Output = bool> + Send {
        future::ready(false)
    }

    /// Report a failed authorization. Ignored unless overridden.
    fn on_authorize_error(&self, _request: &mut R, _error: AuthErrorKind) {}
}

/// Uses every default: nothing is revoked and errors are only returned.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl<R> AuthorizeHooks<R> for NoHooks {}
