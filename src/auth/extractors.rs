//! Axum middleware and extractors for authorization.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::errors::{ApiAuthError, AuthErrorKind};
use super::state::HasAuthorizer;
use super::types::{AuthenticatedSession, RequestClaims, TokenSignature};

/// Middleware gating every route behind it.
///
/// Use with `axum::middleware::from_fn_with_state(state, require_auth::<MyState>)`.
/// Authorized requests continue with their claims in the extensions; anything else is
/// answered with the matching [`ApiAuthError`].
pub async fn require_auth<S>(State(state): State<S>, request: Request, next: Next) -> Response
where
    S: HasAuthorizer,
{
    let (mut parts, body) = request.into_parts();
    let authorizer = state.authorizer();

    match authorizer
        .authorize(&mut parts, state.authorize_hooks())
        .await
    {
        Ok(verified) => {
            parts.extensions.insert(TokenSignature(verified.signature));
            next.run(Request::from_parts(parts, body)).await
        }
        Err(kind) => ApiAuthError::new(kind)
            .with_challenge(&authorizer.config().scheme)
            .into_response(),
    }
}

/// Extractor for handlers behind [`require_auth`].
/// Rejects with `MissingToken` when the route is not gated.
pub struct ApiAuth(pub AuthenticatedSession);

impl<S> FromRequestParts<S> for ApiAuth
where
    S: Send + Sync,
{
    type Rejection = ApiAuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts.extensions.get::<RequestClaims>().cloned();
        let signature = parts.extensions.get::<TokenSignature>().cloned();

        match (claims, signature) {
            (Some(claims), Some(TokenSignature(signature))) => {
                Ok(ApiAuth(AuthenticatedSession { claims, signature }))
            }
            _ => Err(ApiAuthError::new(AuthErrorKind::MissingToken)),
        }
    }
}

/// Optional authentication extractor - never fails.
pub struct MaybeAuth(pub Option<AuthenticatedSession>);

impl<S> FromRequestParts<S> for MaybeAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuth(
            ApiAuth::from_request_parts(parts, state)
                .await
                .ok()
                .map(|ApiAuth(session)| session),
        ))
    }
}
