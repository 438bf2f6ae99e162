//! Session token authentication and authorization.
//!
//! [`Authenticator`] turns a successful credential check into a signed token;
//! [`Authorizer`] verifies the token carried by each protected request and projects its
//! claims into the request. Both are framework-agnostic and talk to the host only through
//! the [`LoginHooks`] / [`AuthorizeHooks`] callbacks and the [`AuthRequest`] capability.
//! The axum glue lives in [`require_auth`] and the [`ApiAuth`] extractor.

mod authorize;
mod config;
mod errors;
mod extractors;
mod header;
mod hooks;
mod login;
mod request;
mod state;
mod types;

pub use authorize::Authorizer;
pub use config::{
    AuthConfig, DEFAULT_HEADER_NAME, DEFAULT_SCHEME, DEFAULT_SUBJECT_FIELD, DEFAULT_TIMEOUT,
};
pub use errors::{ApiAuthError, AuthErrorKind, BoxError, LoginError};
pub use extractors::{ApiAuth, MaybeAuth, require_auth};
pub use header::extract_token;
pub use hooks::{AuthorizeHooks, LoginHooks, NoHooks};
pub use login::Authenticator;
pub use request::AuthRequest;
pub use state::HasAuthorizer;
pub use types::{AuthenticatedSession, IssuedToken, LoginGrant, RequestClaims, TokenSignature};
