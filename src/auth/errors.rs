//! Authentication error types.

use std::fmt;

use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::jwt::CodecError;

/// Application error returned from a credential check.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Why a request was not authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorKind {
    /// No credential was presented.
    MissingToken,
    /// The header value does not split into scheme and token.
    MalformedHeader,
    /// The header uses a scheme other than the configured one.
    SchemeMismatch,
    /// The token is empty or the literal `null`.
    EmptyToken,
    /// The token is not a well-formed three-segment structure.
    MalformedToken,
    /// The token declares an algorithm other than HS256.
    UnsupportedAlgorithm,
    /// No signing key is registered for the token's subject.
    UnknownSubject,
    /// The signature does not match the subject's key.
    InvalidSignature,
    /// The `exp` claim is in the past.
    ExpiredToken,
    /// The revocation hook reported the token's signature.
    RevokedToken,
    /// The claim set could not be serialized.
    Encoding,
}

impl AuthErrorKind {
    /// Stable machine-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingToken => "missing_token",
            Self::MalformedHeader => "malformed_header",
            Self::SchemeMismatch => "scheme_mismatch",
            Self::EmptyToken => "empty_token",
            Self::MalformedToken => "malformed_token",
            Self::UnsupportedAlgorithm => "unsupported_algorithm",
            Self::UnknownSubject => "unknown_subject",
            Self::InvalidSignature => "invalid_signature",
            Self::ExpiredToken => "expired_token",
            Self::RevokedToken => "revoked_token",
            Self::Encoding => "encoding",
        }
    }

    /// Failures that indicate a forged or tampered token rather than a stale or sloppy client.
    pub fn is_security_violation(&self) -> bool {
        matches!(self, Self::UnsupportedAlgorithm | Self::InvalidSignature)
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedHeader | Self::SchemeMismatch | Self::MalformedToken => {
                StatusCode::BAD_REQUEST
            }
            Self::Encoding => StatusCode::INTERNAL_SERVER_ERROR,
            Self::MissingToken
            | Self::EmptyToken
            | Self::UnsupportedAlgorithm
            | Self::UnknownSubject
            | Self::InvalidSignature
            | Self::ExpiredToken
            | Self::RevokedToken => StatusCode::UNAUTHORIZED,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            Self::MissingToken => "Not authenticated",
            Self::MalformedHeader => "Malformed authorization header",
            Self::SchemeMismatch => "Unexpected authorization scheme",
            Self::EmptyToken => "Empty token",
            Self::MalformedToken => "Malformed token",
            Self::UnsupportedAlgorithm => "Unsupported token algorithm",
            Self::UnknownSubject => "Unknown token subject",
            Self::InvalidSignature => "Invalid token signature",
            Self::ExpiredToken => "Token has expired",
            Self::RevokedToken => "Token has been revoked",
            Self::Encoding => "Failed to encode token",
        }
    }
}

impl fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for AuthErrorKind {}

impl From<CodecError> for AuthErrorKind {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Encoding(_) => Self::Encoding,
            CodecError::MalformedToken => Self::MalformedToken,
            CodecError::UnsupportedAlgorithm(_) => Self::UnsupportedAlgorithm,
            CodecError::UnknownSubject => Self::UnknownSubject,
            CodecError::InvalidSignature => Self::InvalidSignature,
            CodecError::ExpiredToken => Self::ExpiredToken,
        }
    }
}

/// Why a login did not produce a token.
#[derive(Debug)]
pub enum LoginError {
    /// The application's credential check failed.
    Credentials(BoxError),
    /// The granted claims lack the configured subject field.
    MissingSubject,
    /// No key was supplied and none is registered for the subject.
    UnknownSubject,
    /// The claim set could not be signed.
    Encoding(String),
}

impl LoginError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Credentials(_) => StatusCode::UNAUTHORIZED,
            Self::MissingSubject | Self::UnknownSubject | Self::Encoding(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl fmt::Display for LoginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Credentials(e) => write!(f, "Credential check failed: {}", e),
            Self::MissingSubject => write!(f, "Granted claims have no subject"),
            Self::UnknownSubject => write!(f, "No signing key for subject"),
            Self::Encoding(e) => write!(f, "Failed to encode token: {}", e),
        }
    }
}

impl std::error::Error for LoginError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Credentials(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<CodecError> for LoginError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Encoding(e) => Self::Encoding(e),
            other => Self::Encoding(other.to_string()),
        }
    }
}

/// Authorization failure rendered as a JSON response.
#[derive(Debug)]
pub struct ApiAuthError {
    kind: AuthErrorKind,
    challenge: Option<String>,
}

impl ApiAuthError {
    pub fn new(kind: AuthErrorKind) -> Self {
        Self {
            kind,
            challenge: None,
        }
    }

    /// Send `WWW-Authenticate: <scheme>` with 401 responses.
    pub fn with_challenge(mut self, scheme: &str) -> Self {
        if !scheme.is_empty() {
            self.challenge = Some(scheme.to_string());
        }
        self
    }

    pub fn kind(&self) -> AuthErrorKind {
        self.kind
    }
}

impl From<AuthErrorKind> for ApiAuthError {
    fn from(kind: AuthErrorKind) -> Self {
        Self::new(kind)
    }
}

impl IntoResponse for ApiAuthError {
    fn into_response(self) -> Response {
        use axum::Json;
        use serde::Serialize;

        #[derive(Serialize)]
        struct ErrorResponse {
            error: &'static str,
            kind: &'static str,
        }

        let status = self.kind.status_code();
        let mut response = (
            status,
            Json(ErrorResponse {
                error: self.kind.message(),
                kind: self.kind.as_str(),
            }),
        )
            .into_response();

        if status == StatusCode::UNAUTHORIZED {
            if let Some(value) = self
                .challenge
                .as_deref()
                .and_then(|s| HeaderValue::from_str(s).ok())
            {
                response.headers_mut().insert(header::WWW_AUTHENTICATE, value);
            }
        }

        response
    }
}
