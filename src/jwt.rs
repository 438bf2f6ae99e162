//! Signed session token encoding and verification.
//!
//! Tokens are compact JWS strings (`header.payload.signature`, base64url without padding)
//! signed with HMAC-SHA256. The key is not fixed: it is resolved per token from the subject
//! claim, so verification first peeks at the unverified payload to find the subject, then
//! checks the signature with that subject's key. Nothing read from the payload is trusted
//! until the signature has been checked.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::Value;

use crate::registry::SigningKey;

/// Claim name -> value, in insertion order.
pub type ClaimSet = serde_json::Map<String, Value>;

/// Issued-at claim (seconds since epoch).
pub const CLAIM_ISSUED_AT: &str = "iat";

/// Expiry claim (seconds since epoch).
pub const CLAIM_EXPIRES_AT: &str = "exp";

/// The only algorithm accepted in a token header.
pub const ACCEPTED_ALGORITHM: &str = "HS256";

/// Current time in seconds since the Unix epoch.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Read a subject identifier out of a claim. Strings are used as-is, numbers are rendered
/// in decimal so `"sub": 42` and `"sub": "42"` name the same subject.
pub fn subject_of(claims: &ClaimSet, field: &str) -> Option<String> {
    match claims.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Return the signature segment of a token string.
pub fn signature_of(token: &str) -> Option<&str> {
    let mut parts = token.split('.');
    let (_, _, signature) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    Some(signature)
}

/// A token whose signature and expiry have been checked.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedToken {
    pub claims: ClaimSet,
    /// The base64url signature segment, usable as a per-token revocation handle.
    pub signature: String,
}

/// Signs claim sets and verifies token strings against per-subject keys.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    subject_field: String,
}

impl TokenCodec {
    /// `subject_field` names the claim that identifies the signing-key subject.
    pub fn new(subject_field: impl Into<String>) -> Self {
        Self {
            subject_field: subject_field.into(),
        }
    }

    pub fn subject_field(&self) -> &str {
        &self.subject_field
    }

    /// Serialize and sign `claims` with `key`.
    pub fn sign(&self, claims: &ClaimSet, key: &SigningKey) -> Result<String, CodecError> {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(key.as_bytes()),
        )
        .map_err(|e| CodecError::Encoding(e.to_string()))
    }

    /// Verify `token`, asking `resolver` for the key of the subject the token claims.
    ///
    /// The resolver receives the subject identifier and the (still unverified) claims; it
    /// must only use them to pick a key. Checks run in a fixed order: structure, declared
    /// algorithm, key resolution, signature, expiry.
    pub fn verify<F>(&self, token: &str, resolver: F) -> Result<VerifiedToken, CodecError>
    where
        F: FnOnce(&str, &ClaimSet) -> Option<SigningKey>,
    {
        let segments: Vec<&str> = token.split('.').collect();
        let &[header, payload, signature] = segments.as_slice() else {
            return Err(CodecError::MalformedToken);
        };

        let header: Value = decode_segment(header)?;
        let algorithm = header
            .get("alg")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if algorithm != ACCEPTED_ALGORITHM {
            return Err(CodecError::UnsupportedAlgorithm(algorithm.to_string()));
        }

        let unverified: ClaimSet = decode_segment(payload)?;
        URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| CodecError::MalformedToken)?;

        let subject =
            subject_of(&unverified, &self.subject_field).ok_or(CodecError::UnknownSubject)?;
        let key = resolver(&subject, &unverified).ok_or(CodecError::UnknownSubject)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let claims = jsonwebtoken::decode::<ClaimSet>(
            token,
            &DecodingKey::from_secret(key.as_bytes()),
            &validation,
        )
        .map_err(CodecError::from)?
        .claims;

        check_expiry(&claims, unix_now())?;

        Ok(VerifiedToken {
            claims,
            signature: signature.to_string(),
        })
    }
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str) -> Result<T, CodecError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| CodecError::MalformedToken)?;
    serde_json::from_slice(&bytes).map_err(|_| CodecError::MalformedToken)
}

/// Only called on claims whose signature has already been verified.
fn check_expiry(claims: &ClaimSet, now: u64) -> Result<(), CodecError> {
    let Some(exp) = claims.get(CLAIM_EXPIRES_AT) else {
        return Ok(());
    };
    let exp = exp.as_f64().ok_or(CodecError::MalformedToken)?;
    if exp < now as f64 {
        return Err(CodecError::ExpiredToken);
    }
    Ok(())
}

/// Errors that can occur while signing or verifying a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The claim set could not be serialized or signed.
    Encoding(String),
    /// Not three segments, or a segment is not valid base64url JSON.
    MalformedToken,
    /// The header declares an algorithm other than HS256.
    UnsupportedAlgorithm(String),
    /// No key is registered for the token's subject.
    UnknownSubject,
    /// The signature does not match the resolved key.
    InvalidSignature,
    /// The `exp` claim is in the past.
    ExpiredToken,
}

impl From<jsonwebtoken::errors::Error> for CodecError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => CodecError::InvalidSignature,
            ErrorKind::ExpiredSignature => CodecError::ExpiredToken,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                CodecError::UnsupportedAlgorithm(String::new())
            }
            _ => CodecError::MalformedToken,
        }
    }
}

impl std::fmt::Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecError::Encoding(e) => write!(f, "Failed to encode token: {}", e),
            CodecError::MalformedToken => write!(f, "Malformed token"),
            CodecError::UnsupportedAlgorithm(alg) => {
                write!(f, "Unsupported token algorithm: {:?}", alg)
            }
            CodecError::UnknownSubject => write!(f, "No signing key for token subject"),
            CodecError::InvalidSignature => write!(f, "Invalid token signature"),
            CodecError::ExpiredToken => write!(f, "Token has expired"),
        }
    }
}

impl std::error::Error for CodecError {}
