//! Request capabilities needed by the authorization engine.

use axum::http::{Extensions, HeaderMap, request::Parts};
use serde_json::Value;

use super::types::RequestClaims;

/// A request the engine can read a header from and project claims into.
///
/// Implemented for axum's `Parts` and `Request`; hosts on other stacks implement it for
/// their own request type.
pub trait AuthRequest {
    /// Raw value of header `name`, if present.
    fn header_value(&self, name: &str) -> Option<&[u8]>;

    /// Store one verified claim in request-scoped storage.
    fn set_request_value(&mut self, name: &str, value: Value);
}

fn header_bytes<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a [u8]> {
    headers.get(name).map(|v| v.as_bytes())
}

fn project(extensions: &mut Extensions, name: &str, value: Value) {
    match extensions.get_mut::<RequestClaims>() {
        Some(claims) => claims.insert(name, value),
        None => {
            let mut claims = RequestClaims::default();
            claims.insert(name, value);
            extensions.insert(claims);
        }
    }
}

impl AuthRequest for Parts {
    fn header_value(&self, name: &str) -> Option<&[u8]> {
        header_bytes(&self.headers, name)
    }

    fn set_request_value(&mut self, name: &str, value: Value) {
        project(&mut self.extensions, name, value)
    }
}

impl<B> AuthRequest for axum::extract::Request<B> {
    fn header_value(&self, name: &str) -> Option<&[u8]> {
        header_bytes(self.headers(), name)
    }

    fn set_request_value(&mut self, name: &str, value: Value) {
        project(self.extensions_mut(), name, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde_json::json;

    #[test]
    fn test_parts_header_lookup_is_case_insensitive() {
        let (parts, _) = axum::http::Request::builder()
            .header("authorization", "Bearer x")
            .body(())
            .unwrap()
            .into_parts();

        assert_eq!(parts.header_value("Authorization"), Some(&b"Bearer x"[..]));
        assert_eq!(parts.header_value("X-Token"), None);
    }

    #[test]
    fn test_invalid_header_name_is_absent() {
        let (parts, _) = axum::http::Request::builder()
            .body(())
            .unwrap()
            .into_parts();

        assert_eq!(parts.header_value("not a header"), None);
    }

    #[test]
    fn test_projection_accumulates_claims() {
        let mut request = axum::extract::Request::new(Body::empty());
        request.set_request_value("sub", json!("alice"));
        request.set_request_value("role", json!("admin"));

        let claims = request.extensions().get::<RequestClaims>().unwrap();
        assert_eq!(claims.len(), 2);
        assert_eq!(claims.get_str("sub"), Some("alice"));
        assert_eq!(claims.get("role"), Some(&json!("admin")));
    }
}
