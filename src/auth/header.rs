//! Token extraction from the authorization header.

use super::errors::AuthErrorKind;

/// Token value some clients send when they have nothing stored.
const NULL_TOKEN: &str = "null";

/// Pull the raw token out of a header value.
///
/// With a non-empty `scheme` the value must be exactly `<scheme> <token>` (one space, scheme
/// compared case-sensitively). With an empty `scheme` the whole value is the token.
pub fn extract_token<'a>(
    header_value: Option<&'a [u8]>,
    scheme: &str,
) -> Result<&'a str, AuthErrorKind> {
    let raw = match header_value {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Err(AuthErrorKind::MissingToken),
    };
    let value = std::str::from_utf8(raw).map_err(|_| AuthErrorKind::MalformedHeader)?;

    let token = if scheme.is_empty() {
        value
    } else {
        let parts: Vec<&str> = value.split(' ').collect();
        let &[prefix, token] = parts.as_slice() else {
            return Err(AuthErrorKind::MalformedHeader);
        };
        if prefix != scheme {
            return Err(AuthErrorKind::SchemeMismatch);
        }
        token
    };

    if token.is_empty() || token == NULL_TOKEN {
        return Err(AuthErrorKind::EmptyToken);
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract<'a>(value: Option<&'a str>, scheme: &str) -> Result<&'a str, AuthErrorKind> {
        extract_token(value.map(str::as_bytes), scheme)
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(extract(Some("Bearer abc.def.ghi"), "Bearer"), Ok("abc.def.ghi"));
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(extract(None, "Bearer"), Err(AuthErrorKind::MissingToken));
        assert_eq!(extract(Some(""), "Bearer"), Err(AuthErrorKind::MissingToken));
        assert_eq!(extract(Some(""), ""), Err(AuthErrorKind::MissingToken));
    }

    #[test]
    fn test_scheme_mismatch() {
        assert_eq!(
            extract(Some("Token abc.def.ghi"), "Bearer"),
            Err(AuthErrorKind::SchemeMismatch)
        );
    }

    #[test]
    fn test_scheme_is_case_sensitive() {
        assert_eq!(
            extract(Some("bearer abc.def.ghi"), "Bearer"),
            Err(AuthErrorKind::SchemeMismatch)
        );
    }

    #[test]
    fn test_wrong_part_count() {
        assert_eq!(
            extract(Some("abc.def.ghi"), "Bearer"),
            Err(AuthErrorKind::MalformedHeader)
        );
        assert_eq!(
            extract(Some("Bearer abc def"), "Bearer"),
            Err(AuthErrorKind::MalformedHeader)
        );
        assert_eq!(
            extract(Some("Bearer  abc"), "Bearer"),
            Err(AuthErrorKind::MalformedHeader)
        );
    }

    #[test]
    fn test_empty_and_null_tokens() {
        assert_eq!(extract(Some("Bearer "), "Bearer"), Err(AuthErrorKind::EmptyToken));
        assert_eq!(
            extract(Some("Bearer null"), "Bearer"),
            Err(AuthErrorKind::EmptyToken)
        );
        assert_eq!(extract(Some("null"), ""), Err(AuthErrorKind::EmptyToken));
    }

    #[test]
    fn test_no_scheme_uses_whole_value() {
        assert_eq!(extract(Some("abc.def.ghi"), ""), Ok("abc.def.ghi"));
        assert_eq!(extract(Some("Bearer abc"), ""), Ok("Bearer abc"));
    }

    #[test]
    fn test_custom_scheme() {
        assert_eq!(extract(Some("JWT tok"), "JWT"), Ok("tok"));
    }

    #[test]
    fn test_non_utf8_header() {
        assert_eq!(
            extract_token(Some(&[0x42, 0xff, 0x20, 0x61]), "Bearer"),
            Err(AuthErrorKind::MalformedHeader)
        );
    }
}
