use actix_web::http::StatusCode;
use actix_web::http::header::{ACCEPT, AUTHORIZATION, HeaderMap};
use actix_web_httpauth::headers::authorization::{Basic, Scheme};
use std::fmt;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// The single username/password pair the service accepts.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    fn matches(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Reasons a request is refused before reaching a handler, in the order
/// they are checked.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdmissionError {
    #[error("Missing or invalid Authorization header")]
    MissingHeader,
    #[error("Invalid Authorization format")]
    InvalidFormat,
    #[error("Invalid username or password")]
    BadCredentials,
    #[error("Accept header must include application/json")]
    NotAcceptable,
}

impl AdmissionError {
    pub fn status(&self) -> StatusCode {
        match self {
            AdmissionError::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

/// Checks the Basic credentials and the Accept header of a request.
pub fn admit(headers: &HeaderMap, expected: &Credentials) -> Result<(), AdmissionError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(AdmissionError::MissingHeader)?;
    let has_basic_scheme = header
        .to_str()
        .map(|value| value.starts_with("Basic "))
        .unwrap_or(false);
    if !has_basic_scheme {
        return Err(AdmissionError::MissingHeader);
    }

    let basic = Basic::parse(header).map_err(|e| {
        log::debug!("Failed to parse Basic credentials: {}", e);
        AdmissionError::InvalidFormat
    })?;
    let password = basic.password().ok_or(AdmissionError::InvalidFormat)?;

    if !expected.matches(basic.user_id(), password) {
        return Err(AdmissionError::BadCredentials);
    }

    let accepts_json = headers
        .get_all(ACCEPT)
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.contains(JSON_CONTENT_TYPE));
    if !accepts_json {
        return Err(AdmissionError::NotAcceptable);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::HeaderValue;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    fn creds() -> Credentials {
        Credentials::new("chef", "s3cret")
    }

    fn headers(authorization: Option<&str>, accept: Option<&str>) -> HeaderMap {
        let mut map = HeaderMap::new();
        if let Some(value) = authorization {
            map.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        }
        if let Some(value) = accept {
            map.insert(ACCEPT, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    fn basic(payload: &str) -> String {
        format!("Basic {}", STANDARD.encode(payload))
    }

    #[test]
    fn valid_request_is_admitted() {
        let auth = basic("chef:s3cret");
        assert_eq!(admit(&headers(Some(&auth), Some("application/json")), &creds()), Ok(()));
    }

    #[test]
    fn accept_header_is_substring_matched() {
        let auth = basic("chef:s3cret");
        let accept = "text/html, application/json;q=0.9";
        assert_eq!(admit(&headers(Some(&auth), Some(accept)), &creds()), Ok(()));
    }

    #[test]
    fn any_accept_header_may_carry_json() {
        let auth = basic("chef:s3cret");
        let mut map = headers(Some(&auth), Some("text/html"));
        map.append(ACCEPT, HeaderValue::from_static("application/json"));
        assert_eq!(admit(&map, &creds()), Ok(()));
    }

    #[test]
    fn missing_or_foreign_scheme_is_rejected_first() {
        assert_eq!(
            admit(&headers(None, None), &creds()),
            Err(AdmissionError::MissingHeader)
        );
        assert_eq!(
            admit(&headers(Some("Bearer abc.def.ghi"), Some("application/json")), &creds()),
            Err(AdmissionError::MissingHeader)
        );
    }

    #[test]
    fn undecodable_payload_is_a_format_error() {
        for auth in [
            "Basic !!!not-base64!!!".to_string(),
            basic("no-colon-here"),
            format!("Basic {}", STANDARD.encode([0xff, 0xfe, b':', b'x'])),
        ] {
            assert_eq!(
                admit(&headers(Some(&auth), Some("application/json")), &creds()),
                Err(AdmissionError::InvalidFormat),
                "header {auth:?}"
            );
        }
    }

    #[test]
    fn format_error_wins_over_accept_error() {
        let auth = basic("no-colon-here");
        let err = admit(&headers(Some(&auth), Some("text/html")), &creds()).unwrap_err();
        assert_eq!(err, AdmissionError::InvalidFormat);
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn wrong_credentials_win_over_accept_error() {
        let auth = basic("chef:wrong");
        assert_eq!(
            admit(&headers(Some(&auth), None), &creds()),
            Err(AdmissionError::BadCredentials)
        );
    }

    #[test]
    fn password_may_contain_colons() {
        let expected = Credentials::new("chef", "a:b:c");
        let auth = basic("chef:a:b:c");
        assert_eq!(admit(&headers(Some(&auth), Some("application/json")), &expected), Ok(()));
    }

    #[test]
    fn missing_accept_is_not_acceptable() {
        let auth = basic("chef:s3cret");
        let err = admit(&headers(Some(&auth), Some("text/plain")), &creds()).unwrap_err();
        assert_eq!(err, AdmissionError::NotAcceptable);
        assert_eq!(err.status(), StatusCode::NOT_ACCEPTABLE);
    }

    #[test]
    fn debug_output_hides_password() {
        let rendered = format!("{:?}", creds());
        assert!(rendered.contains("chef"));
        assert!(!rendered.contains("s3cret"));
    }
}
