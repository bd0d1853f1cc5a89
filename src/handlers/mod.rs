pub mod auth_requests;
pub mod authentication;
pub mod authorization;
pub mod consents;
pub mod metadata;
pub mod password_reset;
pub mod revocation;
pub mod sessions;
pub mod token;
pub mod totp;
pub mod userinfo;

use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

/// 302 Found redirect. axum's Redirect helpers emit 303/307/308; the
/// authorization endpoint is specified as plain 302.
pub(crate) fn redirect_found(url: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, url.to_string())]).into_response()
}

/// 301 Moved Permanently redirect used by the consent flow.
pub(crate) fn redirect_moved_permanently(url: &str) -> Response {
    (
        StatusCode::MOVED_PERMANENTLY,
        [(header::LOCATION, url.to_string())],
    )
        .into_response()
}

/// Bearer token from the Authorization header, if present.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer ").or_else(|| value.strip_prefix("bearer ")))
}

/// Value of one cookie from the Cookie header, if present.
pub(crate) fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then_some(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwdw=="));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_cookie_value() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session_jwt=tok123; lang=en"),
        );
        assert_eq!(cookie_value(&headers, "session_jwt"), Some("tok123"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn test_redirect_status_codes() {
        assert_eq!(redirect_found("http://x").status(), StatusCode::FOUND);
        assert_eq!(
            redirect_moved_permanently("http://x").status(),
            StatusCode::MOVED_PERMANENTLY
        );
    }
}
