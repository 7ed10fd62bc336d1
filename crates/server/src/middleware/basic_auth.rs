//! HTTP Basic authentication for the admin pages.
//!
//! The challenge is answered against `ADMIN_USER` / `ADMIN_PASS`. When either
//! is unset no credentials are accepted.

use axum::{
    extract::{Request, State},
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{AUTHORIZATION, WWW_AUTHENTICATE},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::config::AdminCredentials;
use crate::services::secrets_match;
use crate::state::AppState;

/// Realm announced in the `WWW-Authenticate` challenge.
pub const REALM_CHALLENGE: &str = r#"Basic realm="Secure Area""#;

/// Require admin basic auth credentials.
///
/// Use with `axum::middleware::from_fn_with_state`.
pub async fn require_admin(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let authorized = state
        .config()
        .admin
        .as_ref()
        .is_some_and(|admin| credentials_match(admin, request.headers()));

    if authorized {
        next.run(request).await
    } else {
        tracing::debug!(path = %request.uri().path(), "Admin challenge issued");
        challenge()
    }
}

fn challenge() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(WWW_AUTHENTICATE, HeaderValue::from_static(REALM_CHALLENGE))],
        "Auth Required",
    )
        .into_response()
}

fn credentials_match(admin: &AdminCredentials, headers: &HeaderMap) -> bool {
    let Some((user, password)) = parse_basic(headers) else {
        return false;
    };
    // Compare both halves so a wrong user costs the same as a wrong password
    let user_ok = user == admin.user;
    let password_ok = secrets_match(&admin.password, &password);
    user_ok && password_ok
}

/// Decode `Authorization: Basic <base64(user:password)>`.
///
/// The password is everything after the first colon.
fn parse_basic(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_owned(), password.to_owned()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn basic(user_pass: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let value = format!("Basic {}", STANDARD.encode(user_pass));
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&value).unwrap());
        headers
    }

    fn admin() -> AdminCredentials {
        AdminCredentials {
            user: "admin".to_string(),
            password: SecretString::from("pa:ss"),
        }
    }

    #[test]
    fn test_parse_basic_keeps_colons_in_password() {
        let (user, password) = parse_basic(&basic("admin:pa:ss")).unwrap();
        assert_eq!(user, "admin");
        assert_eq!(password, "pa:ss");
    }

    #[test]
    fn test_parse_basic_rejects_other_schemes() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert!(parse_basic(&headers).is_none());
        assert!(parse_basic(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_parse_basic_rejects_garbage() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic !!!"));
        assert!(parse_basic(&headers).is_none());
    }

    #[test]
    fn test_credentials_match() {
        assert!(credentials_match(&admin(), &basic("admin:pa:ss")));
        assert!(!credentials_match(&admin(), &basic("admin:pa")));
        assert!(!credentials_match(&admin(), &basic("root:pa:ss")));
    }

    #[test]
    fn test_challenge_response() {
        let response = challenge();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(WWW_AUTHENTICATE).unwrap(),
            REALM_CHALLENGE
        );
    }
}
