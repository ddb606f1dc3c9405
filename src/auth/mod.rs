pub mod cookies;
pub mod redirect;
pub mod role;

use axum::http::HeaderMap;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use cookies::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
pub use role::{has_permission, Role};

/// Audience Supabase puts on access tokens for signed-in users
pub const SUPABASE_AUDIENCE: &str = "authenticated";

/// Claims carried by a Supabase Auth access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    pub aud: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing access token")]
    MissingToken,

    #[error("Invalid access token: {0}")]
    InvalidToken(String),

    #[error("Authentication is not configured")]
    NotConfigured,
}

/// Verify a Supabase access token with the project's JWT secret.
pub fn verify_access_token(token: &str, jwt_secret: &str) -> Result<SupabaseClaims, AuthError> {
    if jwt_secret.is_empty() {
        return Err(AuthError::NotConfigured);
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[SUPABASE_AUDIENCE]);

    let data = decode::<SupabaseClaims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

    Ok(data.claims)
}

impl SupabaseClaims {
    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AuthError::InvalidToken("subject is not a user id".to_string()))
    }
}

/// Bearer token first (API clients), then the session cookie (browsers).
pub fn extract_access_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = bearer_token(headers) {
        return Some(token);
    }
    cookies::get(headers, ACCESS_TOKEN_COOKIE)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const SECRET: &str = "super-secret-jwt-token-with-at-least-32-characters";

    #[test]
    fn accepts_valid_token() {
        let id = Uuid::new_v4();
        let token = test_tokens::sign(&id.to_string(), SECRET, 3600);
        let claims = verify_access_token(&token, SECRET).unwrap();
        assert_eq!(claims.user_id().unwrap(), id);
        assert_eq!(claims.email.as_deref(), Some("styrelsen@example.se"));
    }

    #[test]
    fn rejects_wrong_secret_and_expired_tokens() {
        let token = test_tokens::sign(&Uuid::new_v4().to_string(), SECRET, 3600);
        assert!(matches!(
            verify_access_token(&token, "another-secret-another-secret-another"),
            Err(AuthError::InvalidToken(_))
        ));

        let expired = test_tokens::sign(&Uuid::new_v4().to_string(), SECRET, -3600);
        assert!(matches!(verify_access_token(&expired, SECRET), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn missing_secret_is_a_configuration_error() {
        assert!(matches!(verify_access_token("x.y.z", ""), Err(AuthError::NotConfigured)));
    }

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer header-token"));
        headers.insert("cookie", HeaderValue::from_static("sb-access-token=cookie-token"));
        assert_eq!(extract_access_token(&headers).as_deref(), Some("header-token"));

        headers.remove("authorization");
        assert_eq!(extract_access_token(&headers).as_deref(), Some("cookie-token"));
    }

    #[test]
    fn empty_bearer_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer   "));
        assert_eq!(extract_access_token(&headers), None);
    }
}
