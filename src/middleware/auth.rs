use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, OriginalUri, Request, State},
    http::{header, request::Parts, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::auth::{cookies, extract_access_token, verify_access_token, AuthError, REFRESH_TOKEN_COOKIE};
use crate::error::ApiError;
use crate::services::AuthSession;
use crate::state::AppState;
use crate::views::PageError;

/// Signed-in Supabase user, verified from the access token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub access_token: String,
}

impl AuthUser {
    pub fn from_token(token: &str, jwt_secret: &str) -> Result<Self, AuthError> {
        let claims = verify_access_token(token, jwt_secret)?;
        Ok(Self {
            id: claims.user_id()?,
            email: claims.email,
            access_token: token.to_string(),
        })
    }

    fn from_request_headers(parts: &Parts, state: &AppState) -> Result<Self, AuthError> {
        let token = extract_access_token(&parts.headers).ok_or(AuthError::MissingToken)?;
        Self::from_token(&token, &state.config.supabase.jwt_secret)
    }
}

/// API extractor: rejects with 401 JSON when no valid token is present
#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }
        Ok(Self::from_request_headers(parts, state)?)
    }
}

/// Page extractor for routes that work both signed in and anonymous
pub struct MaybeUser(pub Option<AuthUser>);

#[axum::async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(MaybeUser(Some(user.clone())));
        }
        Ok(MaybeUser(AuthUser::from_request_headers(parts, state).ok()))
    }
}

/// Guard for dashboard and admin pages. Without a valid session the visitor
/// is sent to `/login?next=...`. An expired access token is renewed once
/// from the refresh cookie and the new cookies are set on the response.
pub async fn require_session(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let jwt_secret = state.config.supabase.jwt_secret.clone();
    let user = extract_access_token(request.headers())
        .and_then(|token| AuthUser::from_token(&token, &jwt_secret).ok());

    if let Some(user) = user {
        request.extensions_mut().insert(user);
        return next.run(request).await;
    }

    let next_path = request
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.0.clone())
        .unwrap_or_else(|| request.uri().clone());
    let next_path = next_path
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/dashboard".to_string());

    let Some(refresh_token) = cookies::get(request.headers(), REFRESH_TOKEN_COOKIE) else {
        return PageError::Unauthenticated { next: next_path }.into_response();
    };

    let session = match state.supabase.refresh_session(&refresh_token).await {
        Ok(session) => session,
        Err(e) => {
            tracing::debug!("Session refresh failed: {}", e);
            return PageError::Unauthenticated { next: next_path }.into_response();
        }
    };

    match AuthUser::from_token(&session.access_token, &jwt_secret) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            let mut response = next.run(request).await;
            append_session_cookies(&mut response, &session, state.config.security.secure_cookies);
            response
        }
        Err(e) => {
            tracing::warn!("Refreshed token failed verification: {}", e);
            PageError::Unauthenticated { next: next_path }.into_response()
        }
    }
}

pub fn append_session_cookies(response: &mut Response, session: &AuthSession, secure: bool) {
    let access = cookies::session(
        cookies::ACCESS_TOKEN_COOKIE,
        &session.access_token,
        session.expires_in,
        secure,
    );
    // Refresh tokens outlive access tokens; keep them for 30 days
    let refresh = cookies::session(REFRESH_TOKEN_COOKIE, &session.refresh_token, 60 * 60 * 24 * 30, secure);

    for cookie in [access, refresh] {
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
}

pub fn append_cleared_cookies(response: &mut Response, secure: bool) {
    for name in [cookies::ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE] {
        if let Ok(value) = HeaderValue::from_str(&cookies::expired(name, secure)) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
}
