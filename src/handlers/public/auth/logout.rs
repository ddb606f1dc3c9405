// handlers/public/auth/logout.rs - POST /logout

use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};

use crate::auth::extract_access_token;
use crate::middleware::auth::append_cleared_cookies;
use crate::state::AppState;

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = extract_access_token(&headers) {
        if let Err(e) = state.supabase.sign_out(&token).await {
            tracing::warn!("Supabase sign-out failed: {}", e);
        }
    }

    let mut response = Redirect::to("/").into_response();
    append_cleared_cookies(&mut response, state.config.security.secure_cookies);
    response
}
