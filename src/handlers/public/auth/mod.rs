// handlers/public/auth/mod.rs - browser sign-in flow backed by Supabase Auth
//
// GET|POST /login, GET|POST /signup, POST /logout. Sessions live in the
// `sb-access-token` and `sb-refresh-token` cookies.

mod login;
mod logout;
mod signup;

pub use login::{login_form, login_submit};
pub use logout::logout;
pub use signup::{signup_form, signup_submit};

use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;

use crate::middleware::auth::append_session_cookies;
use crate::services::{AuthSession, SupabaseUser};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct AuthPageQuery {
    pub next: Option<String>,
    pub error: Option<String>,
    pub notice: Option<String>,
}

/// Keep the local `users` row in step with Supabase.
async fn sync_user(state: &AppState, user: &SupabaseUser, fallback_email: &str) {
    let email = user.email.as_deref().unwrap_or(fallback_email);
    if let Err(e) = state.users().upsert(user.id, email, user.full_name()).await {
        tracing::error!("Failed to upsert user {}: {}", user.id, e);
    }
}

/// Redirect to `next` with the session cookies set.
fn start_session(state: &AppState, session: &AuthSession, next: &str) -> Response {
    let mut response = Redirect::to(next).into_response();
    append_session_cookies(&mut response, session, state.config.security.secure_cookies);
    response
}
