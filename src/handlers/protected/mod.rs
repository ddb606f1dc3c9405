// handlers/protected/mod.rs - routes that need a Supabase session
//
// Pages (/dashboard, /admin) sit behind `require_session` and redirect to
// /login. JSON routes (/api/*) use the `AuthUser` extractor and answer 401.
pub mod admin;
pub mod api;
pub mod dashboard;

use crate::database::models::User;
use crate::database::DatabaseError;
use crate::error::ValidationError;
use crate::middleware::AuthUser;
use crate::state::AppState;

/// Local user row for the session, created from the token claims on first use.
pub(crate) async fn ensure_user(state: &AppState, user: &AuthUser) -> Result<User, DatabaseError> {
    if let Some(row) = state.users().find_by_id(user.id).await? {
        return Ok(row);
    }
    let email = user
        .email
        .as_deref()
        .ok_or_else(|| ValidationError::new("email", "Access token carries no e-mail address"))?;
    state.users().upsert(user.id, email, None).await
}
