// handlers/public/auth/login.rs - GET /login, POST /login

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Form,
};
use serde::Deserialize;

use crate::auth::redirect::safe_next;
use crate::middleware::MaybeUser;
use crate::services::SupabaseError;
use crate::state::AppState;
use crate::views::{self, PageError};

use super::{start_session, sync_user, AuthPageQuery};

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

pub async fn login_form(
    MaybeUser(user): MaybeUser,
    Query(query): Query<AuthPageQuery>,
) -> Result<Response, PageError> {
    let next = safe_next(query.next.as_deref());
    if user.is_some() {
        return Ok(axum::response::Redirect::to(&next).into_response());
    }
    render_login(&next, "", query.error.as_deref(), query.notice.as_deref())
}

pub async fn login_submit(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Result<Response, PageError> {
    let next = safe_next(form.next.as_deref());
    let email = form.email.trim();

    if email.is_empty() || form.password.is_empty() {
        return render_login(&next, email, Some("Fyll i e-post och lösenord."), None);
    }

    match state.supabase.sign_in_with_password(email, &form.password).await {
        Ok(session) => {
            sync_user(&state, &session.user, email).await;
            tracing::info!("User {} signed in", session.user.id);
            Ok(start_session(&state, &session, &next))
        }
        Err(SupabaseError::InvalidCredentials) => {
            render_login(&next, email, Some("Fel e-postadress eller lösenord."), None)
        }
        Err(e) => {
            tracing::error!("Sign-in failed: {}", e);
            render_login(&next, email, Some("Inloggningen misslyckades. Försök igen om en stund."), None)
        }
    }
}

fn render_login(next: &str, email: &str, error: Option<&str>, notice: Option<&str>) -> Result<Response, PageError> {
    let mut ctx = views::context("Logga in", false);
    ctx.insert("next", next);
    ctx.insert("email", email);
    ctx.insert("error", &error);
    ctx.insert("notice", &notice);
    Ok(views::render("login.html", &ctx)?.into_response())
}
