// handlers/public/auth/signup.rs - GET /signup, POST /signup

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;

use crate::auth::redirect::safe_next;
use crate::services::{SignUpOutcome, SupabaseError};
use crate::state::AppState;
use crate::views::{self, PageError};

use super::{start_session, sync_user, AuthPageQuery};

/// Supabase's default minimum
const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub full_name: Option<String>,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

pub async fn signup_form(Query(query): Query<AuthPageQuery>) -> Result<Response, PageError> {
    let next = safe_next(query.next.as_deref());
    render_signup(&next, "", "", query.error.as_deref())
}

pub async fn signup_submit(State(state): State<AppState>, Form(form): Form<SignupForm>) -> Result<Response, PageError> {
    let next = safe_next(form.next.as_deref());
    let email = form.email.trim();
    let full_name = form.full_name.as_deref().map(str::trim).filter(|n| !n.is_empty());

    if !email.contains('@') {
        return render_signup(&next, email, full_name.unwrap_or(""), Some("Ange en giltig e-postadress."));
    }
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        return render_signup(
            &next,
            email,
            full_name.unwrap_or(""),
            Some("Lösenordet måste vara minst 6 tecken."),
        );
    }

    let redirect_to = format!("{}/login", state.config.server.base_url.trim_end_matches('/'));
    match state.supabase.sign_up(email, &form.password, full_name, &redirect_to).await {
        Ok(SignUpOutcome::Session(session)) => {
            sync_user(&state, &session.user, email).await;
            tracing::info!("User {} signed up", session.user.id);
            Ok(start_session(&state, &session, &next))
        }
        Ok(SignUpOutcome::ConfirmationRequired(user)) => {
            sync_user(&state, &user, email).await;
            tracing::info!("User {} signed up, awaiting e-mail confirmation", user.id);
            Ok(Redirect::to("/login?notice=confirm").into_response())
        }
        Err(SupabaseError::Rejected { message, .. }) => {
            render_signup(&next, email, full_name.unwrap_or(""), Some(&message))
        }
        Err(e) => {
            tracing::error!("Sign-up failed: {}", e);
            render_signup(
                &next,
                email,
                full_name.unwrap_or(""),
                Some("Registreringen misslyckades. Försök igen om en stund."),
            )
        }
    }
}

fn render_signup(next: &str, email: &str, full_name: &str, error: Option<&str>) -> Result<Response, PageError> {
    let mut ctx = views::context("Skapa konto", false);
    ctx.insert("next", next);
    ctx.insert("email", email);
    ctx.insert("full_name", full_name);
    ctx.insert("error", &error);
    Ok(views::render("signup.html", &ctx)?.into_response())
}
