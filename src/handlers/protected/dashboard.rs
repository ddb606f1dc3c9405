// handlers/protected/dashboard.rs - GET /dashboard, GET /dashboard/:slug,
// POST /dashboard

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;
use serde_json::json;

use crate::auth::Role;
use crate::database::models::NewOrganization;
use crate::middleware::{authorize, AuthUser};
use crate::state::AppState;
use crate::views::{self, PageError};

use super::ensure_user;

#[derive(Debug, Default, Deserialize)]
pub struct FlashQuery {
    pub error: Option<String>,
    pub notice: Option<String>,
}

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(flash): Query<FlashQuery>,
) -> Result<Response, PageError> {
    let profile = ensure_user(&state, &user).await?;
    let memberships = state.users().organizations(user.id).await?;

    let organizations: Vec<_> = memberships
        .iter()
        .map(|m| {
            let role = m.role.parse::<Role>().ok();
            json!({
                "name": m.name,
                "slug": m.slug,
                "role": m.role,
                "role_label": role.map(|r| r.label()).unwrap_or("Okänd"),
                "is_admin": role.is_some_and(|r| r.satisfies(Role::Admin)),
            })
        })
        .collect();

    let mut ctx = views::context("Översikt", true);
    ctx.insert("user", &profile);
    ctx.insert("display_name", profile.display_name());
    ctx.insert("organizations", &organizations);
    ctx.insert("error", &flash.error.as_deref().map(describe_error));
    ctx.insert("notice", &flash.notice);
    Ok(views::render("dashboard.html", &ctx)?.into_response())
}

pub async fn organization(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(slug): Path<String>,
) -> Result<Response, PageError> {
    let access = authorize(&state, &user, &slug, Role::Member).await?;
    let org_id = access.organization.id;

    let tree = state.handbooks().tree(org_id).await?;
    let documents = state.documents().list(org_id).await?;
    let subscription = state.subscriptions().for_organization(org_id).await?;
    let active = subscription
        .as_ref()
        .is_some_and(|s| s.is_active(chrono::Utc::now()));

    let mut ctx = views::context(&access.organization.name, true);
    ctx.insert("organization", &access.organization);
    ctx.insert("role", &access.role);
    ctx.insert("role_label", access.role.label());
    ctx.insert("can_edit", &access.role.satisfies(Role::Editor));
    ctx.insert("is_admin", &access.role.satisfies(Role::Admin));
    ctx.insert("handbook", &tree);
    ctx.insert("page_count", &tree.page_count());
    ctx.insert("documents", &documents);
    ctx.insert("subscription", &subscription);
    ctx.insert("subscription_active", &active);
    Ok(views::render("organization.html", &ctx)?.into_response())
}

pub async fn create_organization(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Form(form): Form<NewOrganization>,
) -> Result<Response, PageError> {
    ensure_user(&state, &user).await?;
    let org = state
        .organizations()
        .create_with_defaults(form, user.id, state.config.billing.trial_days)
        .await?;
    Ok(Redirect::to(&format!("/dashboard/{}", org.slug)).into_response())
}

/// Messages for the error codes other pages redirect here with
fn describe_error(code: &str) -> String {
    match code {
        "forbidden" => "Du saknar behörighet för den sidan.".to_string(),
        other => other.to_string(),
    }
}
