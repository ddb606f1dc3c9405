// handlers/protected/admin.rs - GET /admin/:slug and its form posts
//
// Every route needs ADMIN. Form posts redirect back to /admin/:slug with
// `?notice=` or `?error=` for the page to show.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;
use serde_json::json;
use url::form_urlencoded;
use uuid::Uuid;

use crate::auth::Role;
use crate::database::models::{HandbookUpdate, OrganizationUpdate};
use crate::error::ApiError;
use crate::middleware::{authorize, AuthUser};
use crate::state::AppState;
use crate::views::{self, PageError};

use super::api::billing::{checkout_url, portal_url};
use super::api::members::parse_role;

#[derive(Debug, Default, Deserialize)]
pub struct AdminQuery {
    pub error: Option<String>,
    pub notice: Option<String>,
    pub checkout: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SettingsForm {
    pub name: String,
    #[serde(default)]
    pub org_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    /// Checkbox: present only when ticked
    #[serde(default)]
    pub is_public: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MemberForm {
    pub email: String,
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct RoleForm {
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct PlanForm {
    pub plan: String,
}

pub async fn admin(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(slug): Path<String>,
    Query(query): Query<AdminQuery>,
) -> Result<Response, PageError> {
    let access = authorize(&state, &user, &slug, Role::Admin).await?;
    let org_id = access.organization.id;

    let members = state.organizations().members(org_id).await?;
    let handbook = state.handbooks().for_organization(org_id).await?;
    let subscription = state.subscriptions().for_organization(org_id).await?;

    let members: Vec<_> = members
        .iter()
        .map(|m| {
            json!({
                "user_id": m.user_id,
                "email": m.email,
                "full_name": m.full_name,
                "role": m.role,
                "role_label": m.role.parse::<Role>().map(|r| r.label()).unwrap_or("Okänd"),
                "is_self": m.user_id == user.id,
            })
        })
        .collect();

    let notice = match query.checkout.as_deref() {
        Some("success") => Some("Tack! Prenumerationen aktiveras inom kort.".to_string()),
        Some("cancelled") => Some("Betalningen avbröts.".to_string()),
        _ => query.notice,
    };

    let mut ctx = views::context(&format!("Administrera {}", access.organization.name), true);
    ctx.insert("organization", &access.organization);
    ctx.insert("handbook", &handbook);
    ctx.insert("members", &members);
    ctx.insert("subscription", &subscription);
    ctx.insert(
        "subscription_active",
        &subscription.as_ref().is_some_and(|s| s.is_active(chrono::Utc::now())),
    );
    ctx.insert("roles", &[Role::Admin, Role::Editor, Role::Member]);
    ctx.insert("error", &query.error);
    ctx.insert("notice", &notice);
    Ok(views::render("admin.html", &ctx)?.into_response())
}

pub async fn update_settings(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(slug): Path<String>,
    Form(form): Form<SettingsForm>,
) -> Result<Response, PageError> {
    let access = authorize(&state, &user, &slug, Role::Admin).await?;
    let org_id = access.organization.id;

    let outcome = async {
        state
            .organizations()
            .update(
                org_id,
                OrganizationUpdate {
                    name: Some(form.name),
                    org_number: form.org_number,
                    address: form.address,
                },
            )
            .await?;
        let handbook = state.handbooks().for_organization(org_id).await?;
        state
            .handbooks()
            .update(
                handbook.id,
                HandbookUpdate {
                    is_public: Some(form.is_public.is_some()),
                    ..Default::default()
                },
            )
            .await?;
        Ok::<(), ApiError>(())
    }
    .await;

    Ok(back(&slug, outcome.map(|_| "Inställningarna är sparade.")))
}

pub async fn add_member(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(slug): Path<String>,
    Form(form): Form<MemberForm>,
) -> Result<Response, PageError> {
    let access = authorize(&state, &user, &slug, Role::Admin).await?;

    let outcome = async {
        let role = parse_role(&form.role)?;
        let invitee = state
            .users()
            .find_by_email(form.email.trim())
            .await?
            .ok_or_else(|| ApiError::not_found("Ingen användare med den e-postadressen har registrerat sig."))?;
        state
            .organizations()
            .add_member(access.organization.id, invitee.id, role)
            .await?;
        Ok::<(), ApiError>(())
    }
    .await;

    Ok(back(&slug, outcome.map(|_| "Medlemmen är tillagd.")))
}

pub async fn change_role(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((slug, member_id)): Path<(String, Uuid)>,
    Form(form): Form<RoleForm>,
) -> Result<Response, PageError> {
    let access = authorize(&state, &user, &slug, Role::Admin).await?;

    let outcome = async {
        let role = parse_role(&form.role)?;
        state
            .organizations()
            .set_member_role(access.organization.id, member_id, role)
            .await?;
        Ok::<(), ApiError>(())
    }
    .await;

    Ok(back(&slug, outcome.map(|_| "Rollen är uppdaterad.")))
}

pub async fn remove_member(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((slug, member_id)): Path<(String, Uuid)>,
) -> Result<Response, PageError> {
    let access = authorize(&state, &user, &slug, Role::Admin).await?;
    let outcome = state
        .organizations()
        .remove_member(access.organization.id, member_id)
        .await
        .map_err(ApiError::from);

    if outcome.is_ok() && member_id == user.id {
        return Ok(Redirect::to("/dashboard").into_response());
    }
    Ok(back(&slug, outcome.map(|_| "Medlemmen är borttagen.")))
}

pub async fn checkout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(slug): Path<String>,
    Form(form): Form<PlanForm>,
) -> Result<Response, PageError> {
    let access = authorize(&state, &user, &slug, Role::Admin).await?;
    match checkout_url(&state, &user, &access, &form.plan).await {
        Ok(url) => Ok(Redirect::to(&url).into_response()),
        Err(e) => Ok(back(&slug, Err(e))),
    }
}

pub async fn portal(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(slug): Path<String>,
) -> Result<Response, PageError> {
    let access = authorize(&state, &user, &slug, Role::Admin).await?;
    match portal_url(&state, &access).await {
        Ok(url) => Ok(Redirect::to(&url).into_response()),
        Err(e) => Ok(back(&slug, Err(e))),
    }
}

/// Redirect to the admin page with the outcome as a query message.
fn back(slug: &str, outcome: Result<&str, ApiError>) -> Response {
    let (key, message) = match &outcome {
        Ok(notice) => ("notice", notice.to_string()),
        Err(e) => {
            tracing::info!("Admin action on {} failed: {}", slug, e);
            ("error", form_message(e))
        }
    };
    let encoded: String = form_urlencoded::byte_serialize(message.as_bytes()).collect();
    Redirect::to(&format!("/admin/{}?{}={}", slug, key, encoded)).into_response()
}

fn form_message(err: &ApiError) -> String {
    match err {
        ApiError::ValidationError {
            field_errors: Some(fields),
            ..
        } => fields
            .values()
            .cloned()
            .collect::<Vec<_>>()
            .join(" "),
        other => other.message().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use axum::http::StatusCode;

    #[test]
    fn back_carries_the_outcome() {
        let ok = back("brf-eken", Ok("Sparat"));
        assert_eq!(ok.status(), StatusCode::SEE_OTHER);
        assert_eq!(ok.headers()["location"], "/admin/brf-eken?notice=Sparat");

        let err = back("brf-eken", Err(ValidationError::new("role", "Okänd roll").into()));
        assert_eq!(err.headers()["location"], "/admin/brf-eken?error=Ok%C3%A4nd+roll");
    }
}
