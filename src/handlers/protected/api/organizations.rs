// handlers/protected/api/organizations.rs - POST /api/organizations,
// GET|PATCH /api/organizations/:slug

use axum::extract::State;
use serde_json::{json, Value};

use crate::auth::Role;
use crate::database::models::{NewOrganization, Organization, OrganizationUpdate};
use crate::middleware::{authorize, ApiJson, ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

use super::super::ensure_user;

pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(body): ApiJson<NewOrganization>,
) -> ApiResult<Organization> {
    ensure_user(&state, &user).await?;
    let org = state
        .organizations()
        .create_with_defaults(body, user.id, state.config.billing.trial_days)
        .await?;
    Ok(ApiResponse::created(org))
}

pub async fn show(State(state): State<AppState>, user: AuthUser, ApiPath(slug): ApiPath<String>) -> ApiResult<Value> {
    let access = authorize(&state, &user, &slug, Role::Member).await?;
    let subscription = state.subscriptions().for_organization(access.organization.id).await?;
    Ok(ApiResponse::success(json!({
        "organization": access.organization,
        "role": access.role,
        "subscription": subscription,
    })))
}

pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(slug): ApiPath<String>,
    ApiJson(body): ApiJson<OrganizationUpdate>,
) -> ApiResult<Organization> {
    let access = authorize(&state, &user, &slug, Role::Admin).await?;
    let org = state.organizations().update(access.organization.id, body).await?;
    Ok(ApiResponse::success(org))
}
