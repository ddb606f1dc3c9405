// handlers/protected/api/members.rs - /api/organizations/:slug/members[/:user_id]

use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::Role;
use crate::database::models::Member;
use crate::error::{ApiError, ValidationError};
use crate::middleware::{authorize, ApiJson, ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub email: String,
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMemberRequest {
    pub role: String,
}

pub(crate) fn parse_role(role: &str) -> Result<Role, ValidationError> {
    role.parse()
        .map_err(|_| ValidationError::new("role", "Role must be ADMIN, EDITOR or MEMBER"))
}

pub async fn list(State(state): State<AppState>, user: AuthUser, ApiPath(slug): ApiPath<String>) -> ApiResult<Vec<Member>> {
    let access = authorize(&state, &user, &slug, Role::Member).await?;
    let members = state.organizations().members(access.organization.id).await?;
    Ok(ApiResponse::success(members))
}

/// Add an existing user by e-mail, or change their role if already a member
pub async fn add(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(slug): ApiPath<String>,
    ApiJson(body): ApiJson<AddMemberRequest>,
) -> ApiResult<Vec<Member>> {
    let access = authorize(&state, &user, &slug, Role::Admin).await?;
    let role = parse_role(&body.role)?;

    let invitee = state
        .users()
        .find_by_email(body.email.trim())
        .await?
        .ok_or_else(|| ApiError::not_found("No user with that e-mail address has signed up"))?;

    let orgs = state.organizations();
    orgs.add_member(access.organization.id, invitee.id, role).await?;
    tracing::info!("{} added {} to {} as {}", user.id, invitee.id, access.organization.slug, role);
    Ok(ApiResponse::created(orgs.members(access.organization.id).await?))
}

pub async fn update_role(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath((slug, member_id)): ApiPath<(String, Uuid)>,
    ApiJson(body): ApiJson<UpdateMemberRequest>,
) -> ApiResult<Vec<Member>> {
    let access = authorize(&state, &user, &slug, Role::Admin).await?;
    let role = parse_role(&body.role)?;

    let orgs = state.organizations();
    orgs.set_member_role(access.organization.id, member_id, role).await?;
    Ok(ApiResponse::success(orgs.members(access.organization.id).await?))
}

pub async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath((slug, member_id)): ApiPath<(String, Uuid)>,
) -> ApiResult<()> {
    let access = authorize(&state, &user, &slug, Role::Admin).await?;
    state.organizations().remove_member(access.organization.id, member_id).await?;
    tracing::info!("{} removed {} from {}", user.id, member_id, access.organization.slug);
    Ok(ApiResponse::no_content())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_names_are_case_insensitive() {
        assert_eq!(parse_role("editor").unwrap(), Role::Editor);
        let err = parse_role("owner").unwrap_err();
        assert_eq!(err.field, "role");
    }
}
