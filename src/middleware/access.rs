use crate::auth::Role;
use crate::database::models::Organization;
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::state::AppState;
use crate::views::PageError;

use super::auth::AuthUser;

/// An organization the current user may act on, with their role in it
#[derive(Debug, Clone)]
pub struct OrgAccess {
    pub organization: Organization,
    pub role: Role,
}

#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("Organization not found")]
    NotFound,

    #[error("You are not a member of this organization")]
    NotMember,

    #[error("This action requires the {0} role")]
    InsufficientRole(Role),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Resolve `slug` and check that `user` holds at least `required` in it.
pub async fn authorize(
    state: &AppState,
    user: &AuthUser,
    slug: &str,
    required: Role,
) -> Result<OrgAccess, AccessError> {
    let organization = state
        .organizations()
        .find_by_slug(slug)
        .await?
        .ok_or(AccessError::NotFound)?;

    let role = state
        .users()
        .role_in(user.id, organization.id)
        .await?
        .ok_or(AccessError::NotMember)?;

    if !role.satisfies(required) {
        tracing::info!(
            "User {} ({}) denied {} access to {}",
            user.id,
            role,
            required,
            organization.slug
        );
        return Err(AccessError::InsufficientRole(required));
    }

    Ok(OrgAccess { organization, role })
}

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::NotFound => ApiError::not_found(err.to_string()),
            AccessError::NotMember | AccessError::InsufficientRole(_) => ApiError::forbidden(err.to_string()),
            AccessError::Database(e) => e.into(),
        }
    }
}

impl From<AccessError> for PageError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::NotFound => PageError::not_found(),
            AccessError::NotMember | AccessError::InsufficientRole(_) => PageError::Forbidden,
            AccessError::Database(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[test]
    fn api_maps_missing_org_to_404_and_membership_to_403() {
        let err: ApiError = AccessError::NotFound.into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err: ApiError = AccessError::NotMember.into();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.to_json()["code"], "FORBIDDEN");

        let err: ApiError = AccessError::InsufficientRole(Role::Admin).into();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn database_failures_keep_their_own_status() {
        let err: ApiError = AccessError::Database(DatabaseError::Conflict("taken".into())).into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn pages_send_unprivileged_users_to_the_dashboard() {
        for err in [AccessError::NotMember, AccessError::InsufficientRole(Role::Editor)] {
            let page: PageError = err.into();
            assert!(matches!(page, PageError::Forbidden));
            let response = page.into_response();
            assert_eq!(response.status(), StatusCode::SEE_OTHER);
            assert!(response.headers()["location"]
                .to_str()
                .unwrap()
                .starts_with("/dashboard"));
        }
    }

    #[test]
    fn pages_render_404_for_unknown_org() {
        let page: PageError = AccessError::NotFound.into();
        assert!(matches!(page, PageError::NotFound { diagnostics: None }));
        assert_eq!(page.into_response().status(), StatusCode::NOT_FOUND);
    }
}
