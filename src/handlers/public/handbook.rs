// handlers/public/handbook.rs - GET /h/:slug and the subdomain handbook view

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};

use crate::auth::Role;
use crate::middleware::{request_host, AuthUser, MaybeUser};
use crate::state::AppState;
use crate::views::{self, NotFoundDiagnostics, PageError};

pub async fn handbook_by_path(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    headers: HeaderMap,
    Path(slug): Path<String>,
) -> Result<Response, PageError> {
    let host = request_host(&headers).unwrap_or_default();
    let path = format!("/h/{}", slug);
    render_handbook(&state, user.as_ref(), &slug.to_ascii_lowercase(), &host, &path).await
}

/// Render an organization's handbook. Public handbooks are open to anyone;
/// the rest need a MEMBER session.
pub(crate) async fn render_handbook(
    state: &AppState,
    user: Option<&AuthUser>,
    slug: &str,
    host: &str,
    path: &str,
) -> Result<Response, PageError> {
    let Some(organization) = state.organizations().find_by_slug(slug).await? else {
        let diagnostics = state.config.is_staging().then(|| NotFoundDiagnostics {
            host: host.to_string(),
            slug: Some(slug.to_string()),
            path: path.to_string(),
        });
        return Err(PageError::NotFound { diagnostics });
    };

    let tree = state.handbooks().tree(organization.id).await?;

    let mut can_edit = false;
    if let Some(user) = user {
        let role = state.users().role_in(user.id, organization.id).await?;
        can_edit = role.is_some_and(|r| r.satisfies(Role::Editor));
        if !tree.handbook.is_public && !role.is_some_and(|r| r.satisfies(Role::Member)) {
            return Err(PageError::Forbidden);
        }
    } else if !tree.handbook.is_public {
        return Err(PageError::Unauthenticated { next: path.to_string() });
    }

    let mut ctx = views::context(&tree.handbook.title, user.is_some());
    ctx.insert("organization", &organization);
    ctx.insert("handbook", &tree);
    ctx.insert("can_edit", &can_edit);
    Ok(views::render("handbook.html", &ctx)?.into_response())
}
