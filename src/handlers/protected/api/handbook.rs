// handlers/protected/api/handbook.rs - handbook, sections and pages
//
// GET   /api/organizations/:slug/handbook
// PATCH /api/organizations/:slug/handbook
// POST  /api/organizations/:slug/handbook/sections
// PUT   /api/organizations/:slug/handbook/sections/order
// PATCH|DELETE /api/organizations/:slug/handbook/sections/:id
// POST  /api/organizations/:slug/handbook/sections/:id/pages
// PUT   /api/organizations/:slug/handbook/sections/:id/pages/order
// PATCH|DELETE /api/organizations/:slug/handbook/pages/:id

use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::Role;
use crate::database::models::{
    Handbook, HandbookTree, HandbookUpdate, NewPage, NewSection, Page, PageUpdate, Section, SectionUpdate,
};
use crate::error::ApiError;
use crate::middleware::{authorize, ApiJson, ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub ids: Vec<Uuid>,
}

/// Handbook id for `slug` once `user` is known to hold `required`
async fn handbook_for(state: &AppState, user: &AuthUser, slug: &str, required: Role) -> Result<Handbook, ApiError> {
    let access = authorize(state, user, slug, required).await?;
    Ok(state.handbooks().for_organization(access.organization.id).await?)
}

pub async fn show(State(state): State<AppState>, user: AuthUser, ApiPath(slug): ApiPath<String>) -> ApiResult<HandbookTree> {
    let access = authorize(&state, &user, &slug, Role::Member).await?;
    let tree = state.handbooks().tree(access.organization.id).await?;
    Ok(ApiResponse::success(tree))
}

pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(slug): ApiPath<String>,
    ApiJson(body): ApiJson<HandbookUpdate>,
) -> ApiResult<Handbook> {
    let handbook = handbook_for(&state, &user, &slug, Role::Editor).await?;
    Ok(ApiResponse::success(state.handbooks().update(handbook.id, body).await?))
}

pub async fn create_section(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(slug): ApiPath<String>,
    ApiJson(body): ApiJson<NewSection>,
) -> ApiResult<Section> {
    let handbook = handbook_for(&state, &user, &slug, Role::Editor).await?;
    Ok(ApiResponse::created(state.handbooks().create_section(handbook.id, body).await?))
}

pub async fn update_section(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath((slug, section_id)): ApiPath<(String, Uuid)>,
    ApiJson(body): ApiJson<SectionUpdate>,
) -> ApiResult<Section> {
    let handbook = handbook_for(&state, &user, &slug, Role::Editor).await?;
    let section = state.handbooks().update_section(handbook.id, section_id, body).await?;
    Ok(ApiResponse::success(section))
}

pub async fn delete_section(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath((slug, section_id)): ApiPath<(String, Uuid)>,
) -> ApiResult<()> {
    let handbook = handbook_for(&state, &user, &slug, Role::Editor).await?;
    state.handbooks().delete_section(handbook.id, section_id).await?;
    Ok(ApiResponse::no_content())
}

pub async fn reorder_sections(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(slug): ApiPath<String>,
    ApiJson(body): ApiJson<ReorderRequest>,
) -> ApiResult<HandbookTree> {
    let access = authorize(&state, &user, &slug, Role::Editor).await?;
    let handbooks = state.handbooks();
    let handbook = handbooks.for_organization(access.organization.id).await?;
    handbooks.reorder_sections(handbook.id, &body.ids).await?;
    Ok(ApiResponse::success(handbooks.tree(access.organization.id).await?))
}

pub async fn create_page(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath((slug, section_id)): ApiPath<(String, Uuid)>,
    ApiJson(body): ApiJson<NewPage>,
) -> ApiResult<Page> {
    let handbook = handbook_for(&state, &user, &slug, Role::Editor).await?;
    let page = state.handbooks().create_page(handbook.id, section_id, body).await?;
    Ok(ApiResponse::created(page))
}

pub async fn update_page(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath((slug, page_id)): ApiPath<(String, Uuid)>,
    ApiJson(body): ApiJson<PageUpdate>,
) -> ApiResult<Page> {
    let handbook = handbook_for(&state, &user, &slug, Role::Editor).await?;
    let page = state.handbooks().update_page(handbook.id, page_id, body).await?;
    Ok(ApiResponse::success(page))
}

pub async fn delete_page(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath((slug, page_id)): ApiPath<(String, Uuid)>,
) -> ApiResult<()> {
    let handbook = handbook_for(&state, &user, &slug, Role::Editor).await?;
    state.handbooks().delete_page(handbook.id, page_id).await?;
    Ok(ApiResponse::no_content())
}

pub async fn reorder_pages(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath((slug, section_id)): ApiPath<(String, Uuid)>,
    ApiJson(body): ApiJson<ReorderRequest>,
) -> ApiResult<HandbookTree> {
    let access = authorize(&state, &user, &slug, Role::Editor).await?;
    let handbooks = state.handbooks();
    let handbook = handbooks.for_organization(access.organization.id).await?;
    handbooks.reorder_pages(handbook.id, section_id, &body.ids).await?;
    Ok(ApiResponse::success(handbooks.tree(access.organization.id).await?))
}
