// handlers/protected/api/me.rs - GET /api/me

use axum::extract::State;
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

use super::super::ensure_user;

pub async fn me(State(state): State<AppState>, user: AuthUser) -> ApiResult<Value> {
    let profile = ensure_user(&state, &user).await?;
    let organizations = state.users().organizations(user.id).await?;
    Ok(ApiResponse::success(json!({
        "user": profile,
        "organizations": organizations,
    })))
}
