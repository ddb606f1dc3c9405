// handlers/protected/api/billing.rs - POST /api/organizations/:slug/billing/{checkout,portal}

use axum::extract::State;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::Role;
use crate::database::models::Plan;
use crate::error::ApiError;
use crate::middleware::{authorize, ApiJson, ApiPath, ApiResponse, ApiResult, AuthUser, OrgAccess};
use crate::services::StripeError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub plan: String,
}

pub async fn checkout(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(slug): ApiPath<String>,
    ApiJson(body): ApiJson<CheckoutRequest>,
) -> ApiResult<Value> {
    let access = authorize(&state, &user, &slug, Role::Admin).await?;
    let url = checkout_url(&state, &user, &access, &body.plan).await?;
    Ok(ApiResponse::success(json!({ "url": url })))
}

pub async fn portal(State(state): State<AppState>, user: AuthUser, ApiPath(slug): ApiPath<String>) -> ApiResult<Value> {
    let access = authorize(&state, &user, &slug, Role::Admin).await?;
    let url = portal_url(&state, &access).await?;
    Ok(ApiResponse::success(json!({ "url": url })))
}

/// Hosted Checkout URL for a paid plan. The trial is not purchasable.
pub(crate) async fn checkout_url(
    state: &AppState,
    user: &AuthUser,
    access: &OrgAccess,
    plan: &str,
) -> Result<String, ApiError> {
    let plan = match plan.parse::<Plan>() {
        Ok(Plan::Trial) | Err(_) => return Err(StripeError::UnknownPlan(plan.to_string()).into()),
        Ok(plan) => plan,
    };

    let subscription = state.subscriptions().for_organization(access.organization.id).await?;
    let customer_id = subscription.as_ref().and_then(|s| s.stripe_customer_id.as_deref());

    let email = match &user.email {
        Some(email) => email.clone(),
        None => super::super::ensure_user(state, user).await?.email,
    };

    let url = state
        .stripe
        .create_checkout_session(
            &access.organization,
            plan,
            customer_id,
            &email,
            state.config.server.base_url.trim_end_matches('/'),
        )
        .await?;
    tracing::info!("Started {} checkout for {}", plan.as_str(), access.organization.slug);
    Ok(url)
}

/// Billing Portal URL; needs a Stripe customer from an earlier checkout.
pub(crate) async fn portal_url(state: &AppState, access: &OrgAccess) -> Result<String, ApiError> {
    let subscription = state.subscriptions().for_organization(access.organization.id).await?;
    let customer_id = subscription
        .and_then(|s| s.stripe_customer_id)
        .ok_or_else(|| ApiError::bad_request("The organization has no billing account yet"))?;

    let return_url = format!(
        "{}/admin/{}",
        state.config.server.base_url.trim_end_matches('/'),
        access.organization.slug
    );
    Ok(state.stripe.create_portal_session(&customer_id, &return_url).await?)
}
