// handlers/public/webhook.rs - POST /api/stripe/webhook

use axum::{body::Bytes, extract::State, http::HeaderMap};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::stripe::{parse_event, subscription_price_id, timestamp_field, verify_signature};
use crate::services::StripeEvent;
use crate::state::AppState;

pub async fn stripe_webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> ApiResult<Value> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::bad_request("Missing Stripe-Signature header"))?;

    verify_signature(&body, signature, state.stripe.webhook_secret(), Utc::now().timestamp())?;
    let event = parse_event(&body)?;
    tracing::info!("Stripe event {} ({})", event.id, event.event_type);

    handle_event(&state, &event).await?;
    Ok(ApiResponse::success(json!({ "received": true })))
}

async fn handle_event(state: &AppState, event: &StripeEvent) -> Result<(), ApiError> {
    let object = &event.data.object;
    match event.event_type.as_str() {
        "checkout.session.completed" => {
            let org_id = object
                .pointer("/metadata/organization_id")
                .or_else(|| object.get("client_reference_id"))
                .and_then(Value::as_str)
                .and_then(|id| Uuid::parse_str(id).ok());
            let Some(org_id) = org_id else {
                tracing::warn!("Checkout session {} carries no organization id", event.id);
                return Ok(());
            };
            let plan = object
                .pointer("/metadata/plan")
                .and_then(Value::as_str)
                .unwrap_or("basic");

            state
                .subscriptions()
                .activate(
                    org_id,
                    plan,
                    object.get("customer").and_then(Value::as_str),
                    object.get("subscription").and_then(Value::as_str),
                )
                .await?;
            tracing::info!("Activated {} plan for organization {}", plan, org_id);
        }
        "customer.subscription.updated" | "customer.subscription.deleted" => {
            let Some(subscription_id) = object.get("id").and_then(Value::as_str) else {
                tracing::warn!("Subscription event {} has no subscription id", event.id);
                return Ok(());
            };
            let status = if event.event_type == "customer.subscription.deleted" {
                "canceled"
            } else {
                object.get("status").and_then(Value::as_str).unwrap_or("active")
            };
            let plan = subscription_price_id(object)
                .and_then(|price| state.stripe.plan_for_price(price))
                .map(|plan| plan.as_str());

            let linked = state
                .subscriptions()
                .update_from_stripe(
                    subscription_id,
                    status,
                    plan,
                    timestamp_field(object, "current_period_end"),
                )
                .await?;
            if !linked {
                tracing::warn!("Stripe subscription {} is not linked to any organization", subscription_id);
            }
        }
        other => tracing::debug!("Ignoring Stripe event type {}", other),
    }
    Ok(())
}
