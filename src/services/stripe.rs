use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;

use crate::config::StripeConfig;
use crate::database::models::{Organization, Plan};

type HmacSha256 = Hmac<Sha256>;

/// Maximum age of a webhook signature timestamp
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, thiserror::Error)]
pub enum StripeError {
    #[error("Stripe is not configured: {0} missing")]
    NotConfigured(&'static str),

    #[error("No price configured for plan '{0}'")]
    UnknownPlan(String),

    #[error("{0}")]
    InvalidSignature(String),

    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    #[error("Stripe API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Stripe request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Webhook event envelope; `data.object` is kept as raw JSON
#[derive(Debug, Clone, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: StripeEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeEventData {
    pub object: Value,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    url: String,
}

#[derive(Clone)]
pub struct StripeClient {
    http: Client,
    config: StripeConfig,
}

impl StripeClient {
    pub fn new(http: Client, config: StripeConfig) -> Self {
        Self { http, config }
    }

    pub fn webhook_secret(&self) -> &str {
        &self.config.webhook_secret
    }

    pub fn price_for(&self, plan: Plan) -> Result<&str, StripeError> {
        let price = match plan {
            Plan::Basic => &self.config.price_basic,
            Plan::Premium => &self.config.price_premium,
            Plan::Trial => return Err(StripeError::UnknownPlan(plan.as_str().to_string())),
        };
        if price.is_empty() {
            return Err(StripeError::UnknownPlan(plan.as_str().to_string()));
        }
        Ok(price.as_str())
    }

    pub fn plan_for_price(&self, price_id: &str) -> Option<Plan> {
        if !self.config.price_basic.is_empty() && price_id == self.config.price_basic {
            Some(Plan::Basic)
        } else if !self.config.price_premium.is_empty() && price_id == self.config.price_premium {
            Some(Plan::Premium)
        } else {
            None
        }
    }

    /// Start a subscription Checkout session and return its hosted URL.
    pub async fn create_checkout_session(
        &self,
        organization: &Organization,
        plan: Plan,
        customer_id: Option<&str>,
        customer_email: &str,
        base_url: &str,
    ) -> Result<String, StripeError> {
        let price = self.price_for(plan)?;
        let org_id = organization.id.to_string();
        let success_url = format!("{}/admin/{}?checkout=success", base_url, organization.slug);
        let cancel_url = format!("{}/admin/{}?checkout=cancelled", base_url, organization.slug);

        let mut form: Vec<(&str, &str)> = vec![
            ("mode", "subscription"),
            ("line_items[0][price]", price),
            ("line_items[0][quantity]", "1"),
            ("success_url", success_url.as_str()),
            ("cancel_url", cancel_url.as_str()),
            ("client_reference_id", org_id.as_str()),
            ("metadata[organization_id]", org_id.as_str()),
            ("metadata[plan]", plan.as_str()),
            ("subscription_data[metadata][organization_id]", org_id.as_str()),
            ("subscription_data[metadata][plan]", plan.as_str()),
            ("locale", "sv"),
        ];
        match customer_id {
            Some(customer) => form.push(("customer", customer)),
            None => form.push(("customer_email", customer_email)),
        }

        let session: SessionResponse = self.post_form("/v1/checkout/sessions", &form).await?;
        Ok(session.url)
    }

    pub async fn create_portal_session(&self, customer_id: &str, return_url: &str) -> Result<String, StripeError> {
        let form = [("customer", customer_id), ("return_url", return_url)];
        let session: SessionResponse = self.post_form("/v1/billing_portal/sessions", &form).await?;
        Ok(session.url)
    }

    async fn post_form<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<T, StripeError> {
        if self.config.secret_key.is_empty() {
            return Err(StripeError::NotConfigured("STRIPE_SECRET_KEY"));
        }

        let response = self
            .http
            .post(format!("{}{}", self.config.api_base, path))
            .bearer_auth(&self.config.secret_key)
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            let message = body["error"]["message"]
                .as_str()
                .unwrap_or("unknown error")
                .to_string();
            return Err(StripeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

/// Check a `Stripe-Signature` header (`t=...,v1=...`) against the raw body.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: i64,
) -> Result<(), StripeError> {
    if secret.is_empty() {
        return Err(StripeError::NotConfigured("STRIPE_WEBHOOK_SECRET"));
    }

    let mut timestamp: Option<i64> = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| StripeError::InvalidSignature("Missing signature timestamp".to_string()))?;
    if signatures.is_empty() {
        return Err(StripeError::InvalidSignature("Missing v1 signature".to_string()));
    }
    if (now - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(StripeError::InvalidSignature("Signature timestamp outside tolerance".to_string()));
    }

    for signature in signatures {
        let Ok(expected) = hex::decode(signature) else {
            continue;
        };
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| StripeError::InvalidSignature("Invalid webhook secret".to_string()))?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        if mac.verify_slice(&expected).is_ok() {
            return Ok(());
        }
    }

    Err(StripeError::InvalidSignature("No matching webhook signature".to_string()))
}

pub fn parse_event(payload: &[u8]) -> Result<StripeEvent, StripeError> {
    Ok(serde_json::from_slice(payload)?)
}

/// Unix seconds from a Stripe object field
pub fn timestamp_field(object: &Value, field: &str) -> Option<DateTime<Utc>> {
    object
        .get(field)
        .and_then(Value::as_i64)
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
}

/// First price id on a subscription object
pub fn subscription_price_id(object: &Value) -> Option<&str> {
    object
        .pointer("/items/data/0/price/id")
        .and_then(Value::as_str)
}

#[cfg(test)]
pub(crate) fn sign_payload(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{}.", timestamp).as_bytes());
    mac.update(payload);
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}
