// handlers/public/debug.rs - GET /api/debug
//
// Reports which configuration values are set. Values themselves are never
// included, only whether they are present.

use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::config::AppConfig;
use crate::state::AppState;

pub async fn debug(State(state): State<AppState>) -> Json<Value> {
    let probe = state.supabase.health_probe().await;
    Json(json!({
        "environment": state.config.environment,
        "supabase_url": state.config.supabase.url,
        "config": presence(&state.config),
        "supabase_health": probe,
    }))
}

fn presence(config: &AppConfig) -> Value {
    let set = |v: &str| !v.trim().is_empty();
    json!({
        "DATABASE_URL": set(&config.database.url),
        "SUPABASE_URL": set(&config.supabase.url),
        "SUPABASE_ANON_KEY": set(&config.supabase.anon_key),
        "SUPABASE_SERVICE_ROLE_KEY": set(&config.supabase.service_role_key),
        "SUPABASE_JWT_SECRET": set(&config.supabase.jwt_secret),
        "STRIPE_SECRET_KEY": set(&config.stripe.secret_key),
        "STRIPE_WEBHOOK_SECRET": set(&config.stripe.webhook_secret),
        "STRIPE_PRICE_BASIC": set(&config.stripe.price_basic),
        "STRIPE_PRICE_PREMIUM": set(&config.stripe.price_premium),
        "APP_BASE_URL": set(&config.server.base_url),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;

    #[test]
    fn reports_booleans_only() {
        let mut config = AppConfig::preset(Environment::Development);
        config.supabase.jwt_secret = "very-secret-value".into();
        config.stripe.secret_key = String::new();

        let report = presence(&config);
        assert_eq!(report["SUPABASE_JWT_SECRET"], true);
        assert_eq!(report["STRIPE_SECRET_KEY"], false);
        assert!(!report.to_string().contains("very-secret-value"));
    }
}
