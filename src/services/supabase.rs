use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use url::Url;
use uuid::Uuid;

use crate::config::SupabaseConfig;

/// Timeout for the diagnostic health probe; regular calls have none.
pub const HEALTH_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum SupabaseError {
    #[error("Supabase is not configured: {0} missing")]
    NotConfigured(&'static str),

    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("Supabase rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid Supabase URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Supabase request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Unexpected Supabase response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: Value,
}

impl SupabaseUser {
    pub fn full_name(&self) -> Option<&str> {
        self.user_metadata.get("full_name").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub user: SupabaseUser,
}

/// Sign-up either starts a session or waits for e-mail confirmation
#[derive(Debug, Clone)]
pub enum SignUpOutcome {
    Session(AuthSession),
    ConfirmationRequired(SupabaseUser),
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthProbe {
    pub url: String,
    pub ok: bool,
    pub status: Option<u16>,
    pub latency_ms: u128,
    pub error: Option<String>,
}

/// Minimal REST client for Supabase Auth (GoTrue) and Storage
#[derive(Clone)]
pub struct SupabaseClient {
    http: Client,
    config: SupabaseConfig,
}

impl SupabaseClient {
    pub fn new(http: Client, config: SupabaseConfig) -> Self {
        Self { http, config }
    }

    pub fn base_url(&self) -> &str {
        &self.config.url
    }

    pub fn anon_key(&self) -> &str {
        &self.config.anon_key
    }

    /// Build `{base}/{segments...}`, percent-encoding each segment.
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url, SupabaseError> {
        if self.config.url.is_empty() {
            return Err(SupabaseError::NotConfigured("SUPABASE_URL"));
        }
        let mut url = Url::parse(&self.config.url)?;
        url.path_segments_mut()
            .map_err(|_| SupabaseError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn anon_request(&self, method: Method, url: Url) -> Result<RequestBuilder, SupabaseError> {
        if self.config.anon_key.is_empty() {
            return Err(SupabaseError::NotConfigured("SUPABASE_ANON_KEY"));
        }
        Ok(self.http.request(method, url).header("apikey", &self.config.anon_key))
    }

    fn service_request(&self, method: Method, url: Url) -> Result<RequestBuilder, SupabaseError> {
        let key = &self.config.service_role_key;
        if key.is_empty() {
            return Err(SupabaseError::NotConfigured("SUPABASE_SERVICE_ROLE_KEY"));
        }
        Ok(self
            .http
            .request(method, url)
            .header("apikey", key)
            .bearer_auth(key))
    }

    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession, SupabaseError> {
        let mut url = self.endpoint(["auth", "v1", "token"])?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let response = self
            .anon_request(Method::POST, url)?
            .json(&json!({ "email": email.trim(), "password": password }))
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            tracing::info!("Supabase sign-in rejected for {}", email.trim());
            return Err(SupabaseError::InvalidCredentials);
        }
        check_status(status, &body)?;

        serde_json::from_value(body).map_err(|e| SupabaseError::Decode(e.to_string()))
    }

    /// Exchange a refresh token for a new session
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, SupabaseError> {
        let mut url = self.endpoint(["auth", "v1", "token"])?;
        url.query_pairs_mut().append_pair("grant_type", "refresh_token");

        let response = self
            .anon_request(Method::POST, url)?
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        check_status(status, &body)?;
        serde_json::from_value(body).map_err(|e| SupabaseError::Decode(e.to_string()))
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
        redirect_to: &str,
    ) -> Result<SignUpOutcome, SupabaseError> {
        let mut url = self.endpoint(["auth", "v1", "signup"])?;
        url.query_pairs_mut().append_pair("redirect_to", redirect_to);

        let response = self
            .anon_request(Method::POST, url)?
            .json(&json!({
                "email": email.trim(),
                "password": password,
                "data": { "full_name": full_name.map(str::trim) },
            }))
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        check_status(status, &body)?;
        parse_sign_up(body)
    }

    pub async fn get_user(&self, access_token: &str) -> Result<SupabaseUser, SupabaseError> {
        let url = self.endpoint(["auth", "v1", "user"])?;
        let response = self
            .anon_request(Method::GET, url)?
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        check_status(status, &body)?;
        serde_json::from_value(body).map_err(|e| SupabaseError::Decode(e.to_string()))
    }

    /// Revoke the session server-side; failures only matter for logging.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), SupabaseError> {
        let url = self.endpoint(["auth", "v1", "logout"])?;
        let response = self
            .anon_request(Method::POST, url)?
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() || status == StatusCode::UNAUTHORIZED {
            return Ok(());
        }
        let body: Value = response.json().await.unwrap_or(Value::Null);
        check_status(status, &body)
    }

    pub async fn upload_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), SupabaseError> {
        let url = self.storage_object_url(&["object"], path)?;
        let response = self
            .service_request(Method::POST, url)?
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        check_status(status, &body)
    }

    /// Time-limited download URL for a stored object
    pub async fn signed_url(&self, path: &str, expires_in_secs: u64) -> Result<String, SupabaseError> {
        let url = self.storage_object_url(&["object", "sign"], path)?;
        let response = self
            .service_request(Method::POST, url)?
            .json(&json!({ "expiresIn": expires_in_secs }))
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        check_status(status, &body)?;

        let signed = body
            .get("signedURL")
            .or_else(|| body.get("signedUrl"))
            .and_then(Value::as_str)
            .ok_or_else(|| SupabaseError::Decode("missing signedURL".to_string()))?;
        Ok(format!("{}/storage/v1{}", self.config.url, signed))
    }

    pub async fn delete_object(&self, path: &str) -> Result<(), SupabaseError> {
        let url = self.endpoint(["storage", "v1", "object", self.config.storage_bucket.as_str()])?;
        let response = self
            .service_request(Method::DELETE, url)?
            .json(&json!({ "prefixes": [path] }))
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        check_status(status, &body)
    }

    fn storage_object_url(&self, kind: &[&str], path: &str) -> Result<Url, SupabaseError> {
        let segments = ["storage", "v1"]
            .into_iter()
            .chain(kind.iter().copied())
            .chain(std::iter::once(self.config.storage_bucket.as_str()))
            .chain(path.split('/').filter(|s| !s.is_empty()));
        self.endpoint(segments)
    }

    /// Probe `{url}/auth/v1/health` with a fixed timeout.
    pub async fn health_probe(&self) -> HealthProbe {
        let url = match self.endpoint(["auth", "v1", "health"]) {
            Ok(url) => url,
            Err(e) => {
                return HealthProbe {
                    url: self.config.url.clone(),
                    ok: false,
                    status: None,
                    latency_ms: 0,
                    error: Some(e.to_string()),
                }
            }
        };

        let started = Instant::now();
        let result = self
            .http
            .get(url.clone())
            .header("apikey", &self.config.anon_key)
            .timeout(HEALTH_PROBE_TIMEOUT)
            .send()
            .await;
        let latency_ms = started.elapsed().as_millis();

        match result {
            Ok(response) => HealthProbe {
                url: url.to_string(),
                ok: response.status().is_success(),
                status: Some(response.status().as_u16()),
                latency_ms,
                error: None,
            },
            Err(e) => {
                tracing::warn!("Supabase health probe failed: {}", e);
                HealthProbe {
                    url: url.to_string(),
                    ok: false,
                    status: None,
                    latency_ms,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

fn check_status(status: StatusCode, body: &Value) -> Result<(), SupabaseError> {
    if status.is_success() {
        return Ok(());
    }
    Err(SupabaseError::Rejected {
        status: status.as_u16(),
        message: error_message(body).unwrap_or_else(|| status.to_string()),
    })
}

/// GoTrue and Storage disagree on where the message lives.
fn error_message(body: &Value) -> Option<String> {
    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|key| body.get(key).and_then(Value::as_str))
        .map(str::to_string)
}

fn parse_sign_up(body: Value) -> Result<SignUpOutcome, SupabaseError> {
    if body.get("access_token").is_some() {
        let session = serde_json::from_value(body).map_err(|e| SupabaseError::Decode(e.to_string()))?;
        return Ok(SignUpOutcome::Session(session));
    }
    let user = match body.get("user") {
        Some(user) => serde_json::from_value(user.clone()),
        None => serde_json::from_value(body),
    }
    .map_err(|e| SupabaseError::Decode(e.to_string()))?;
    Ok(SignUpOutcome::ConfirmationRequired(user))
}
