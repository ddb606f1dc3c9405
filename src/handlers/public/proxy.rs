// handlers/public/proxy.rs - ANY /api/proxy/*path → {SUPABASE_URL}/*path
//
// Relays browser calls to Supabase so the project URL never has to be
// reachable from the client. Method and body are forwarded untouched; the
// anon key is attached here.

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use std::fmt::Display;

use crate::state::AppState;

pub const PROXY_PREFIX: &str = "/api/proxy";

const HOP_BY_HOP: &[&str] = &[
    "connection",
    "content-length",
    "transfer-encoding",
    "keep-alive",
    "upgrade",
    "te",
    "trailer",
    "trailers",
];

const CORS_HEADERS: &[(&str, &str)] = &[
    ("access-control-allow-origin", "*"),
    ("access-control-allow-methods", "GET, POST, PUT, PATCH, DELETE, OPTIONS"),
    ("access-control-allow-headers", "authorization, x-client-info, apikey, content-type"),
];

pub async fn forward(State(state): State<AppState>, request: Request) -> Response {
    if request.method() == Method::OPTIONS {
        return preflight();
    }

    let base = state.config.supabase.url.as_str();
    if base.is_empty() {
        return proxy_failure("SUPABASE_URL is not configured");
    }

    let (parts, body) = request.into_parts();
    let url = upstream_url(base, parts.uri.path(), parts.uri.query());
    let headers = upstream_request_headers(&parts.headers, state.supabase.anon_key());

    let body = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => return proxy_failure(e),
    };

    let mut upstream = state.proxy_http.request(parts.method.clone(), &url).headers(headers);
    if !body.is_empty() {
        upstream = upstream.body(body);
    }

    let upstream = match upstream.send().await {
        Ok(response) => response,
        Err(e) => return proxy_failure(e),
    };

    let status = upstream.status();
    let headers = client_response_headers(upstream.headers());
    let bytes = match upstream.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => return proxy_failure(e),
    };

    tracing::debug!("proxy {} {} -> {}", parts.method, url, status);

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// `{base}/{rest}` with exactly one slash between, query kept verbatim.
pub fn upstream_url(base: &str, path: &str, query: Option<&str>) -> String {
    let rest = path.strip_prefix(PROXY_PREFIX).unwrap_or(path);
    let mut url = format!("{}/{}", base.trim_end_matches('/'), rest.trim_start_matches('/'));
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(query);
    }
    url
}

pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    let name = name.as_str();
    HOP_BY_HOP.contains(&name) || name.starts_with("proxy-")
}

/// Caller headers minus `Host` and hop-by-hop, plus the anon key. A caller
/// `Authorization` (the user's token) is kept; otherwise the anon key is used.
pub fn upstream_request_headers(incoming: &HeaderMap, anon_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(incoming.len() + 2);
    for (name, value) in incoming {
        if name == header::HOST || is_hop_by_hop(name) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    if let Ok(key) = HeaderValue::from_str(anon_key) {
        headers.insert(HeaderName::from_static("apikey"), key);
    }
    if !headers.contains_key(header::AUTHORIZATION) {
        if let Ok(bearer) = HeaderValue::from_str(&format!("Bearer {}", anon_key)) {
            headers.insert(header::AUTHORIZATION, bearer);
        }
    }
    headers
}

pub fn client_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(upstream.len() + CORS_HEADERS.len());
    for (name, value) in upstream {
        if !is_hop_by_hop(name) {
            headers.append(name.clone(), value.clone());
        }
    }
    apply_cors(&mut headers);
    headers
}

fn apply_cors(headers: &mut HeaderMap) {
    for &(name, value) in CORS_HEADERS {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
}

fn preflight() -> Response {
    let mut response = StatusCode::NO_CONTENT.into_response();
    apply_cors(response.headers_mut());
    response
}

fn proxy_failure(details: impl Display) -> Response {
    tracing::error!("Proxy request failed: {}", details);
    let mut response = (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Proxy request failed", "details": details.to_string() })),
    )
        .into_response();
    apply_cors(response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://abc.supabase.co";

    #[test]
    fn strips_prefix_and_joins_with_one_slash() {
        assert_eq!(upstream_url(BASE, "/api/proxy/health", None), "https://abc.supabase.co/health");
        assert_eq!(
            upstream_url("https://abc.supabase.co/", "/api/proxy//auth/v1/user", Some("x=1")),
            "https://abc.supabase.co/auth/v1/user?x=1"
        );
        assert_eq!(upstream_url(BASE, "/api/proxy", Some("")), "https://abc.supabase.co/");
    }

    #[test]
    fn query_is_passed_verbatim() {
        assert_eq!(
            upstream_url(BASE, "/api/proxy/rest/v1/pages", Some("select=*&title=eq.V%C3%A4lkommen")),
            "https://abc.supabase.co/rest/v1/pages?select=*&title=eq.V%C3%A4lkommen"
        );
    }

    #[test]
    fn drops_host_and_hop_by_hop_headers() {
        let mut incoming = HeaderMap::new();
        incoming.insert(header::HOST, HeaderValue::from_static("handbok.org"));
        incoming.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        incoming.insert("proxy-authorization", HeaderValue::from_static("Basic xyz"));
        incoming.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        incoming.insert("x-client-info", HeaderValue::from_static("supabase-js/2"));

        let headers = upstream_request_headers(&incoming, "anon");
        assert!(headers.get(header::HOST).is_none());
        assert!(headers.get(header::CONNECTION).is_none());
        assert!(headers.get("proxy-authorization").is_none());
        assert_eq!(headers["content-type"], "application/json");
        assert_eq!(headers["x-client-info"], "supabase-js/2");
    }

    #[test]
    fn anon_key_is_attached_without_overriding_user_token() {
        let headers = upstream_request_headers(&HeaderMap::new(), "anon-key");
        assert_eq!(headers["apikey"], "anon-key");
        assert_eq!(headers["authorization"], "Bearer anon-key");

        let mut incoming = HeaderMap::new();
        incoming.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer user-jwt"));
        let headers = upstream_request_headers(&incoming, "anon-key");
        assert_eq!(headers["apikey"], "anon-key");
        assert_eq!(headers["authorization"], "Bearer user-jwt");
    }

    #[test]
    fn response_headers_gain_cors() {
        let mut upstream = HeaderMap::new();
        upstream.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        upstream.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        upstream.insert("access-control-allow-origin", HeaderValue::from_static("https://abc.supabase.co"));

        let headers = client_response_headers(&upstream);
        assert!(headers.get(header::TRANSFER_ENCODING).is_none());
        assert_eq!(headers["content-type"], "application/json");
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(
            headers["access-control-allow-headers"],
            "authorization, x-client-info, apikey, content-type"
        );
    }
}
