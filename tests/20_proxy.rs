mod common;

use anyhow::Result;
use axum::{body::Body, http::Request};
use reqwest::StatusCode;
use serde_json::Value;
use tower::ServiceExt;

#[tokio::test]
async fn strips_prefix_and_attaches_anon_key() -> Result<()> {
    let upstream = common::echo_upstream().await?;
    let server = common::serve(common::router(common::test_config(&upstream.base_url))?).await?;

    let res = common::client()?
        .get(format!("{}/api/proxy/health?x=1&y=%C3%A5", server.base_url))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    assert_eq!(
        res.headers()["access-control-allow-methods"],
        "GET, POST, PUT, PATCH, DELETE, OPTIONS"
    );

    let echoed: Value = res.json().await?;
    assert_eq!(echoed["method"], "GET");
    assert_eq!(echoed["path"], "/health");
    assert_eq!(echoed["query"], "x=1&y=%C3%A5");
    assert_eq!(echoed["headers"]["apikey"], common::ANON_KEY);
    assert_eq!(
        echoed["headers"]["authorization"],
        format!("Bearer {}", common::ANON_KEY)
    );
    // Host is rebuilt for the upstream, never copied from the caller
    assert_eq!(echoed["headers"]["host"], format!("127.0.0.1:{}", upstream.port));
    Ok(())
}

#[tokio::test]
async fn caller_authorization_wins() -> Result<()> {
    let upstream = common::echo_upstream().await?;
    let server = common::serve(common::router(common::test_config(&upstream.base_url))?).await?;

    let res = common::client()?
        .get(format!("{}/api/proxy/auth/v1/user", server.base_url))
        .bearer_auth("user-access-token")
        .send()
        .await?;

    let echoed: Value = res.json().await?;
    assert_eq!(echoed["path"], "/auth/v1/user");
    assert_eq!(echoed["headers"]["authorization"], "Bearer user-access-token");
    assert_eq!(echoed["headers"]["apikey"], common::ANON_KEY);
    Ok(())
}

#[tokio::test]
async fn forwards_method_body_and_upstream_status() -> Result<()> {
    let upstream = common::echo_upstream().await?;
    let server = common::serve(common::router(common::test_config(&upstream.base_url))?).await?;

    let payload = r#"{"title":"Tvättstuga","content":"Boka via tavlan"}"#;
    let res = common::client()?
        .post(format!("{}/api/proxy/rest/v1/pages", server.base_url))
        .header("content-type", "application/json")
        .header("x-client-info", "supabase-js/2.39")
        .body(payload)
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::CREATED);
    let echoed: Value = res.json().await?;
    assert_eq!(echoed["method"], "POST");
    assert_eq!(echoed["path"], "/rest/v1/pages");
    assert_eq!(echoed["body"], payload);
    assert_eq!(echoed["headers"]["x-client-info"], "supabase-js/2.39");
    assert_eq!(echoed["headers"]["content-type"], "application/json");
    Ok(())
}

#[tokio::test]
async fn preflight_is_answered_locally() -> Result<()> {
    // Upstream is unreachable: the preflight must not depend on it
    let router = common::router(common::test_config(&common::unreachable_url()?))?;

    let res = router
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/proxy/rest/v1/pages")
                .header("origin", "https://brf-eken.handbok.org")
                .header("access-control-request-method", "POST")
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    assert_eq!(
        res.headers()["access-control-allow-headers"],
        "authorization, x-client-info, apikey, content-type"
    );
    Ok(())
}

#[tokio::test]
async fn unreachable_upstream_is_a_500_with_details() -> Result<()> {
    let server = common::serve(common::router(common::test_config(&common::unreachable_url()?))?).await?;

    let res = common::client()?
        .get(format!("{}/api/proxy/health", server.base_url))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    let body: Value = res.json().await?;
    assert_eq!(body["error"], "Proxy request failed");
    assert!(body["details"].as_str().is_some_and(|d| !d.is_empty()));
    Ok(())
}
