mod common;

use anyhow::Result;
use axum::{body::Body, http::Request};
use reqwest::StatusCode;
use tower::ServiceExt;

use handbok::config::Environment;

async fn get(router: axum::Router, uri: &str, host: &str) -> Result<axum::response::Response> {
    Ok(router
        .oneshot(Request::builder().uri(uri).header("host", host).body(Body::empty())?)
        .await?)
}

#[tokio::test]
async fn dashboard_without_session_redirects_to_login() -> Result<()> {
    let router = common::router(common::test_config(&common::unreachable_url()?))?;
    let res = get(router, "/dashboard", "localhost:3000").await?;

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(res.headers()["location"], "/login?next=%2Fdashboard");
    Ok(())
}

#[tokio::test]
async fn admin_without_session_keeps_the_requested_path() -> Result<()> {
    let router = common::router(common::test_config(&common::unreachable_url()?))?;
    let res = get(router, "/admin/brf-eken?tab=members", "localhost:3000").await?;

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        res.headers()["location"],
        "/login?next=%2Fadmin%2Fbrf-eken%3Ftab%3Dmembers"
    );
    Ok(())
}

#[tokio::test]
async fn invalid_session_cookie_is_treated_as_signed_out() -> Result<()> {
    let router = common::router(common::test_config(&common::unreachable_url()?))?;
    let res = router
        .oneshot(
            Request::builder()
                .uri("/dashboard/brf-eken")
                .header("cookie", "sb-access-token=not.a.jwt")
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(res.headers()["location"], "/login?next=%2Fdashboard%2Fbrf-eken");
    Ok(())
}

#[tokio::test]
async fn static_pages_render_on_the_apex_domain() -> Result<()> {
    let server = common::serve(common::router(common::test_config(&common::unreachable_url()?))?).await?;
    let client = common::client()?;

    for path in ["/", "/about", "/terms", "/privacy", "/login", "/signup"] {
        let res = client.get(format!("{}{}", server.base_url, path)).send().await?;
        assert_eq!(res.status(), StatusCode::OK, "{} failed", path);
        let html = res.text().await?;
        assert!(html.contains("Handbok.org"), "{} is missing the layout", path);
    }
    Ok(())
}

#[tokio::test]
async fn login_form_only_keeps_local_next() -> Result<()> {
    let router = common::router(common::test_config(&common::unreachable_url()?))?;
    let res = get(router, "/login?next=https%3A%2F%2Fevil.example", "localhost:3000").await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = axum::body::to_bytes(res.into_body(), usize::MAX).await?;
    let html = String::from_utf8_lossy(&body);
    // Tera escapes `/` in attribute values
    assert!(html.contains(r#"name="next" value="&#x2F;dashboard""#));
    assert!(!html.contains("evil.example"));
    Ok(())
}

#[tokio::test]
async fn staging_404_shows_diagnostics() -> Result<()> {
    let mut config = common::test_config(&common::unreachable_url()?);
    config.environment = Environment::Staging;
    config.server.base_domain = "staging.handbok.org".to_string();
    let router = common::router(config)?;

    let res = get(router, "/no/such/page", "okand.staging.handbok.org").await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let body = axum::body::to_bytes(res.into_body(), usize::MAX).await?;
    let html = String::from_utf8_lossy(&body);
    assert!(html.contains("okand.staging.handbok.org"));
    assert!(html.contains("&#x2F;no&#x2F;such&#x2F;page"));
    Ok(())
}

#[tokio::test]
async fn production_404_hides_diagnostics() -> Result<()> {
    let router = common::router(common::test_config(&common::unreachable_url()?))?;
    let res = get(router, "/no/such/page", "handbok.org").await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let body = axum::body::to_bytes(res.into_body(), usize::MAX).await?;
    assert!(!String::from_utf8_lossy(&body).contains("Diagnostik"));
    Ok(())
}

#[tokio::test]
async fn logout_clears_session_cookies() -> Result<()> {
    let router = common::router(common::test_config(&common::unreachable_url()?))?;
    let res = router
        .oneshot(Request::builder().method("POST").uri("/logout").body(Body::empty())?)
        .await?;

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    let cookies: Vec<_> = res
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    assert_eq!(cookies.len(), 2);
    assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
    Ok(())
}
