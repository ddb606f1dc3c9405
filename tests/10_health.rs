mod common;

use anyhow::Result;
use reqwest::StatusCode;

#[tokio::test]
async fn health_reports_unreachable_database() -> Result<()> {
    let server = common::serve(common::router(common::test_config("http://127.0.0.1:9"))?).await?;

    let res = common::client()?
        .get(format!("{}/health", server.base_url))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["database"], "unavailable");
    Ok(())
}

#[tokio::test]
async fn debug_reports_presence_and_probe() -> Result<()> {
    let upstream = common::echo_upstream().await?;
    let server = common::serve(common::router(common::test_config(&upstream.base_url))?).await?;

    let res = common::client()?
        .get(format!("{}/api/debug", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["environment"], "development");
    assert_eq!(body["config"]["SUPABASE_JWT_SECRET"], true);
    assert_eq!(body["config"]["STRIPE_SECRET_KEY"], false);
    assert_eq!(body["supabase_health"]["ok"], true);
    assert_eq!(body["supabase_health"]["status"], 200);
    assert!(!body.to_string().contains(common::JWT_SECRET));
    Ok(())
}
