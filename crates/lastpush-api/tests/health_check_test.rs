//! Health and routing tests: `/ping`, `/health`, `/live`, and unknown paths.

use anyhow::Result;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use lastpush_testing::TestEnv;

#[tokio::test]
async fn ping_answers_pong() -> Result<()> {
    let env = TestEnv::new();

    let response = env.get("/ping").await?;

    assert_eq!(response.status, StatusCode::OK);
    insta::assert_json_snapshot!(response.body, @r###"
    {
      "message": "pong"
    }
    "###);
    Ok(())
}

#[tokio::test]
async fn health_check_returns_success_when_healthy() -> Result<()> {
    let env = TestEnv::new();

    let response = env.get("/health").await?;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");
    assert_eq!(response.body["checks"]["database"]["status"], "up");
    assert!(response.body["version"].is_string());
    Ok(())
}

#[tokio::test]
async fn health_check_reports_unreachable_store() -> Result<()> {
    let env = TestEnv::new();
    env.store.fail_with("connection refused").await;

    let response = env.get("/health").await?;

    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.body["status"], "unhealthy");
    assert_eq!(response.body["checks"]["database"]["status"], "down");
    Ok(())
}

#[tokio::test]
async fn liveness_ignores_store_state() -> Result<()> {
    let env = TestEnv::new();
    env.store.fail_with("connection refused").await;

    let response = env.get("/live").await?;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "alive");
    assert_eq!(response.body["service"], "lastpush");
    Ok(())
}

#[tokio::test]
async fn unknown_route_is_not_found() -> Result<()> {
    let env = TestEnv::new();

    let response = env.get("/ingest").await?;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn unsigned_post_to_unknown_route_is_not_found() -> Result<()> {
    let env = TestEnv::new();

    let response = env
        .send(Request::builder().method("POST").uri("/ingest").body(Body::from("{}"))?)
        .await?;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.headers.contains_key("x-request-id"));
    Ok(())
}
