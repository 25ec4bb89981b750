mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use calc_api_rust::config::AppConfig;

#[tokio::test]
async fn legacy_collection_is_unscoped() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = server
        .client
        .post(server.url("/calculations"))
        .json(&json!({ "a": 10, "b": 5, "type": "Add" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await?;
    assert_eq!(created["data"]["result"], 15.0);
    assert!(created["data"]["user_id"].is_null());
    let url = server.url(&format!("/calculations/{}", created["data"]["id"]));

    let updated: Value = server
        .client
        .put(&url)
        .json(&json!({ "type": "Multiply" }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(updated["data"]["result"], 50.0);

    let list: Value = server.client.get(server.url("/calculations")).send().await?.json().await?;
    assert_eq!(list["data"].as_array().map(Vec::len), Some(1));

    let res = server.client.delete(&url).send().await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    Ok(())
}

#[tokio::test]
async fn legacy_collection_sees_owned_records() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = server.register("owner@example.com").await?;

    server
        .client
        .post(server.url("/api/calculations"))
        .bearer_auth(&token)
        .json(&json!({ "a": 2, "b": 3, "type": "Multiply" }))
        .send()
        .await?;

    let list: Value = server.client.get(server.url("/calculations")).send().await?.json().await?;
    assert_eq!(list["data"][0]["result"], 6.0);
    Ok(())
}

#[tokio::test]
async fn legacy_collection_can_be_disabled() -> Result<()> {
    let mut config = AppConfig::development();
    config.api.enable_public_calculations = false;
    let server = common::spawn_with(config).await?;

    let res = server.client.get(server.url("/calculations")).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}
