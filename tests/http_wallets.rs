//! HTTP tests for the wallet endpoints.

#![cfg(feature = "http-server")]

mod support;

use axum::http::{Method, StatusCode};
use serde_json::json;

use support::http::{app, create_transaction, create_wallet, get, post, send, MEDIA_TYPE};

#[tokio::test]
async fn test_health_reports_connected() {
    let app = app();
    let res = get(&app, "/health").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["status"], "ok");
    assert_eq!(res.body["database"], "connected");
}

#[tokio::test]
async fn test_create_wallet_starts_at_zero() {
    let app = app();
    let res = post(
        &app,
        "/api/wallets/",
        json!({"data": {"type": "Wallet", "attributes": {"label": "Treasury"}}}),
    )
    .await;

    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.content_type.as_deref(), Some(MEDIA_TYPE));
    let data = &res.body["data"];
    assert_eq!(data["type"], "Wallet");
    assert_eq!(data["attributes"]["label"], "Treasury");
    assert_eq!(data["attributes"]["balance"], "0.000000000000000000");
    assert_eq!(
        data["links"]["self"],
        format!("/api/wallets/{}/", data["id"].as_str().unwrap())
    );
}

#[tokio::test]
async fn test_create_wallet_ignores_client_balance() {
    let app = app();
    let res = post(
        &app,
        "/api/wallets/",
        json!({"data": {"type": "Wallet", "attributes": {"label": "rich", "balance": "1000"}}}),
    )
    .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["data"]["attributes"]["balance"], "0.000000000000000000");
}

#[tokio::test]
async fn test_create_wallet_validation_errors() {
    let app = app();

    let missing = post(&app, "/api/wallets/", json!({"data": {"type": "Wallet", "attributes": {}}})).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.content_type.as_deref(), Some(MEDIA_TYPE));
    assert_eq!(missing.error()["source"]["pointer"], "/data/attributes/label");
    assert_eq!(missing.error()["detail"], "This field is required.");

    let long = "x".repeat(256);
    let too_long = post(
        &app,
        "/api/wallets/",
        json!({"data": {"type": "Wallet", "attributes": {"label": long}}}),
    )
    .await;
    assert_eq!(too_long.status, StatusCode::BAD_REQUEST);
    assert_eq!(too_long.error()["source"]["pointer"], "/data/attributes/label");

    create_wallet(&app, "taken").await;
    let duplicate = post(
        &app,
        "/api/wallets/",
        json!({"data": {"type": "Wallet", "attributes": {"label": "taken"}}}),
    )
    .await;
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);
    assert_eq!(duplicate.error()["source"]["pointer"], "/data/attributes/label");
    assert_eq!(duplicate.error()["detail"], "Wallet with this label already exists.");
}

#[tokio::test]
async fn test_create_wallet_wrong_type_is_conflict() {
    let app = app();
    let res = post(
        &app,
        "/api/wallets/",
        json!({"data": {"type": "Transaction", "attributes": {"label": "x"}}}),
    )
    .await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.error()["status"], "409");
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = app();
    let res = post(&app, "/api/wallets/", json!({"label": "no document"})).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error()["source"]["pointer"], "/data");
}

#[tokio::test]
async fn test_get_wallet_and_missing_ids() {
    let app = app();
    let id = create_wallet(&app, "ops").await;

    let found = get(&app, &format!("/api/wallets/{}/", id)).await;
    assert_eq!(found.status, StatusCode::OK);
    assert_eq!(found.body["data"]["id"], id.as_str());

    let missing = get(&app, "/api/wallets/999/").await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.content_type.as_deref(), Some(MEDIA_TYPE));

    let not_a_number = get(&app, "/api/wallets/abc/").await;
    assert_eq!(not_a_number.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_paths_work_without_trailing_slash() {
    let app = app();
    let id = create_wallet(&app, "ops").await;

    assert_eq!(get(&app, "/api/wallets").await.status, StatusCode::OK);
    assert_eq!(get(&app, &format!("/api/wallets/{}", id)).await.status, StatusCode::OK);
    assert_eq!(get(&app, "/api/schema").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_patch_renames_and_ignores_balance() {
    let app = app();
    let id = create_wallet(&app, "old").await;

    let res = send(
        &app,
        Method::PATCH,
        &format!("/api/wallets/{}/", id),
        Some(json!({"data": {"type": "Wallet", "id": id, "attributes": {"label": "new", "balance": "5"}}})),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["attributes"]["label"], "new");
    assert_eq!(res.body["data"]["attributes"]["balance"], "0.000000000000000000");
}

#[tokio::test]
async fn test_put_on_wallet_not_allowed() {
    let app = app();
    let id = create_wallet(&app, "fixed").await;

    let res = send(
        &app,
        Method::PUT,
        &format!("/api/wallets/{}/", id),
        Some(json!({"data": {"type": "Wallet", "id": id, "attributes": {"label": "other"}}})),
    )
    .await;
    assert_eq!(res.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        get(&app, &format!("/api/wallets/{}/", id)).await.body["data"]["attributes"]["label"],
        "fixed"
    );
}

#[tokio::test]
async fn test_patch_accepts_numeric_id() {
    let app = app();
    let id = create_wallet(&app, "old").await;
    let numeric: i64 = id.parse().unwrap();

    let res = send(
        &app,
        Method::PATCH,
        &format!("/api/wallets/{}/", id),
        Some(json!({"data": {"type": "Wallet", "id": numeric, "attributes": {"label": "renamed"}}})),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["attributes"]["label"], "renamed");
}

#[tokio::test]
async fn test_patch_id_rules() {
    let app = app();
    let id = create_wallet(&app, "old").await;
    let uri = format!("/api/wallets/{}/", id);

    let without_id = send(
        &app,
        Method::PATCH,
        &uri,
        Some(json!({"data": {"type": "Wallet", "attributes": {"label": "x"}}})),
    )
    .await;
    assert_eq!(without_id.status, StatusCode::BAD_REQUEST);

    let mismatch = send(
        &app,
        Method::PATCH,
        &uri,
        Some(json!({"data": {"type": "Wallet", "id": "12345", "attributes": {"label": "x"}}})),
    )
    .await;
    assert_eq!(mismatch.status, StatusCode::CONFLICT);

    let unchanged = get(&app, &uri).await;
    assert_eq!(unchanged.body["data"]["attributes"]["label"], "old");
}

#[tokio::test]
async fn test_patch_to_taken_label_rejected() {
    let app = app();
    create_wallet(&app, "first").await;
    let id = create_wallet(&app, "second").await;

    let res = send(
        &app,
        Method::PATCH,
        &format!("/api/wallets/{}/", id),
        Some(json!({"data": {"type": "Wallet", "id": id, "attributes": {"label": "first"}}})),
    )
    .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error()["source"]["pointer"], "/data/attributes/label");
}

#[tokio::test]
async fn test_delete_wallet_cascades() {
    let app = app();
    let id = create_wallet(&app, "doomed").await;
    let tx = create_transaction(&app, &id, "tx-doomed", "10").await;
    assert_eq!(tx.status, StatusCode::CREATED);
    let tx_id = tx.body["data"]["id"].as_str().unwrap().to_string();

    let res = send(&app, Method::DELETE, &format!("/api/wallets/{}/", id), None).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);

    assert_eq!(
        get(&app, &format!("/api/wallets/{}/", id)).await.status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        get(&app, &format!("/api/transactions/{}/", tx_id)).await.status,
        StatusCode::NOT_FOUND
    );

    let again = send(&app, Method::DELETE, &format!("/api/wallets/{}/", id), None).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_schema_describes_endpoints() {
    let app = app();
    let res = get(&app, "/api/schema/").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["openapi"], "3.0.3");
    assert!(res.body["paths"]["/api/transactions/"]["post"].is_object());
}

#[tokio::test]
async fn test_schema_browsers() {
    let app = app();
    for (path, marker) in [
        ("/api/schema/swagger-ui/", "SwaggerUIBundle"),
        ("/api/schema/redoc/", "<redoc spec-url=\"/api/schema/\">"),
        ("/api/schema/redoc", "redoc.standalone.js"),
    ] {
        let res = get(&app, path).await;
        assert_eq!(res.status, StatusCode::OK, "{}", path);
        assert!(res.content_type.as_deref().unwrap_or_default().starts_with("text/html"));
        assert!(res.body.as_str().unwrap().contains(marker), "{}", path);
    }
}
