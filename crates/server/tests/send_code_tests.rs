//! Verification-code hook.

mod common;

use axum::http::StatusCode;
use common::create_test_app;
use myauth::oauth2::HookAction;
use serde_json::json;

#[tokio::test]
async fn test_send_code_delivers() {
    let app = create_test_app().await;
    let token = app
        .resources
        .hook_keys
        .mint(HookAction::SendCode, "alice@example.com", time::Duration::minutes(5))
        .unwrap();

    let response = app
        .server
        .post("/hooks/send-code")
        .authorization_bearer(&token)
        .json(&json!({ "email": "alice@example.com", "code": "123456" }))
        .await;

    response.assert_status(StatusCode::NO_CONTENT);
    let sent = app.codes.sent.lock().unwrap();
    assert_eq!(
        sent.as_slice(),
        &[("alice@example.com".to_string(), "123456".to_string())]
    );
}

#[tokio::test]
async fn test_send_code_requires_token() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/hooks/send-code")
        .json(&json!({ "email": "alice@example.com", "code": "123456" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert!(app.codes.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_send_code_rejects_other_email() {
    let app = create_test_app().await;
    let token = app
        .resources
        .hook_keys
        .mint(HookAction::SendCode, "alice@example.com", time::Duration::minutes(5))
        .unwrap();

    let response = app
        .server
        .post("/hooks/send-code")
        .authorization_bearer(&token)
        .json(&json!({ "email": "mallory@example.com", "code": "123456" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert!(app.codes.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_send_code_rejects_login_token() {
    let app = create_test_app().await;
    let token = app
        .resources
        .hook_keys
        .mint(
            HookAction::LoginSuccess,
            "alice@example.com",
            time::Duration::minutes(5),
        )
        .unwrap();

    let response = app
        .server
        .post("/hooks/send-code")
        .authorization_bearer(&token)
        .json(&json!({ "email": "alice@example.com", "code": "123456" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}
