//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use axum::{
    extract::Request,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_test::TestServer;
use futures::future::BoxFuture;
use migration::{Migrator, MigratorTrait};
use myauth::{
    AppResources,
    config::{AppConfig, IssuerConfig, SessionConfig},
    error::DeliveryError,
    issuer::Issuer,
    oauth2::{CodeSender, session::SqlSessionStore},
};
use sea_orm::{Database, DatabaseConnection};
use std::sync::{Arc, Mutex};

pub const HOOK_SECRET: &str = "0123456789abcdef0123456789abcdef";
pub const PUBLIC_URL: &str = "http://localhost:8080";
pub const CLIENT_ID: &str = "test-client";
pub const POST_LOGIN_REDIRECT: &str = "https://example.com/welcome";

/// In-memory sqlite with the migrations applied.
pub async fn create_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.expect("connect");
    Migrator::up(&db, None).await.expect("migrate");
    db
}

pub fn create_test_config(upstream_url: &str) -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".into(),
        listen_addr: "127.0.0.1:0".parse().unwrap(),
        public_url: PUBLIC_URL.into(),
        client_id: CLIENT_ID.into(),
        post_login_redirect: POST_LOGIN_REDIRECT.into(),
        hook_secret: HOOK_SECRET.into(),
        issuer: IssuerConfig {
            upstream_url: upstream_url.into(),
            ..IssuerConfig::default()
        },
        session: SessionConfig::default(),
        smtp: None,
    }
}

/// Issuer stand-in that answers with the request line it received.
pub struct EchoIssuer;

impl Issuer for EchoIssuer {
    fn fetch(&self, request: Request) -> BoxFuture<'_, Response> {
        Box::pin(async move {
            let line = format!("issuer saw {} {}", request.method(), request.uri());
            (StatusCode::IM_A_TEAPOT, line).into_response()
        })
    }
}

/// Code sender that remembers every delivery.
#[derive(Default)]
pub struct RecordingCodeSender {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl CodeSender for RecordingCodeSender {
    fn send_code<'a>(
        &'a self,
        email: &'a str,
        code: &'a str,
    ) -> BoxFuture<'a, Result<(), DeliveryError>> {
        Box::pin(async move {
            self.sent
                .lock()
                .unwrap()
                .push((email.to_string(), code.to_string()));
            Ok(())
        })
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub resources: AppResources,
    pub codes: Arc<RecordingCodeSender>,
}

pub async fn create_test_app_with_issuer(issuer: Arc<dyn Issuer>, upstream_url: &str) -> TestApp {
    let db = Arc::new(create_test_db().await);
    let config = Arc::new(create_test_config(upstream_url));
    let codes = Arc::new(RecordingCodeSender::default());
    let sessions = SqlSessionStore::connect(&db).await.expect("session store");
    let resources = AppResources::new(db, config, issuer, codes.clone(), sessions);
    let server = TestServer::new(myauth::api::router(resources.clone())).expect("create test server");
    TestApp {
        server,
        resources,
        codes,
    }
}

pub async fn create_test_app() -> TestApp {
    create_test_app_with_issuer(Arc::new(EchoIssuer), "http://127.0.0.1:3000").await
}
